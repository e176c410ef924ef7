//! Extraction pipeline: normalize, segment, extract, deduplicate.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::mapping::{map_rows, MappedRow};
use crate::models::vehicle::{Document, InsurerKind, VehicleRow};
use crate::registry::{LabelRegistry, BUILTIN_REGISTRY};

use super::{dedup_rows, extractor_for, Result};

/// Result of vehicle extraction for one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Insurer whose layout was applied.
    pub insurer: InsurerKind,
    /// Extracted rows in document order.
    pub rows: Vec<VehicleRow>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Rows mapped onto Fordon columns B..I.
    pub fn mapped_rows(&self) -> Vec<MappedRow> {
        map_rows(&self.rows)
    }
}

/// Vehicle parser for insurer policy text.
pub struct VehicleParser<'r> {
    /// Label registry to match against.
    registry: &'r LabelRegistry,
    /// Whether repeated vehicles are dropped.
    deduplicate: bool,
}

impl VehicleParser<'static> {
    /// Create a parser using the built-in labels.
    pub fn new() -> Self {
        Self {
            registry: &BUILTIN_REGISTRY,
            deduplicate: true,
        }
    }
}

impl Default for VehicleParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> VehicleParser<'r> {
    /// Use a custom label registry.
    pub fn with_registry<'a>(self, registry: &'a LabelRegistry) -> VehicleParser<'a> {
        VehicleParser {
            registry,
            deduplicate: self.deduplicate,
        }
    }

    /// Set duplicate vehicle removal.
    pub fn with_deduplication(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    /// Normalize `text` and extract its vehicle rows.
    pub fn parse(&self, text: &str, insurer: InsurerKind) -> Result<ExtractionResult> {
        self.parse_document(&Document::from_text(insurer, text))
    }

    /// Extract the vehicle rows of an already built document.
    pub fn parse_document(&self, document: &Document) -> Result<ExtractionResult> {
        let start = Instant::now();
        let insurer = document.insurer();

        info!("Parsing {} document with {} lines", insurer, document.lines().len());

        let extractor = extractor_for(insurer, self.registry);
        let mut rows = extractor.extract(document)?;

        if self.deduplicate {
            let before = rows.len();
            rows = dedup_rows(rows);
            if rows.len() < before {
                debug!("Dropped {} repeated vehicle(s)", before - rows.len());
            }
        }

        let supported = self.registry.supported_fields(insurer)?;
        let mut warnings = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let missing: Vec<&str> = supported
                .iter()
                .filter(|field| !row.has(**field))
                .map(|field| field.as_str())
                .collect();
            if !missing.is_empty() {
                let name = row.registration.as_deref().unwrap_or("unknown");
                warnings.push(format!("Row {} ({}): no value for {}", idx + 1, name, missing.join(", ")));
            }
        }

        info!("Extracted {} vehicle row(s), {} warning(s)", rows.len(), warnings.len());

        Ok(ExtractionResult {
            insurer,
            rows,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
