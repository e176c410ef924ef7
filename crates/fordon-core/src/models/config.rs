//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::vehicle::InsurerKind;

/// Main configuration for the fordon pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FordonConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Vehicle extraction configuration.
    pub extraction: ExtractionConfig,

    /// Spreadsheet output configuration.
    pub output: OutputConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Minimum text length to consider the PDF text layer usable.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            // Tryg policies carry vehicles far into the document.
            max_pages: 100,
            min_text_length: 50,
        }
    }
}

/// Vehicle extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Insurer to assume when none is given (None = detect from text).
    pub default_insurer: Option<InsurerKind>,

    /// Drop later blocks describing an already extracted vehicle.
    pub deduplicate: bool,

    /// JSON file with additional label variants.
    pub label_overlay: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_insurer: None,
            deduplicate: true,
            label_overlay: None,
        }
    }
}

/// How rows are placed on the Fordon sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetLayout {
    /// All rows appended one after another from `start_row`.
    #[default]
    Sequential,
    /// Rows grouped into the template's vehicle sections (cars, trailers, ...).
    Sectioned,
}

/// Spreadsheet output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Worksheet name.
    pub sheet_name: String,

    /// First data row (1-based, as shown in Excel).
    pub start_row: u32,

    /// Row placement strategy.
    pub layout: SheetLayout,

    /// Write column captions on the row above the data.
    pub write_header: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Fordon".to_string(),
            start_row: 3,
            layout: SheetLayout::Sequential,
            write_header: true,
        }
    }
}

impl FordonConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
