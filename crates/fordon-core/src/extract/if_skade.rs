//! If Skadeforsikring policy layout.
//!
//! Vehicles are introduced by a `<REG>, <Type>, <Make>` line and described
//! by `Registreringsnummer:` sections. The same vehicle is usually listed
//! again in overviews, which only repeat the introducing line.

use tracing::debug;

use crate::error::ExtractionError;
use crate::models::vehicle::{Document, FieldId, InsurerKind, VehicleCategory, VehicleRow};
use crate::registry::LabelRegistry;

use super::blocks::{segment, Block, BlockLayout, LabelMatcher};
use super::patterns::{find_leasing_company, IF_HEADING, MODEL_YEAR};
use super::values::parse_registration;
use super::{finish_row, Result, RowExtractor};

/// Leasing value when the label is printed without a finance company.
const LEASING_FLAG: &str = "Leasing";

/// Vehicle heading: plate, vehicle type and make.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Heading {
    registration: String,
    vehicle_type: String,
    make: String,
}

impl Heading {
    fn parse(line: &str) -> Option<Self> {
        let caps = IF_HEADING.captures(line)?;
        Some(Self {
            registration: parse_registration(&caps["reg"])?,
            vehicle_type: caps["type"].trim().to_string(),
            make: caps["make"].trim().to_string(),
        })
    }
}

struct IfLayout<'a> {
    matcher: &'a LabelMatcher<'a>,
}

impl BlockLayout for IfLayout<'_> {
    fn is_heading(&self, line: &str) -> bool {
        IF_HEADING.is_match(line)
    }

    fn is_anchor(&self, line: &str) -> bool {
        self.matcher.starts_with_label_of(line, FieldId::Registration)
    }
}

/// Row extractor for If Skadeforsikring documents.
pub struct IfExtractor<'r> {
    registry: &'r LabelRegistry,
}

impl<'r> IfExtractor<'r> {
    pub fn new(registry: &'r LabelRegistry) -> Self {
        Self { registry }
    }

    fn extract_block(&self, matcher: &LabelMatcher<'_>, block: &Block<'_>, document: &Document) -> Result<VehicleRow> {
        let mut row = VehicleRow::default();
        matcher.fill(block, &mut row)?;

        let block_heading = block.heading().and_then(Heading::parse);
        if row.registration.is_none() {
            row.registration = block_heading.as_ref().map(|h| h.registration.clone());
        }

        // The introducing line may sit in an overview far from the section.
        let heading = match (&row.registration, block_heading) {
            (Some(registration), Some(h)) if &h.registration == registration => Some(h),
            (Some(registration), _) => find_heading(document, registration),
            (None, h) => h,
        };

        if let Some(heading) = &heading {
            if row.make_model_year.is_none() {
                let year = block
                    .lines
                    .iter()
                    .find_map(|line| MODEL_YEAR.captures(line).map(|caps| caps[1].to_string()));
                row.make_model_year = Some(match year {
                    Some(year) => format!("{} {}", heading.make, year),
                    None => heading.make.clone(),
                });
            }
            row.category = VehicleCategory::from_type_name(&heading.vehicle_type);
        }

        if row.leasing.is_none() {
            row.leasing = find_leasing_company(block.lines).map(str::to_string);
        }
        // A bare "Tredjemannsinteresse/leasing" line without a company.
        if row.leasing.is_none()
            && block
                .lines
                .iter()
                .any(|line| matcher.starts_with_label_of(line, FieldId::Leasing))
        {
            row.leasing = Some(LEASING_FLAG.to_string());
        }

        Ok(row)
    }
}

impl RowExtractor for IfExtractor<'_> {
    fn insurer(&self) -> InsurerKind {
        InsurerKind::If
    }

    fn extract(&self, document: &Document) -> Result<Vec<VehicleRow>> {
        let matcher = LabelMatcher::new(self.registry, InsurerKind::If)?;
        let layout = IfLayout { matcher: &matcher };
        let blocks = segment(document, &layout)?;

        let sections: Vec<&Block<'_>> = blocks
            .iter()
            .filter(|block| block.lines.iter().any(|line| layout.is_anchor(line)))
            .collect();
        if sections.is_empty() {
            return Err(ExtractionError::StructureNotRecognized {
                insurer: InsurerKind::If,
                reason: "no Registreringsnummer section found".to_string(),
            });
        }

        let mut rows = Vec::with_capacity(sections.len());
        for block in sections {
            let row = self.extract_block(&matcher, block, document)?;
            debug!("If block at line {}: {:?}", block.start + 1, row.registration);
            rows.extend(finish_row(row, matcher.fields()));
        }

        Ok(rows)
    }
}

fn find_heading(document: &Document, registration: &str) -> Option<Heading> {
    document
        .lines()
        .iter()
        .filter_map(|line| Heading::parse(line))
        .find(|heading| heading.registration == registration)
}
