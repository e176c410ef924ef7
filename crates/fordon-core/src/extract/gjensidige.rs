//! Gjensidige policy layout.
//!
//! Each vehicle starts with a heading line: `<MAKE MODEL> <YEAR> <REG>` for
//! registered vehicles, a vehicle table row starting with a known make, or a
//! product line for unregistered tractors and machinery. Bonus levels are
//! listed separately as `<REG>: 70% bonus`, finance companies sometimes next
//! to the plate in a separate listing.

use regex::Regex;
use tracing::{debug, trace};

use crate::models::vehicle::{Document, FieldId, InsurerKind, VehicleCategory, VehicleRow};
use crate::registry::LabelRegistry;

use super::blocks::{segment, Block, BlockLayout, LabelMatcher};
use super::patterns::{
    find_leasing_company, GJENSIDIGE_CAR, GJENSIDIGE_MACHINERY, GJENSIDIGE_TABLE_ROW, GJENSIDIGE_TRACTOR,
    PLATE_TOKEN, YEAR_TOKEN,
};
use super::values::{parse_registration, UNREGISTERED_PLATE};
use super::{finish_row, Result, RowExtractor};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Heading {
    Car { description: String, registration: String },
    Tractor { model: String },
    Machinery { label: String },
}

impl Heading {
    fn parse(line: &str) -> Option<Self> {
        if let Some(caps) = GJENSIDIGE_TRACTOR.captures(line) {
            return Some(Self::Tractor {
                model: caps["model"].trim().to_string(),
            });
        }
        if let Some(caps) = GJENSIDIGE_MACHINERY.captures(line) {
            return Some(Self::Machinery {
                label: caps["label"].trim().to_string(),
            });
        }
        if let Some(caps) = GJENSIDIGE_CAR.captures(line) {
            return Some(Self::Car {
                description: format!("{} {}", caps["model"].trim(), &caps["year"]),
                registration: parse_registration(&caps["reg"])?,
            });
        }
        Self::parse_table_row(line)
    }

    /// `VOLVO XC60 AB 12345 2020 Ja 8 400`: make, model, plate, then the
    /// model year among the remaining cells. Year-like plates (`KW 2022`)
    /// are OCR noise and skipped.
    fn parse_table_row(line: &str) -> Option<Self> {
        let caps = GJENSIDIGE_TABLE_ROW.captures(line)?;
        let rest = caps.name("rest")?.as_str();
        let plate = PLATE_TOKEN
            .find_iter(rest)
            .find(|m| !is_year_like(m.as_str()))?;

        let model = rest[..plate.start()].trim();
        let year = YEAR_TOKEN.find(&rest[plate.end()..]).map(|m| m.as_str());
        let description = [&caps["brand"], model, year.unwrap_or_default()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        Some(Self::Car {
            description,
            registration: parse_registration(plate.as_str())?,
        })
    }

    fn registration(&self) -> String {
        match self {
            Self::Car { registration, .. } => registration.clone(),
            Self::Tractor { .. } | Self::Machinery { .. } => UNREGISTERED_PLATE.to_string(),
        }
    }

    fn description(&self) -> &str {
        match self {
            Self::Car { description, .. } => description,
            Self::Tractor { model } => model,
            Self::Machinery { label } => label,
        }
    }

    fn category(&self) -> VehicleCategory {
        match self {
            Self::Car { description, .. } => match VehicleCategory::from_type_name(description) {
                VehicleCategory::Other => VehicleCategory::Car,
                category => category,
            },
            Self::Tractor { .. } => VehicleCategory::Tractor,
            Self::Machinery { .. } => VehicleCategory::Other,
        }
    }
}

struct GjensidigeLayout<'a> {
    matcher: &'a LabelMatcher<'a>,
}

impl BlockLayout for GjensidigeLayout<'_> {
    fn is_heading(&self, line: &str) -> bool {
        Heading::parse(line).is_some()
    }

    fn is_anchor(&self, line: &str) -> bool {
        self.matcher.starts_with_label_of(line, FieldId::Registration)
    }
}

/// Row extractor for Gjensidige documents. Deductibles are never read.
pub struct GjensidigeExtractor<'r> {
    registry: &'r LabelRegistry,
}

impl<'r> GjensidigeExtractor<'r> {
    pub fn new(registry: &'r LabelRegistry) -> Self {
        Self { registry }
    }

    fn extract_block(&self, matcher: &LabelMatcher<'_>, block: &Block<'_>, document: &Document) -> Result<VehicleRow> {
        let mut row = VehicleRow::default();
        matcher.fill(block, &mut row)?;

        match block.heading().and_then(Heading::parse) {
            Some(heading) => {
                if row.registration.is_none() {
                    row.registration = Some(heading.registration());
                }
                if row.make_model_year.is_none() {
                    row.make_model_year = Some(heading.description().to_string());
                }
                row.category = heading.category();
            }
            None => {
                row.category = row
                    .make_model_year
                    .as_deref()
                    .map(VehicleCategory::from_type_name)
                    .unwrap_or_default();
            }
        }

        if row.leasing.is_none() {
            row.leasing = find_leasing_company(block.lines)
                .or_else(|| {
                    row.registration
                        .as_deref()
                        .and_then(|reg| listed_leasing(document.lines(), reg))
                })
                .map(str::to_string);
        }

        if row.bonus.is_none() {
            let text = document.text();
            row.bonus = row.registration.as_deref().and_then(|reg| listed_bonus(&text, reg));
        }

        Ok(row)
    }
}

impl RowExtractor for GjensidigeExtractor<'_> {
    fn insurer(&self) -> InsurerKind {
        InsurerKind::Gjensidige
    }

    fn extract(&self, document: &Document) -> Result<Vec<VehicleRow>> {
        let matcher = LabelMatcher::new(self.registry, InsurerKind::Gjensidige)?;
        let blocks = segment(document, &GjensidigeLayout { matcher: &matcher })?;

        let mut rows = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let row = self.extract_block(&matcher, block, document)?;
            debug!("Gjensidige block at line {}: {:?}", block.start + 1, row.registration);
            rows.extend(finish_row(row, matcher.fields()));
        }

        Ok(rows)
    }
}

fn is_year_like(plate: &str) -> bool {
    let digits: String = plate.chars().filter(char::is_ascii_digit).collect();
    digits.len() == 4 && (digits.starts_with("19") || digits.starts_with("20"))
}

/// Regex source matching `registration` as printed, with or without the
/// space after the letters. `None` for "Uregistrert".
fn plate_pattern(registration: &str) -> Option<String> {
    if registration.len() < 3 || !registration.is_char_boundary(2) {
        return None;
    }
    let (letters, digits) = registration.split_at(2);
    if !letters.chars().all(|c| c.is_ascii_alphabetic()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!(r"\b{}\s?{}\b", regex::escape(letters), regex::escape(digits)))
}

/// Finance company printed on a line naming the plate, or on the line after
/// it, anywhere in the document.
fn listed_leasing(lines: &[String], registration: &str) -> Option<&'static str> {
    let re = Regex::new(&format!("(?i){}", plate_pattern(registration)?)).ok()?;
    let company = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| re.is_match(line))
        .find_map(|(idx, _)| find_leasing_company(&lines[idx..(idx + 2).min(lines.len())]));
    trace!("Leasing listing for {}: {:?}", registration, company);
    company
}

/// Bonus from a `<REG>: 70% bonus` listing anywhere in the document.
fn listed_bonus(text: &str, registration: &str) -> Option<String> {
    let pattern = format!(
        r"(?i){}\s*:\s*(\d{{1,3}})\s*%\s*bonus",
        plate_pattern(registration)?
    );
    let re = Regex::new(&pattern).ok()?;
    let bonus = re.captures(text).map(|caps| format!("{}%", &caps[1]));
    trace!("Bonus listing for {}: {:?}", registration, bonus);
    bonus
}
