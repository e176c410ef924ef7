//! Tryg policy layout.
//!
//! Vehicle sections open with `<Product> - Vilkår <CODE>` and carry
//! `Kjennemerke` and `Type:` lines plus a coverage table. Page furniture
//! (`Side n av m`, repeated certificate captions) closes a section.
//!
//! The policy overview lists each vehicle as a product line, the plate and
//! the premium on separate lines. Vehicles found only there get a row with
//! registration and category.

use std::collections::HashSet;

use tracing::debug;

use crate::models::vehicle::{Document, FieldId, InsurerKind, VehicleCategory, VehicleRow};
use crate::registry::LabelRegistry;

use super::blocks::{segment, Block, BlockLayout, LabelMatcher};
use super::patterns::{BARE_PLATE, TRYG_BLOCK_END, TRYG_COVERAGE_ROW, TRYG_HEADING, TRYG_PRODUCT, TRYG_TYPE};
use super::values::{parse_amount, parse_coverage, parse_registration};
use super::{finish_row, Result, RowExtractor};

/// Lines a coverage table row may be wrapped over.
const TABLE_ROW_SPAN: usize = 3;

struct TrygLayout<'a> {
    matcher: &'a LabelMatcher<'a>,
}

impl BlockLayout for TrygLayout<'_> {
    fn is_heading(&self, line: &str) -> bool {
        TRYG_HEADING.is_match(line)
    }

    fn is_anchor(&self, line: &str) -> bool {
        self.matcher.starts_with_label_of(line, FieldId::Registration)
    }

    fn is_terminator(&self, line: &str) -> bool {
        TRYG_BLOCK_END.is_match(line)
    }
}

/// Row extractor for Tryg documents.
pub struct TrygExtractor<'r> {
    registry: &'r LabelRegistry,
}

impl<'r> TrygExtractor<'r> {
    pub fn new(registry: &'r LabelRegistry) -> Self {
        Self { registry }
    }

    fn extract_block(&self, matcher: &LabelMatcher<'_>, block: &Block<'_>) -> Result<VehicleRow> {
        let mut row = VehicleRow::default();
        matcher.fill(block, &mut row)?;

        // Sections without a Kjennemerke label print the plate on its own line.
        if row.registration.is_none() && block.has_heading {
            row.registration = block
                .lines
                .iter()
                .skip(1)
                .find(|line| BARE_PLATE.is_match(line.trim()))
                .and_then(|line| parse_registration(line));
        }

        if row.coverage.is_none() || row.sum_insured.is_none() || row.deductible.is_none() {
            fill_from_coverage_table(block, &mut row);
        }

        row.category = block_category(block);
        Ok(row)
    }
}

impl RowExtractor for TrygExtractor<'_> {
    fn insurer(&self) -> InsurerKind {
        InsurerKind::Tryg
    }

    fn extract(&self, document: &Document) -> Result<Vec<VehicleRow>> {
        let matcher = LabelMatcher::new(self.registry, InsurerKind::Tryg)?;
        let overview = overview_rows(document.lines());
        let blocks = match segment(document, &TrygLayout { matcher: &matcher }) {
            Ok(blocks) => blocks,
            Err(err) if overview.is_empty() => return Err(err),
            Err(_) => Vec::new(),
        };

        // (first line, row) so overview-only vehicles keep document order
        let mut rows = Vec::with_capacity(blocks.len() + overview.len());
        for block in &blocks {
            let row = self.extract_block(&matcher, block)?;
            debug!("Tryg block at line {}: {:?}", block.start + 1, row.registration);
            if let Some(row) = finish_row(row, matcher.fields()) {
                rows.push((block.start, row));
            }
        }

        let described: HashSet<String> = rows.iter().filter_map(|(_, row)| row.registration.clone()).collect();
        for (start, row) in overview {
            if row.registration.as_ref().is_some_and(|reg| described.contains(reg)) {
                continue;
            }
            debug!("Tryg overview line {}: {:?}", start + 1, row.registration);
            rows.extend(finish_row(row, matcher.fields()).map(|row| (start, row)));
        }

        rows.sort_by_key(|(start, _)| *start);
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }
}

/// Overview entries: a product line directly followed by a plate line.
fn overview_rows(lines: &[String]) -> Vec<(usize, VehicleRow)> {
    lines
        .windows(2)
        .enumerate()
        .filter_map(|(idx, pair)| {
            let caps = TRYG_PRODUCT.captures(pair[0].trim())?;
            if !BARE_PLATE.is_match(pair[1].trim()) {
                return None;
            }
            let row = VehicleRow {
                registration: parse_registration(&pair[1]),
                category: VehicleCategory::from_type_name(&caps["product"]),
                ..Default::default()
            };
            Some((idx, row))
        })
        .collect()
}

/// Fill coverage, sum insured and deductible from the first coverage table
/// row, for whichever of them no label supplied.
fn fill_from_coverage_table(block: &Block<'_>, row: &mut VehicleRow) {
    let caps = (0..block.lines.len()).find_map(|idx| {
        let end = (idx + TABLE_ROW_SPAN).min(block.lines.len());
        TRYG_COVERAGE_ROW.captures(&block.lines[idx..end].join(" "))
            .map(|caps| {
                (
                    caps["coverage"].to_string(),
                    caps["sum"].to_string(),
                    caps["deductible"].to_string(),
                )
            })
    });

    let Some((coverage, sum, deductible)) = caps else {
        return;
    };

    if row.coverage.is_none() {
        row.coverage = parse_coverage(&coverage);
    }
    if row.sum_insured.is_none() {
        row.sum_insured = parse_amount(&sum);
    }
    if row.deductible.is_none() {
        row.deductible = parse_amount(&deductible);
    }
}

fn block_category(block: &Block<'_>) -> VehicleCategory {
    let from_type = block
        .lines
        .iter()
        .find_map(|line| TRYG_TYPE.captures(line))
        .map(|caps| VehicleCategory::from_type_name(&caps["type"]));

    match from_type {
        Some(category) if category != VehicleCategory::Other => category,
        _ => block
            .heading()
            .and_then(|line| TRYG_HEADING.captures(line))
            .map(|caps| VehicleCategory::from_type_name(&caps["product"]))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const POLICY: &str = "\
Tryg Forsikring
Forsikringsbevis | Spesifikasjon
Avtalenummer 1234567
Personbil - Vilkår PAU18100
Kjennemerke: AB12345
Fabrikat/årsmodell/Type: Volvo XC60 2020
Type: Personbil
Forsikringssum kr: 350 000
Dekning: Kasko
Leasing: Ja
Årlig kjørelengde: 15 000 km
Bonus: 70 %
Egenandel: 4 000
Side 2 av 5
Campingvogn og tilhenger - Vilkår CAM18100
Kjennemerke: KR3037
Fabrikat/?rsmodell: TYSSE 2013
Type: Varetilhenger
Dekning Vilkår Forsikringssum Egenandel Pris
Kasko CAM18255 20 000 6 000 968
";

    fn extract(text: &str) -> Result<Vec<VehicleRow>> {
        let registry = LabelRegistry::builtin();
        TrygExtractor::new(&registry).extract(&Document::from_text(InsurerKind::Tryg, text))
    }

    #[test]
    fn test_extract_labelled_block() {
        let rows = extract(POLICY).unwrap();
        assert_eq!(rows.len(), 2);

        let car = &rows[0];
        assert_eq!(car.registration.as_deref(), Some("AB12345"));
        assert_eq!(car.make_model_year.as_deref(), Some("Volvo XC60 2020"));
        assert_eq!(car.sum_insured.map(|d| d.to_string()).as_deref(), Some("350000"));
        assert_eq!(car.coverage.as_deref(), Some("Kasko"));
        assert_eq!(car.leasing.as_deref(), Some("Ja"));
        assert_eq!(car.annual_mileage, Some(15000));
        assert_eq!(car.bonus.as_deref(), Some("70%"));
        assert_eq!(car.deductible.map(|d| d.to_string()).as_deref(), Some("4000"));
        assert_eq!(car.category, VehicleCategory::Car);
    }

    #[test]
    fn test_coverage_table_fallback() {
        let rows = extract(POLICY).unwrap();
        let trailer = &rows[1];

        assert_eq!(trailer.registration.as_deref(), Some("KR3037"));
        assert_eq!(trailer.make_model_year.as_deref(), Some("TYSSE 2013"));
        assert_eq!(trailer.coverage.as_deref(), Some("Kasko"));
        assert_eq!(trailer.sum_insured.map(|d| d.to_string()).as_deref(), Some("20000"));
        assert_eq!(trailer.deductible.map(|d| d.to_string()).as_deref(), Some("6000"));
        assert_eq!(trailer.bonus, None);
        assert_eq!(trailer.category, VehicleCategory::Trailer);
    }

    #[test]
    fn test_wrapped_table_row() {
        let text = "\
Varebil - Vilkår PAU18100
Kjennemerke: EL55555
Delkasko
200 000 4 000
1 250
";
        let rows = extract(text).unwrap();
        assert_eq!(rows[0].coverage.as_deref(), Some("Delkasko"));
        assert_eq!(rows[0].sum_insured.map(|d| d.to_string()).as_deref(), Some("200000"));
        assert_eq!(rows[0].deductible.map(|d| d.to_string()).as_deref(), Some("4000"));
    }

    #[test]
    fn test_anchor_only_blocks() {
        let text = "\
Kjennemerke: AB12345
Bonus: 60 %
Kjennemerke: CD67890
Bonus: 50 %
";
        let rows = extract(text).unwrap();
        let plates: Vec<_> = rows.iter().map(|r| r.registration.as_deref()).collect();
        assert_eq!(plates, vec![Some("AB12345"), Some("CD67890")]);
        assert_eq!(rows[1].bonus.as_deref(), Some("50%"));
    }

    #[test]
    fn test_overview_only_document() {
        let text = "\
Tryg Forsikring
Oversikt
Personbil
AB12345
968
Campingvogn og tilhenger
KR3037
512
";
        let rows = extract(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].registration.as_deref(), Some("AB12345"));
        assert_eq!(rows[0].category, VehicleCategory::Car);
        assert_eq!(rows[0].sum_insured, None);
        assert_eq!(rows[1].registration.as_deref(), Some("KR3037"));
        assert_eq!(rows[1].category, VehicleCategory::Trailer);
    }

    #[test]
    fn test_overview_merges_with_sections() {
        let text = "\
Oversikt
Personbil
AB12345
968
Tilhenger
KR3037
512
Personbil - Vilkår PAU18100
Kjennemerke: AB12345
Bonus: 70 %
";
        let rows = extract(text).unwrap();
        let plates: Vec<_> = rows.iter().map(|r| r.registration.as_deref()).collect();
        assert_eq!(plates, vec![Some("KR3037"), Some("AB12345")]);
        assert_eq!(rows[1].bonus.as_deref(), Some("70%"));
    }

    #[test]
    fn test_heading_section_with_bare_plate() {
        let text = "\
Campingvogn og tilhenger - Vilkår CAM18100
KR3037
Kasko CAM18255 20 000 6 000 968
";
        let rows = extract(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].registration.as_deref(), Some("KR3037"));
        assert_eq!(rows[0].coverage.as_deref(), Some("Kasko"));
        assert_eq!(rows[0].category, VehicleCategory::Trailer);
    }

    #[test]
    fn test_bonus_caption_and_compound_label_ignored() {
        let text = "\
Personbil - Vilkår PAU18100
Kjennemerke: AB12345
Bonus: se vilkår
Bonus-beskyttelse: 10 år
";
        let rows = extract(text).unwrap();
        assert_eq!(rows[0].registration.as_deref(), Some("AB12345"));
        assert_eq!(rows[0].bonus, None);
    }

    #[test]
    fn test_preamble_only_is_not_recognized() {
        let err = extract("Tryg Forsikring\nForsikringsbevis | Spesifikasjon").unwrap_err();
        assert!(matches!(
            err,
            crate::error::ExtractionError::StructureNotRecognized { insurer: InsurerKind::Tryg, .. }
        ));
    }
}
