//! Vehicle row extraction from insurer policy documents.

mod blocks;
mod gjensidige;
mod if_skade;
mod parser;
pub mod patterns;
mod tryg;
pub mod values;

pub use blocks::{segment, Block, BlockLayout, LabelMatcher};
pub use gjensidige::GjensidigeExtractor;
pub use if_skade::IfExtractor;
pub use parser::{ExtractionResult, VehicleParser};
pub use tryg::TrygExtractor;

use std::collections::HashSet;

use crate::error::ExtractionError;
use crate::models::vehicle::{Document, FieldId, InsurerKind, VehicleRow};
use crate::registry::LabelRegistry;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Turns one insurer's document layout into vehicle rows.
pub trait RowExtractor {
    /// Insurer whose layout this extractor understands.
    fn insurer(&self) -> InsurerKind;

    /// Extract one row per vehicle block, in document order.
    fn extract(&self, document: &Document) -> Result<Vec<VehicleRow>>;
}

/// Extractor for `insurer` using the labels in `registry`.
pub fn extractor_for<'r>(insurer: InsurerKind, registry: &'r LabelRegistry) -> Box<dyn RowExtractor + 'r> {
    match insurer {
        InsurerKind::If => Box::new(IfExtractor::new(registry)),
        InsurerKind::Gjensidige => Box::new(GjensidigeExtractor::new(registry)),
        InsurerKind::Tryg => Box::new(TrygExtractor::new(registry)),
    }
}

/// Drop rows describing a vehicle that an earlier row already describes.
///
/// Rows without a registration are kept.
pub fn dedup_rows(rows: Vec<VehicleRow>) -> Vec<VehicleRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| match row.identity_key() {
            Some(key) => seen.insert(key),
            None => true,
        })
        .collect()
}

/// Blank every field the insurer does not print; `None` if nothing is left.
fn finish_row(mut row: VehicleRow, supported: &[FieldId]) -> Option<VehicleRow> {
    for field in FieldId::ALL {
        if !supported.contains(&field) {
            values::clear(&mut row, field);
        }
    }

    FieldId::ALL.iter().any(|field| row.has(*field)).then_some(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(registration: &str, make: &str) -> VehicleRow {
        VehicleRow {
            registration: Some(registration.to_string()),
            make_model_year: Some(make.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_dedup_first_wins() {
        let rows = vec![
            row("AB12345", "Volvo XC60 2020"),
            row("CD67890", "Tesla Model Y 2022"),
            row("ab12345", "Volvo"),
            row("Uregistrert", "Doosan 300 DX 2023"),
            row("Uregistrert", "Hitachi 300"),
            VehicleRow::default(),
            VehicleRow::default(),
        ];

        let deduped = dedup_rows(rows);
        assert_eq!(deduped.len(), 6);
        assert_eq!(deduped[0].make_model_year.as_deref(), Some("Volvo XC60 2020"));
        assert_eq!(deduped[1].registration.as_deref(), Some("CD67890"));
    }

    #[test]
    fn test_finish_row_blanks_unsupported() {
        let mut full = row("AB12345", "Volvo");
        full.bonus = Some("70%".to_string());

        let finished = finish_row(full, &[FieldId::Registration, FieldId::MakeModelYear]).unwrap();
        assert_eq!(finished.bonus, None);
        assert_eq!(finished.registration.as_deref(), Some("AB12345"));

        assert_eq!(finish_row(VehicleRow::default(), &FieldId::ALL), None);
    }

    #[test]
    fn test_extractor_for() {
        let registry = LabelRegistry::builtin();
        for insurer in InsurerKind::ALL {
            assert_eq!(extractor_for(insurer, &registry).insurer(), insurer);
        }
    }
}
