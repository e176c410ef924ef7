//! Mapping of vehicle rows onto the Fordon sheet columns.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::models::vehicle::{FieldId, VehicleCategory, VehicleRow};

/// Fordon sheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Column {
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
}

impl Column {
    /// All columns, left to right.
    pub const ALL: [Column; 8] = [
        Column::B,
        Column::C,
        Column::D,
        Column::E,
        Column::F,
        Column::G,
        Column::H,
        Column::I,
    ];

    pub fn letter(&self) -> char {
        match self {
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
            Self::H => 'H',
            Self::I => 'I',
        }
    }

    /// Zero-based column index (A = 0).
    pub fn index(&self) -> u16 {
        self.letter() as u16 - 'A' as u16
    }

    /// Field written to this column.
    pub fn field(&self) -> FieldId {
        MAPPING_SCHEMA
            .iter()
            .find(|(_, column)| column == self)
            .map(|(field, _)| *field)
            .unwrap_or(FieldId::Registration)
    }

    /// Caption used in header rows.
    pub fn caption(&self) -> &'static str {
        match self.field() {
            FieldId::Registration => "Reg.nr",
            FieldId::MakeModelYear => "Fabrikat/modell/årsmodell",
            FieldId::SumInsured => "Forsikringssum",
            FieldId::Coverage => "Dekning",
            FieldId::Leasing => "Leasing",
            FieldId::AnnualMileage => "Årlig kjørelengde",
            FieldId::Bonus => "Bonus",
            FieldId::Deductible => "Egenandel",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Field to column assignment of the Fordon sheet.
pub const MAPPING_SCHEMA: [(FieldId, Column); 8] = [
    (FieldId::Registration, Column::B),
    (FieldId::MakeModelYear, Column::C),
    (FieldId::SumInsured, Column::D),
    (FieldId::Coverage, Column::E),
    (FieldId::Leasing, Column::F),
    (FieldId::AnnualMileage, Column::G),
    (FieldId::Bonus, Column::H),
    (FieldId::Deductible, Column::I),
];

/// Column a field is written to.
pub fn column_for(field: FieldId) -> Column {
    MAPPING_SCHEMA
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, column)| *column)
        .unwrap_or(Column::B)
}

/// Value of one sheet cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CellValue {
    #[default]
    Blank,
    Text(String),
    Number(Decimal),
}

static BLANK: CellValue = CellValue::Blank;

impl CellValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Numeric value for spreadsheet cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.to_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Blank => serializer.serialize_none(),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(n) => match n.to_i64().filter(|_| n.fract().is_zero()) {
                Some(int) => serializer.serialize_i64(int),
                None => serializer.serialize_str(&n.to_string()),
            },
        }
    }
}

/// One vehicle row laid out on columns B..I.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedRow {
    cells: BTreeMap<Column, CellValue>,
    #[serde(skip)]
    category: VehicleCategory,
}

impl MappedRow {
    pub fn get(&self, column: Column) -> &CellValue {
        self.cells.get(&column).unwrap_or(&BLANK)
    }

    /// Cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (Column, &CellValue)> {
        self.cells.iter().map(|(column, value)| (*column, value))
    }

    /// Sheet section the row belongs to.
    pub fn category(&self) -> VehicleCategory {
        self.category
    }
}

/// Lay out a vehicle row on columns B..I. Every column is present.
pub fn map_row(row: &VehicleRow) -> MappedRow {
    let text = |value: &Option<String>| value.clone().map_or(CellValue::Blank, CellValue::Text);
    let number = |value: Option<Decimal>| value.map_or(CellValue::Blank, CellValue::Number);

    let cells = MAPPING_SCHEMA
        .iter()
        .map(|(field, column)| {
            let value = match field {
                FieldId::Registration => text(&row.registration),
                FieldId::MakeModelYear => text(&row.make_model_year),
                FieldId::SumInsured => number(row.sum_insured),
                FieldId::Coverage => text(&row.coverage),
                FieldId::Leasing => text(&row.leasing),
                FieldId::AnnualMileage => number(row.annual_mileage.map(Decimal::from)),
                FieldId::Bonus => text(&row.bonus),
                FieldId::Deductible => number(row.deductible),
            };
            (*column, value)
        })
        .collect();

    MappedRow {
        cells,
        category: row.category,
    }
}

pub fn map_rows(rows: &[VehicleRow]) -> Vec<MappedRow> {
    rows.iter().map(map_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_empty_row_has_every_column() {
        let mapped = map_row(&VehicleRow::default());
        let columns: Vec<Column> = mapped.cells().map(|(column, _)| column).collect();
        assert_eq!(columns, Column::ALL.to_vec());
        assert!(mapped.cells().all(|(_, value)| value.is_blank()));
    }

    #[test]
    fn test_map_row_types() {
        let row = VehicleRow {
            registration: Some("AB12345".to_string()),
            sum_insured: Some(Decimal::from_str("350000").unwrap()),
            annual_mileage: Some(15000),
            bonus: Some("70%".to_string()),
            ..Default::default()
        };

        let mapped = map_row(&row);
        assert_eq!(mapped.get(Column::B), &CellValue::Text("AB12345".to_string()));
        assert_eq!(mapped.get(Column::D), &CellValue::Number(Decimal::from(350000)));
        assert_eq!(mapped.get(Column::G).to_string(), "15000");
        assert_eq!(mapped.get(Column::H).to_string(), "70%");
        assert_eq!(mapped.get(Column::I).to_string(), "");
        assert_eq!(mapped.get(Column::G).as_f64(), Some(15000.0));
    }

    #[test]
    fn test_schema_columns() {
        for (field, column) in MAPPING_SCHEMA {
            assert_eq!(column_for(field), column);
            assert_eq!(column.field(), field);
        }
        assert_eq!(Column::B.index(), 1);
        assert_eq!(Column::I.index(), 8);
    }

    #[test]
    fn test_serialize_mapped_row() {
        let row = VehicleRow {
            registration: Some("AB12345".to_string()),
            deductible: Some(Decimal::from_str("4000").unwrap()),
            ..Default::default()
        };

        let json = serde_json::to_value(map_row(&row)).unwrap();
        assert_eq!(json["cells"]["B"], "AB12345");
        assert_eq!(json["cells"]["I"], 4000);
        assert!(json["cells"]["D"].is_null());
    }
}
