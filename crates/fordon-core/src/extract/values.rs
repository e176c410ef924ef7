//! Value parsers for captured label values.
//!
//! Each parser returns `None` for text that cannot be a value of its field,
//! which makes the label scan move on to the next candidate line.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::models::vehicle::{FieldId, VehicleRow};
use crate::normalize::compact_spaces;

use super::patterns::{
    AMOUNT_VALUE, BONUS_CLASS, BONUS_PERCENT, COVERAGE_HEADER, CURRENCY_TOKEN, MILEAGE_UNIT, PLATE,
    UNREGISTERED,
};

/// Registration value used for machines without plates.
pub const UNREGISTERED_PLATE: &str = "Uregistrert";

/// Parse a registration plate: `"bu 21895"` becomes `"BU21895"`.
pub fn parse_registration(raw: &str) -> Option<String> {
    let value = raw.trim();
    if let Some(caps) = PLATE.captures(value) {
        let digits: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
        return Some(format!("{}{}", caps[1].to_uppercase(), digits));
    }
    if UNREGISTERED.is_match(value) {
        return Some(UNREGISTERED_PLATE.to_string());
    }
    None
}

/// Parse a Norwegian amount: "20 000", "12 000 kr", "4 000,00", "kr 350.000".
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let stripped = CURRENCY_TOKEN.replace_all(raw, " ");
    let value = compact_spaces(&stripped.replace('\u{00a0}', " "));
    let value = value.trim_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());

    let caps = AMOUNT_VALUE.captures(value)?;
    let integer: String = caps[1].chars().filter(char::is_ascii_digit).collect();
    let amount = match caps.get(2) {
        Some(fraction) => format!("{}.{}", integer, fraction.as_str()),
        None => integer,
    };

    Decimal::from_str(&amount).ok().map(|d| d.normalize())
}

/// Parse an annual mileage: "16 000 km" becomes 16000.
pub fn parse_mileage(raw: &str) -> Option<u32> {
    let stripped = MILEAGE_UNIT.replace_all(raw, " ");
    let value = compact_spaces(&stripped);

    let caps = AMOUNT_VALUE.captures(&value)?;
    if caps.get(2).is_some() {
        return None;
    }
    let digits: String = caps[1].chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Parse a bonus level, either a percentage ("70 %" becomes "70%") or a
/// bonus class ("Klasse 7" becomes "Klasse7").
pub fn parse_bonus(raw: &str) -> Option<String> {
    if let Some(caps) = BONUS_PERCENT.captures(raw) {
        return Some(format!("{}%", &caps[1]));
    }
    BONUS_CLASS
        .captures(raw)
        .map(|caps| format!("Klasse{}", &caps[1]))
}

/// Parse a leasing value: a company name or a yes/no flag, never a bare
/// number such as the premium printed next to a leasing label.
pub fn parse_leasing(raw: &str) -> Option<String> {
    let value = parse_text(raw)?;
    if !value.chars().any(char::is_alphabetic) || parse_amount(&value).is_some() {
        return None;
    }
    Some(value)
}

/// Parse a coverage level, rejecting coverage table captions.
pub fn parse_coverage(raw: &str) -> Option<String> {
    let value = parse_text(raw)?;
    if COVERAGE_HEADER.is_match(&value) {
        return None;
    }
    Some(value)
}

/// Parse free text; it must contain at least one letter or digit.
pub fn parse_text(raw: &str) -> Option<String> {
    let value = compact_spaces(raw);
    value.chars().any(char::is_alphanumeric).then_some(value)
}

/// Parse `raw` as a value of `field` and store it in the row.
///
/// Returns `false` if the value was rejected; the row is left untouched.
pub fn assign(row: &mut VehicleRow, field: FieldId, raw: &str) -> bool {
    match field {
        FieldId::Registration => set(&mut row.registration, parse_registration(raw)),
        FieldId::MakeModelYear => set(
            &mut row.make_model_year,
            parse_text(raw).filter(|v| v.chars().any(char::is_alphabetic)),
        ),
        FieldId::SumInsured => set(&mut row.sum_insured, parse_amount(raw)),
        FieldId::Coverage => set(&mut row.coverage, parse_coverage(raw)),
        FieldId::Leasing => set(&mut row.leasing, parse_leasing(raw)),
        FieldId::AnnualMileage => set(&mut row.annual_mileage, parse_mileage(raw)),
        FieldId::Bonus => set(&mut row.bonus, parse_bonus(raw)),
        FieldId::Deductible => set(&mut row.deductible, parse_amount(raw)),
    }
}

/// Clear a field, used to keep unsupported fields blank.
pub fn clear(row: &mut VehicleRow, field: FieldId) {
    match field {
        FieldId::Registration => row.registration = None,
        FieldId::MakeModelYear => row.make_model_year = None,
        FieldId::SumInsured => row.sum_insured = None,
        FieldId::Coverage => row.coverage = None,
        FieldId::Leasing => row.leasing = None,
        FieldId::AnnualMileage => row.annual_mileage = None,
        FieldId::Bonus => row.bonus = None,
        FieldId::Deductible => row.deductible = None,
    }
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(value) => {
            *slot = Some(value);
            true
        }
        None => false,
    }
}
