//! Vehicle row data models for the Fordon sheet.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::normalize::normalize;

/// Insurance company whose PDF layout is understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsurerKind {
    /// If Skadeforsikring.
    If,
    /// Gjensidige Forsikring.
    Gjensidige,
    /// Tryg Forsikring.
    Tryg,
}

impl InsurerKind {
    /// All supported insurers.
    pub const ALL: [InsurerKind; 3] = [InsurerKind::If, InsurerKind::Gjensidige, InsurerKind::Tryg];

    /// Short lower-case name, used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Gjensidige => "gjensidige",
            Self::Tryg => "tryg",
        }
    }

    /// Guess the insurer from brand markers in the document text.
    ///
    /// Returns the insurer whose name occurs first; `None` if none does.
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        let markers: [(&str, InsurerKind); 5] = [
            ("if skadeforsikring", Self::If),
            ("if skadeförsäkring", Self::If),
            ("gjensidige", Self::Gjensidige),
            ("tryg forsikring", Self::Tryg),
            ("tryg.no", Self::Tryg),
        ];

        markers
            .iter()
            .filter_map(|(marker, kind)| lower.find(marker).map(|pos| (pos, *kind)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, kind)| kind)
    }
}

impl fmt::Display for InsurerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::If => "If",
            Self::Gjensidige => "Gjensidige",
            Self::Tryg => "Tryg",
        };
        f.write_str(name)
    }
}

impl FromStr for InsurerKind {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "if" | "if skadeforsikring" => Ok(Self::If),
            "gjensidige" | "gjensidige forsikring" => Ok(Self::Gjensidige),
            "tryg" | "tryg forsikring" => Ok(Self::Tryg),
            _ => Err(ExtractionError::UnknownInsurer(s.trim().to_string())),
        }
    }
}

/// Identifier of one Fordon field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Registration,
    MakeModelYear,
    SumInsured,
    Coverage,
    Leasing,
    AnnualMileage,
    Bonus,
    Deductible,
}

impl FieldId {
    /// All fields in column order.
    pub const ALL: [FieldId; 8] = [
        FieldId::Registration,
        FieldId::MakeModelYear,
        FieldId::SumInsured,
        FieldId::Coverage,
        FieldId::Leasing,
        FieldId::AnnualMileage,
        FieldId::Bonus,
        FieldId::Deductible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::MakeModelYear => "make_model_year",
            Self::SumInsured => "sum_insured",
            Self::Coverage => "coverage",
            Self::Leasing => "leasing",
            Self::AnnualMileage => "annual_mileage",
            Self::Bonus => "bonus",
            Self::Deductible => "deductible",
        }
    }

    /// Whether values of this field are amounts or counts.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::SumInsured | Self::AnnualMileage | Self::Deductible)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s.trim())
            .ok_or_else(|| format!("unknown field: {}", s))
    }
}

/// Section of the Fordon sheet a vehicle belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    Car,
    Trailer,
    Moped,
    Tractor,
    Boat,
    #[default]
    Other,
}

impl VehicleCategory {
    /// Classify a Norwegian vehicle type or product name
    /// ("Varebil", "Campingvogn og tilhenger", "Traktor", ...).
    pub fn from_type_name(name: &str) -> Self {
        let name = name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if has(&["tilhenger", "henger", "campingvogn"]) {
            Self::Trailer
        } else if has(&["moped", "motorsykkel", "snøscooter", "snoscooter"]) {
            Self::Moped
        } else if has(&["traktor", "arbeidsmaskin", "arb.maskin", "redskap"]) {
            Self::Tractor
        } else if has(&["båt", "baat"]) {
            Self::Boat
        } else if has(&["bil", "motorvogn"]) {
            Self::Car
        } else {
            Self::Other
        }
    }
}

/// One vehicle row extracted from a policy document.
///
/// Every field is either the value found in the document or `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRow {
    /// Registration plate ("AB12345"), or "Uregistrert" for machinery.
    pub registration: Option<String>,
    /// Make, model and model year as printed.
    pub make_model_year: Option<String>,
    /// Sum insured in NOK.
    pub sum_insured: Option<Decimal>,
    /// Coverage level ("Kasko", "Delkasko", ...).
    pub coverage: Option<String>,
    /// Leasing flag or leasing company.
    pub leasing: Option<String>,
    /// Agreed annual mileage in km.
    pub annual_mileage: Option<u32>,
    /// Bonus level ("70%").
    pub bonus: Option<String>,
    /// Deductible in NOK.
    pub deductible: Option<Decimal>,
    /// Sheet section the row belongs to.
    #[serde(default)]
    pub category: VehicleCategory,
}

impl VehicleRow {
    /// Whether the field holds a value.
    pub fn has(&self, field: FieldId) -> bool {
        match field {
            FieldId::Registration => self.registration.is_some(),
            FieldId::MakeModelYear => self.make_model_year.is_some(),
            FieldId::SumInsured => self.sum_insured.is_some(),
            FieldId::Coverage => self.coverage.is_some(),
            FieldId::Leasing => self.leasing.is_some(),
            FieldId::AnnualMileage => self.annual_mileage.is_some(),
            FieldId::Bonus => self.bonus.is_some(),
            FieldId::Deductible => self.deductible.is_some(),
        }
    }

    /// Key used to recognise the same vehicle listed more than once.
    ///
    /// Plates identify a vehicle on their own; unregistered machines share
    /// the "Uregistrert" plate and are told apart by their description.
    pub fn identity_key(&self) -> Option<String> {
        let registration = self.registration.as_deref()?;
        if registration.eq_ignore_ascii_case("uregistrert") {
            let description = self.make_model_year.as_deref().unwrap_or_default();
            Some(format!("{}_{}", registration, description).to_lowercase())
        } else {
            Some(registration.to_uppercase())
        }
    }
}

/// Decoded text of one insurer PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    insurer: InsurerKind,
    lines: Vec<String>,
}

impl Document {
    /// Build a document from raw PDF text, normalizing it.
    pub fn from_text(insurer: InsurerKind, raw: &str) -> Self {
        let lines = normalize(raw).lines().map(str::to_string).collect();
        Self { insurer, lines }
    }

    /// Build a document from lines that are already normalized.
    pub fn from_lines<I, S>(insurer: InsurerKind, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            insurer,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insurer(&self) -> InsurerKind {
        self.insurer
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Full text, lines joined by `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
