//! Per-insurer label registry.
//!
//! Each insurer maps every field it prints to an ordered list of labels.
//! Originals come first; OCR spellings are appended after them and never
//! replace them. Earlier labels win when several could match.

use std::collections::BTreeMap;
use std::path::Path;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExtractionError, FordonError};
use crate::models::vehicle::{FieldId, InsurerKind};
use crate::normalize::{fold_label, push_folded};

lazy_static! {
    /// Registry with the built-in labels of all supported insurers.
    pub static ref BUILTIN_REGISTRY: LabelRegistry = LabelRegistry::builtin();
}

/// Where a label spelling comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelOrigin {
    /// Spelling printed by the insurer.
    Original,
    /// Spelling produced by OCR noise.
    OcrVariant,
}

/// One recognised label spelling for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPattern {
    label: String,
    key: String,
    origin: LabelOrigin,
}

impl LabelPattern {
    /// Create a pattern; `None` if the label has no letters or digits.
    pub fn new(label: impl Into<String>, origin: LabelOrigin) -> Option<Self> {
        let label = label.into();
        let key = fold_label(&label);
        if key.is_empty() {
            return None;
        }
        Some(Self { label, key, origin })
    }

    /// Label as written.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Folded comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn origin(&self) -> LabelOrigin {
        self.origin
    }

    /// Match the label at the start of `line` and return the rest of it.
    ///
    /// Comparison is done on folded text, so case, diacritics, spaces and
    /// punctuation inside the label do not matter. The label must end at a
    /// word boundary: `Bonus` matches neither `Bonusbeskyttelse` nor the
    /// compound `Bonus-beskyttelse`, and `Fabrikat/årsmodell` does not match
    /// `Fabrikat/årsmodell/Type`.
    pub fn match_start<'a>(&self, line: &'a str) -> Option<&'a str> {
        let mut folded = String::with_capacity(self.key.len() + 4);

        for (idx, c) in line.char_indices() {
            push_folded(c, &mut folded);
            if !self.key.starts_with(folded.as_str()) {
                return None;
            }
            if folded.len() == self.key.len() {
                let rest = &line[idx + c.len_utf8()..];
                return match rest.chars().next() {
                    Some(next) if next.is_alphanumeric() || next == '/' => None,
                    Some('-') if continues_word(&rest[1..]) => None,
                    _ => Some(rest),
                };
            }
        }

        None
    }
}

/// A hyphen followed by a word (not a plate like `AB12345`) joins a compound.
fn continues_word(after_hyphen: &str) -> bool {
    after_hyphen.chars().take_while(|c| c.is_alphabetic()).count() >= 3
}

/// Immutable label registry.
#[derive(Debug, Clone, Default)]
pub struct LabelRegistry {
    insurers: BTreeMap<InsurerKind, BTreeMap<FieldId, Vec<LabelPattern>>>,
}

impl LabelRegistry {
    /// Start an empty registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Reopen the registry to append more labels.
    pub fn into_builder(self) -> RegistryBuilder {
        RegistryBuilder {
            insurers: self.insurers,
        }
    }

    /// Labels printed by If, Gjensidige and Tryg policy documents.
    pub fn builtin() -> Self {
        use FieldId::*;
        use InsurerKind::*;

        Self::builder()
            // If Skadeforsikring: no bonus, no sum insured
            .originals(If, Registration, &["Registreringsnummer"])
            .originals(If, MakeModelYear, &["Fabrikat/modell/årsmodell", "Merke/modell"])
            .originals(If, Coverage, &["Dekning"])
            .originals(If, Leasing, &["Tredjemannsinteresse/leasing", "Leasing"])
            .originals(If, AnnualMileage, &["Kjørelengde", "Årlig kjørelengde"])
            .originals(If, Deductible, &["Egenandel - Skader på eget kjøretøy", "Egenandel"])
            .ocr_variants(If, Registration, &["Registreringsnr", "Reg.nr", "Registrerlngsnummer", "Reglstreringsnummer"])
            .ocr_variants(If, MakeModelYear, &["Fabrikat/modell/?rsmodell", "Merke/rnodell"])
            .ocr_variants(If, Coverage, &["Dekn1ng", "Oekning"])
            .ocr_variants(If, Leasing, &["Tredjemannsinteresse/Ieasing", "Leaslng"])
            .ocr_variants(If, AnnualMileage, &["Kj0relengde", "Kjøre1engde", "Kj?relengde"])
            .ocr_variants(If, Deductible, &["Egenande1", "Egenandei"])
            // Gjensidige: no deductible
            .originals(Gjensidige, Registration, &["Kjennemerke", "Registreringsnummer", "Reg.nr"])
            .originals(Gjensidige, MakeModelYear, &["Fabrikat/modell/årsmodell", "Merke/modell"])
            .originals(Gjensidige, SumInsured, &["Forsikringssum kr", "Forsikringssum", "Verdi"])
            .originals(Gjensidige, Coverage, &["Dekning"])
            .originals(Gjensidige, Leasing, &["Leasing", "Panthaver"])
            .originals(Gjensidige, AnnualMileage, &["Årlig kjørelengde", "Kjørelengde"])
            .originals(Gjensidige, Bonus, &["Bonus"])
            .ocr_variants(Gjensidige, Registration, &["Kjennernerke", "Kjennemerkc", "Reglstreringsnummer"])
            .ocr_variants(Gjensidige, MakeModelYear, &["Fabrikat/modell/?rsmodell", "Merke/rnodell"])
            .ocr_variants(Gjensidige, SumInsured, &["Forsikrlngssum kr", "Forsikrlngssum", "Forsikringsum"])
            .ocr_variants(Gjensidige, Coverage, &["Dekn1ng", "Oekning"])
            .ocr_variants(Gjensidige, Leasing, &["Leaslng", "PanthaveR"])
            .ocr_variants(Gjensidige, AnnualMileage, &["Arlig kj0relengde", "Kj0relengde"])
            .ocr_variants(Gjensidige, Bonus, &["B0nus", "Bonu5"])
            // Tryg: every field
            .originals(Tryg, Registration, &["Kjennemerke", "Registreringsnummer"])
            .originals(Tryg, MakeModelYear, &["Fabrikat/årsmodell/Type", "Fabrikat/årsmodell"])
            .originals(Tryg, SumInsured, &["Forsikringssum kr", "Forsikringssum"])
            .originals(Tryg, Coverage, &["Dekning"])
            .originals(Tryg, Leasing, &["Leasing"])
            .originals(Tryg, AnnualMileage, &["Årlig kjørelengde", "Kjørelengde"])
            .originals(Tryg, Bonus, &["Bonus"])
            .originals(Tryg, Deductible, &["Egenandel"])
            .ocr_variants(Tryg, Registration, &["Kjennernerke", "Kjennemerkc"])
            .ocr_variants(Tryg, MakeModelYear, &["Fabrikat/?rsmodell/Type", "Fabrikat/?rsmodell"])
            .ocr_variants(Tryg, SumInsured, &["Forsikrlngssum kr", "Forsikrlngssum"])
            .ocr_variants(Tryg, Coverage, &["Dekn1ng"])
            .ocr_variants(Tryg, Leasing, &["Leaslng"])
            .ocr_variants(Tryg, AnnualMileage, &["?rlig kj?relengde", "Arlig kj0relengde"])
            .ocr_variants(Tryg, Bonus, &["B0nus"])
            .ocr_variants(Tryg, Deductible, &["Egenande1"])
            .build()
    }

    /// Built-in labels extended with the overlay in `json`.
    ///
    /// The overlay maps insurer name to field name to extra OCR spellings:
    /// `{"tryg": {"bonus": ["B0nus", "8onus"]}}`.
    pub fn from_json(json: &str) -> Result<Self, FordonError> {
        Self::builtin().with_overlay_json(json)
    }

    /// Built-in labels extended with the overlay file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, FordonError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Append the variants of a JSON overlay to this registry.
    pub fn with_overlay_json(self, json: &str) -> Result<Self, FordonError> {
        let overlay: BTreeMap<String, BTreeMap<String, Vec<String>>> =
            serde_json::from_str(json).map_err(|e| FordonError::Registry(e.to_string()))?;

        let mut builder = self.into_builder();
        for (insurer_name, fields) in overlay {
            let insurer: InsurerKind = insurer_name.parse()?;
            for (field_name, labels) in fields {
                let field: FieldId = field_name.parse().map_err(FordonError::Registry)?;
                debug!("Overlay adds {} label(s) for {} {}", labels.len(), insurer, field);
                for label in labels {
                    builder = builder.ocr_variant(insurer, field, &label);
                }
            }
        }

        Ok(builder.build())
    }

    /// Labels for `field` in priority order.
    ///
    /// Fails with [`ExtractionError::UnknownInsurer`] if the insurer has no
    /// entry; returns an empty slice if the insurer does not print the field.
    pub fn patterns(&self, insurer: InsurerKind, field: FieldId) -> Result<&[LabelPattern], ExtractionError> {
        let fields = self.fields_of(insurer)?;
        Ok(fields.get(&field).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Same as [`patterns`](Self::patterns) with the insurer given by name.
    pub fn patterns_by_name(&self, insurer: &str, field: FieldId) -> Result<&[LabelPattern], ExtractionError> {
        let insurer: InsurerKind = insurer.parse()?;
        self.patterns(insurer, field)
    }

    /// Fields the insurer prints, in column order.
    pub fn supported_fields(&self, insurer: InsurerKind) -> Result<Vec<FieldId>, ExtractionError> {
        let fields = self.fields_of(insurer)?;
        Ok(FieldId::ALL
            .iter()
            .copied()
            .filter(|field| fields.get(field).is_some_and(|labels| !labels.is_empty()))
            .collect())
    }

    /// Whether the insurer prints the field.
    pub fn supports(&self, insurer: InsurerKind, field: FieldId) -> bool {
        self.patterns(insurer, field).is_ok_and(|labels| !labels.is_empty())
    }

    /// Insurers with an entry in this registry.
    pub fn insurers(&self) -> impl Iterator<Item = InsurerKind> + '_ {
        self.insurers.keys().copied()
    }

    /// The field whose label starts `line`, if any.
    pub fn label_field(&self, insurer: InsurerKind, line: &str) -> Option<FieldId> {
        let fields = self.insurers.get(&insurer)?;
        fields
            .iter()
            .find(|(_, labels)| labels.iter().any(|label| label.match_start(line).is_some()))
            .map(|(field, _)| *field)
    }

    fn fields_of(&self, insurer: InsurerKind) -> Result<&BTreeMap<FieldId, Vec<LabelPattern>>, ExtractionError> {
        self.insurers
            .get(&insurer)
            .ok_or_else(|| ExtractionError::UnknownInsurer(insurer.to_string()))
    }
}

/// Append-only builder for [`LabelRegistry`].
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    insurers: BTreeMap<InsurerKind, BTreeMap<FieldId, Vec<LabelPattern>>>,
}

impl RegistryBuilder {
    /// Register an insurer without any labels yet.
    pub fn insurer(mut self, insurer: InsurerKind) -> Self {
        self.insurers.entry(insurer).or_default();
        self
    }

    /// Append an original label.
    pub fn original(self, insurer: InsurerKind, field: FieldId, label: &str) -> Self {
        self.push(insurer, field, label, LabelOrigin::Original)
    }

    /// Append an OCR spelling after the labels already present.
    pub fn ocr_variant(self, insurer: InsurerKind, field: FieldId, label: &str) -> Self {
        self.push(insurer, field, label, LabelOrigin::OcrVariant)
    }

    pub fn originals(self, insurer: InsurerKind, field: FieldId, labels: &[&str]) -> Self {
        labels
            .iter()
            .fold(self, |builder, label| builder.original(insurer, field, label))
    }

    pub fn ocr_variants(self, insurer: InsurerKind, field: FieldId, labels: &[&str]) -> Self {
        labels
            .iter()
            .fold(self, |builder, label| builder.ocr_variant(insurer, field, label))
    }

    /// Freeze the registry.
    pub fn build(self) -> LabelRegistry {
        LabelRegistry {
            insurers: self.insurers,
        }
    }

    fn push(mut self, insurer: InsurerKind, field: FieldId, label: &str, origin: LabelOrigin) -> Self {
        let Some(pattern) = LabelPattern::new(label, origin) else {
            return self;
        };

        let labels = self.insurers.entry(insurer).or_default().entry(field).or_default();
        // Same folded key means the same match; keep the first spelling.
        if !labels.iter().any(|existing| existing.key == pattern.key) {
            labels.push(pattern);
        }
        self
    }
}
