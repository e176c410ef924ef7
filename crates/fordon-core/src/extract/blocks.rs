//! Vehicle block segmentation and label matching.

use tracing::trace;

use crate::error::ExtractionError;
use crate::models::vehicle::{Document, FieldId, InsurerKind, VehicleRow};
use crate::registry::{LabelPattern, LabelRegistry};

use super::values;

/// Characters between a label and its value.
const VALUE_SEPARATORS: &[char] = &[':', '-', '–', '—', '=', '.', ' '];

/// Line classification used to cut a document into vehicle blocks.
pub trait BlockLayout {
    /// Line that always opens a new vehicle block.
    fn is_heading(&self, line: &str) -> bool;

    /// Line that opens a block unless the current block already has one.
    fn is_anchor(&self, line: &str) -> bool;

    /// Line after which the current block ends.
    fn is_terminator(&self, _line: &str) -> bool {
        false
    }
}

/// Contiguous lines describing one vehicle.
#[derive(Debug, Clone, Copy)]
pub struct Block<'d> {
    /// Index of the first line in the document.
    pub start: usize,
    /// Whether the first line is a heading (as opposed to an anchor).
    pub has_heading: bool,
    pub lines: &'d [String],
}

impl<'d> Block<'d> {
    /// The heading line, if the block starts with one.
    pub fn heading(&self) -> Option<&'d str> {
        if self.has_heading {
            self.lines.first().map(String::as_str)
        } else {
            None
        }
    }
}

/// Cut `document` into vehicle blocks, in document order.
///
/// Lines before the first heading or anchor are preamble and belong to no
/// block. Fails if no block could be delimited.
pub fn segment<'d>(document: &'d Document, layout: &dyn BlockLayout) -> Result<Vec<Block<'d>>, ExtractionError> {
    let lines = document.lines();
    // (start, end, has_heading, has_anchor)
    let mut spans: Vec<(usize, usize, bool, bool)> = Vec::new();
    let mut open = false;

    for (idx, line) in lines.iter().enumerate() {
        if layout.is_heading(line) {
            spans.push((idx, idx + 1, true, false));
            open = true;
            continue;
        }

        if layout.is_anchor(line) {
            match spans.last_mut() {
                Some(span) if open && !span.3 => {
                    span.1 = idx + 1;
                    span.3 = true;
                }
                _ => {
                    spans.push((idx, idx + 1, false, true));
                    open = true;
                }
            }
            continue;
        }

        if let Some(span) = spans.last_mut().filter(|_| open) {
            if layout.is_terminator(line) && span.1 - span.0 > 1 {
                open = false;
            } else {
                span.1 = idx + 1;
            }
        }
    }

    if spans.is_empty() {
        let reason = if document.is_empty() {
            "document is empty".to_string()
        } else {
            format!("no vehicle section found in {} lines", lines.len())
        };
        return Err(ExtractionError::StructureNotRecognized {
            insurer: document.insurer(),
            reason,
        });
    }

    Ok(spans
        .into_iter()
        .map(|(start, end, has_heading, _)| Block {
            start,
            has_heading,
            lines: &lines[start..end],
        })
        .collect())
}

/// Captures label values inside blocks for one insurer.
pub struct LabelMatcher<'r> {
    registry: &'r LabelRegistry,
    insurer: InsurerKind,
    fields: Vec<FieldId>,
}

impl<'r> LabelMatcher<'r> {
    /// Fails with `UnknownInsurer` if the registry has no labels for `insurer`.
    pub fn new(registry: &'r LabelRegistry, insurer: InsurerKind) -> Result<Self, ExtractionError> {
        let fields = registry.supported_fields(insurer)?;
        Ok(Self {
            registry,
            insurer,
            fields,
        })
    }

    /// Fields the insurer prints, in column order.
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    /// Whether the line starts with a label of `field`.
    pub fn starts_with_label_of(&self, line: &str, field: FieldId) -> bool {
        self.registry
            .patterns(self.insurer, field)
            .map(|patterns| patterns.iter().any(|p| p.match_start(line).is_some()))
            .unwrap_or(false)
    }

    /// Whether the line starts with any known label.
    pub fn is_label_line(&self, line: &str) -> bool {
        self.registry.label_field(self.insurer, line).is_some()
    }

    /// Fill every supported field of `row` from the labels in `block`.
    pub fn fill(&self, block: &Block<'_>, row: &mut VehicleRow) -> Result<(), ExtractionError> {
        for &field in &self.fields {
            let patterns = self.registry.patterns(self.insurer, field)?;
            if let Some(label) = self.capture(block, field, patterns, row) {
                trace!("{} {} captured via '{}'", self.insurer, field, label);
            }
        }
        Ok(())
    }

    /// Try patterns in priority order, lines top to bottom, and store the
    /// first value the field parser accepts. Returns the matching label.
    ///
    /// A label match whose value the parser rejects does not end the scan:
    /// later lines and lower-priority labels are still tried, so a caption
    /// such as `Bonus: se vilkår` gives way to a later `Bonus: 60 %`. Once a
    /// value is accepted, later matches are ignored.
    fn capture<'p>(
        &self,
        block: &Block<'_>,
        field: FieldId,
        patterns: &'p [LabelPattern],
        row: &mut VehicleRow,
    ) -> Option<&'p str> {
        for pattern in patterns {
            for (idx, line) in block.lines.iter().enumerate() {
                let Some(rest) = pattern.match_start(line) else {
                    continue;
                };

                let value = rest.trim_start_matches(VALUE_SEPARATORS).trim_end();
                let value = if value.is_empty() {
                    match block.lines.get(idx + 1) {
                        Some(next) if !self.is_label_line(next) => next.as_str(),
                        _ => continue,
                    }
                } else {
                    value
                };

                if values::assign(row, field, value) {
                    return Some(pattern.label());
                }
            }
        }
        None
    }
}
