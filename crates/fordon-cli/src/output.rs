//! Output formats: Fordon workbook, CSV, JSON and a text summary.

use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use serde::Serialize;
use tracing::{debug, warn};

use fordon_core::models::config::{OutputConfig, SheetLayout};
use fordon_core::{CellValue, Column, ExtractionResult, InsurerKind, MappedRow, VehicleCategory};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
    /// Excel workbook with the Fordon sheet
    Xlsx,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Rows of the Fordon template reserved for each vehicle category (1-based,
/// inclusive).
pub const SECTIONS: [(VehicleCategory, u32, u32); 6] = [
    (VehicleCategory::Car, 3, 22),
    (VehicleCategory::Trailer, 26, 34),
    (VehicleCategory::Moped, 38, 46),
    (VehicleCategory::Tractor, 50, 60),
    (VehicleCategory::Boat, 64, 72),
    (VehicleCategory::Other, 76, 84),
];

/// Rows assigned to sheet positions.
#[derive(Debug, Default)]
pub struct Placement<'a> {
    /// (1-based sheet row, row) pairs.
    pub rows: Vec<(u32, &'a MappedRow)>,
    /// 1-based rows that receive column captions.
    pub header_rows: Vec<u32>,
    /// Rows that did not fit their section.
    pub dropped: usize,
}

/// Decide where each row goes on the sheet.
pub fn place_rows<'a>(rows: &'a [MappedRow], config: &OutputConfig) -> Placement<'a> {
    let mut placement = Placement::default();

    match config.layout {
        SheetLayout::Sequential => {
            let start = config.start_row.max(1);
            if config.write_header && start > 1 {
                placement.header_rows.push(start - 1);
            }
            placement.rows = rows
                .iter()
                .enumerate()
                .map(|(i, row)| (start + i as u32, row))
                .collect();
        }
        SheetLayout::Sectioned => {
            for (category, first, last) in SECTIONS {
                if config.write_header {
                    placement.header_rows.push(first - 1);
                }

                let mut next = first;
                for row in rows.iter().filter(|row| row.category() == category) {
                    if next > last {
                        placement.dropped += 1;
                        continue;
                    }
                    placement.rows.push((next, row));
                    next += 1;
                }
            }
            placement.rows.sort_by_key(|(sheet_row, _)| *sheet_row);
        }
    }

    placement
}

/// Write the rows to a workbook with a single Fordon sheet.
///
/// Returns the number of rows that did not fit.
pub fn write_xlsx(path: &Path, rows: &[MappedRow], config: &OutputConfig) -> anyhow::Result<usize> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&config.sheet_name)?;

    let placement = place_rows(rows, config);
    fill_worksheet(worksheet, &placement)?;

    if placement.dropped > 0 {
        warn!(
            "{} row(s) did not fit their sheet section and were left out",
            placement.dropped
        );
    }

    workbook.save(path)?;
    debug!("Wrote {} rows to {}", placement.rows.len(), path.display());

    Ok(placement.dropped)
}

fn fill_worksheet(worksheet: &mut Worksheet, placement: &Placement<'_>) -> anyhow::Result<()> {
    let header_format = Format::new().set_bold();
    let number_format = Format::new()
        .set_num_format("0")
        .set_align(FormatAlign::Right);

    for column in Column::ALL {
        worksheet.set_column_width(column.index(), 22)?;
    }

    for header_row in &placement.header_rows {
        for column in Column::ALL {
            worksheet.write_string_with_format(
                header_row - 1,
                column.index(),
                column.caption(),
                &header_format,
            )?;
        }
    }

    for (sheet_row, row) in &placement.rows {
        for (column, value) in row.cells() {
            let (r, c) = (sheet_row - 1, column.index());
            match value {
                CellValue::Blank => {}
                CellValue::Text(text) => {
                    worksheet.write_string(r, c, text)?;
                }
                CellValue::Number(_) => {
                    if let Some(number) = value.as_f64() {
                        worksheet.write_number_with_format(r, c, number, &number_format)?;
                    }
                }
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    insurer: InsurerKind,
    rows: Vec<MappedRow>,
    warnings: &'a [String],
    processing_time_ms: u64,
}

/// Render a result as JSON, CSV or text. Workbooks go through [`write_xlsx`].
pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => format_json(result),
        OutputFormat::Csv => format_csv(&result.mapped_rows()),
        OutputFormat::Text => Ok(format_text(result)),
        OutputFormat::Xlsx => anyhow::bail!("xlsx output needs a file path (use --output)"),
    }
}

fn format_json(result: &ExtractionResult) -> anyhow::Result<String> {
    let report = JsonReport {
        insurer: result.insurer,
        rows: result.mapped_rows(),
        warnings: &result.warnings,
        processing_time_ms: result.processing_time_ms,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// CSV with one caption row and one line per vehicle.
pub fn format_csv(rows: &[MappedRow]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(Column::ALL.iter().map(|column| column.caption()))?;
    for row in rows {
        wtr.write_record(row.cells().map(|(_, value)| value.to_string()))?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Insurer: {}\n", result.insurer));
    output.push_str(&format!("Vehicles: {}\n", result.rows.len()));

    for (i, row) in result.mapped_rows().iter().enumerate() {
        output.push_str(&format!("\nVehicle {}:\n", i + 1));
        for (column, value) in row.cells() {
            if !value.is_blank() {
                output.push_str(&format!("  {} {}: {}\n", column, column.caption(), value));
            }
        }
    }

    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
