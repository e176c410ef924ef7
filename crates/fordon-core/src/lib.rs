//! Core library for vehicle insurance policy extraction.
//!
//! This crate provides:
//! - Text normalization for PDF and OCR text
//! - Per-insurer label registry (If, Gjensidige, Tryg)
//! - Vehicle row extraction and Fordon column mapping (B..I)
//! - PDF text layer access

pub mod error;
pub mod extract;
pub mod mapping;
pub mod models;
pub mod normalize;
pub mod pdf;
pub mod registry;

pub use error::{ExtractionError, FordonError, PdfError, Result};
pub use extract::{extractor_for, ExtractionResult, RowExtractor, VehicleParser};
pub use mapping::{map_row, map_rows, CellValue, Column, MappedRow, MAPPING_SCHEMA};
pub use models::{Document, FieldId, FordonConfig, InsurerKind, VehicleCategory, VehicleRow};
pub use normalize::normalize;
pub use pdf::{PdfContent, PdfExtractor, PdfProcessor, PdfType};
pub use registry::{LabelOrigin, LabelPattern, LabelRegistry, RegistryBuilder, BUILTIN_REGISTRY};
