//! Data models.

pub mod config;
pub mod vehicle;

pub use config::{ExtractionConfig, FordonConfig, OutputConfig, PdfConfig, SheetLayout};
pub use vehicle::{Document, FieldId, InsurerKind, VehicleCategory, VehicleRow};
