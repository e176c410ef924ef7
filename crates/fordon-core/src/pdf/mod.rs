//! PDF text layer access.
//!
//! Only documents with a text layer are read here. Scanned policies come
//! back as [`PdfType::Empty`] and must be OCR'd before extraction.

mod extractor;

pub use extractor::{PdfContent, PdfExtractor, PdfPage};

use crate::error::PdfError;

/// Type of PDF content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Contains extractable text.
    Text,
    /// No usable text layer (scanned or blank).
    Empty,
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Analyze the PDF to determine whether its text layer is usable.
    fn analyze(&self) -> PdfType;

    /// Extract text from the pages within the page limit.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from a specific page (1-based).
    fn extract_page_text(&self, page: u32) -> Result<String>;
}
