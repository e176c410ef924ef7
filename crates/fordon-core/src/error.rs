//! Error types for the fordon-core library.

use thiserror::Error;

use crate::models::vehicle::InsurerKind;

/// Main error type for the fordon library.
#[derive(Error, Debug)]
pub enum FordonError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Vehicle row extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Label registry could not be loaded.
    #[error("label registry error: {0}")]
    Registry(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to vehicle row extraction.
///
/// A row with blank fields is not an error; only a document whose layout
/// cannot be delimited into vehicle blocks is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The requested insurer has no extractor or no registry entry.
    #[error("unknown insurer: {0}")]
    UnknownInsurer(String),

    /// No vehicle block could be delimited in the document.
    #[error("{insurer} layout not recognized: {reason}")]
    StructureNotRecognized {
        insurer: InsurerKind,
        reason: String,
    },
}

/// Result type for the fordon library.
pub type Result<T> = std::result::Result<T, FordonError>;
