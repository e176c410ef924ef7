//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, warn};

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// PDF text extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    config: PdfConfig,
}

/// Extracted text of a PDF.
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Type of PDF content.
    pub pdf_type: PdfType,
    /// Text of all read pages.
    pub text: String,
    /// Pages with their text.
    pub pages: Vec<PdfPage>,
}

/// Text of a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    pub text: String,
}

impl PdfExtractor {
    /// Create a new PDF extractor with default limits.
    pub fn new() -> Self {
        Self::with_config(PdfConfig::default())
    }

    pub fn with_config(config: PdfConfig) -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            config,
        }
    }

    /// Number of pages that will be read.
    fn pages_to_read(&self) -> u32 {
        let count = self.page_count();
        match self.config.max_pages {
            0 => count,
            limit => count.min(limit as u32),
        }
    }

    /// Extract the text of every page within the page limit.
    pub fn extract_all(&self) -> Result<PdfContent> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        let page_count = self.pages_to_read();
        let mut pages = Vec::with_capacity(page_count as usize);
        let mut text = String::new();

        for number in 1..=page_count {
            let page_text = self.extract_page_text(number).unwrap_or_else(|e| {
                warn!("Page {}: {}", number, e);
                String::new()
            });

            if !page_text.trim().is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&page_text);
            }
            pages.push(PdfPage {
                number,
                text: page_text,
            });
        }

        let pdf_type = self.classify(&text);
        debug!("PDF analysis: {} pages, {} chars text -> {:?}", page_count, text.len(), pdf_type);

        Ok(PdfContent { pdf_type, text, pages })
    }

    /// Text in reading order and its classification, from a single read.
    pub fn extract_classified(&self) -> Result<(PdfType, String)> {
        let text = self.extract_text()?;
        let pdf_type = self.classify(&text);
        debug!("PDF analysis: {} chars text -> {:?}", text.len(), pdf_type);
        Ok((pdf_type, text))
    }

    fn classify(&self, text: &str) -> PdfType {
        let usable = text.chars().filter(|c| !c.is_whitespace()).count();
        if usable >= self.config.min_text_length {
            PdfType::Text
        } else {
            PdfType::Empty
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self) -> PdfType {
        self.extract_classified()
            .map(|(pdf_type, _)| pdf_type)
            .unwrap_or(PdfType::Empty)
    }

    fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        if self.pages_to_read() < self.page_count() {
            debug!("Reading first {} of {} pages", self.pages_to_read(), self.page_count());
            return self.extract_all().map(|content| content.text);
        }

        // pdf-extract keeps reading order better than lopdf
        match pdf_extract::extract_text_from_mem(&self.raw_data) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("pdf-extract failed ({}), falling back to page text", e);
                self.extract_all().map(|content| content.text)
            }
        }
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self
            .document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))?;

        if page == 0 || !doc.get_pages().contains_key(&page) {
            return Err(PdfError::InvalidPage(page));
        }

        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn sample_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for n in 0..pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("Kjennemerke: AB1234{}", n))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();
        data
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(matches!(extractor.extract_text(), Err(PdfError::Parse(_))));
        assert!(matches!(extractor.extract_classified(), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(matches!(extractor.load(b"not a pdf"), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_load_and_page_limit() {
        let data = sample_pdf(3);

        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();
        assert_eq!(extractor.page_count(), 3);
        assert!(matches!(extractor.extract_page_text(4), Err(PdfError::InvalidPage(4))));
        assert!(matches!(extractor.extract_page_text(0), Err(PdfError::InvalidPage(0))));

        let mut limited = PdfExtractor::with_config(PdfConfig {
            max_pages: 2,
            min_text_length: 10,
        });
        limited.load(&data).unwrap();
        let content = limited.extract_all().unwrap();
        assert_eq!(content.pages.len(), 2);
        assert_eq!(content.pages[1].number, 2);

        let (pdf_type, text) = limited.extract_classified().unwrap();
        assert_eq!(text, content.text);
        assert_eq!(pdf_type, content.pdf_type);
    }

    #[test]
    fn test_classify() {
        let extractor = PdfExtractor::with_config(PdfConfig {
            max_pages: 0,
            min_text_length: 5,
        });
        assert_eq!(extractor.classify("  \n  a b "), PdfType::Empty);
        assert_eq!(extractor.classify("Kjennemerke"), PdfType::Text);
    }
}
