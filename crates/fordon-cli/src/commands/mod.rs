//! Subcommands and the file pipeline they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod labels;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use fordon_core::pdf::{PdfExtractor, PdfProcessor, PdfType};
use fordon_core::{ExtractionResult, FordonConfig, InsurerKind, LabelRegistry, VehicleParser};

/// File extensions accepted as policy documents.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fordon")
        .join("config.json")
}

/// Load the configuration from `path`, else from the default location if it
/// exists, else the built-in defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<FordonConfig> {
    if let Some(path) = path {
        return FordonConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        return Ok(FordonConfig::from_file(&default_path)?);
    }

    Ok(FordonConfig::default())
}

/// Built-in labels plus the overlay named in the configuration.
pub fn load_registry(config: &FordonConfig) -> anyhow::Result<LabelRegistry> {
    match &config.extraction.label_overlay {
        Some(path) => {
            info!("Loading label overlay {}", path.display());
            LabelRegistry::from_file(path)
                .map_err(|e| anyhow::anyhow!("Invalid label overlay {}: {}", path.display(), e))
        }
        None => Ok(LabelRegistry::builtin()),
    }
}

/// Lower-case extension of `path`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Decoded text of a policy document.
pub fn read_document_text(path: &Path, config: &FordonConfig) -> anyhow::Result<String> {
    let extension = extension_of(path);
    let text = match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let mut extractor = PdfExtractor::with_config(config.pdf.clone());
            extractor.load(&data)?;
            debug!("PDF has {} pages", extractor.page_count());

            let (pdf_type, text) = extractor.extract_classified()?;
            if pdf_type == PdfType::Empty {
                anyhow::bail!(
                    "PDF has no usable text layer (scanned?): {}. Run OCR first and pass the text file.",
                    path.display()
                );
            }
            text
        }
        "txt" => fs::read_to_string(path)?,
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    if text.trim().is_empty() {
        anyhow::bail!("No text could be read from {}", path.display());
    }
    Ok(text)
}

/// Insurer given on the command line, else the configured default, else the
/// one named in the text.
pub fn resolve_insurer(
    explicit: Option<InsurerKind>,
    config: &FordonConfig,
    text: &str,
) -> anyhow::Result<InsurerKind> {
    if let Some(insurer) = explicit.or(config.extraction.default_insurer) {
        return Ok(insurer);
    }

    let detected = InsurerKind::detect(text)
        .ok_or_else(|| anyhow::anyhow!("Could not detect the insurer. Pass --insurer if, gjensidige or tryg."))?;
    info!("Detected insurer: {}", detected);
    Ok(detected)
}

/// Run the whole pipeline on one file.
pub fn extract_file(
    path: &Path,
    insurer: Option<InsurerKind>,
    config: &FordonConfig,
    registry: &LabelRegistry,
) -> anyhow::Result<ExtractionResult> {
    let text = read_document_text(path, config)?;
    let insurer = resolve_insurer(insurer, config, &text)?;

    let parser = VehicleParser::new()
        .with_registry(registry)
        .with_deduplication(config.extraction.deduplicate);

    Ok(parser.parse(&text, insurer)?)
}

/// Parse an insurer name given on the command line.
pub fn parse_insurer(value: &str) -> Result<InsurerKind, String> {
    value.parse().map_err(|e: fordon_core::ExtractionError| e.to_string())
}
