//! Batch command - extract vehicle rows from many policy documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::{stream, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use fordon_core::{ExtractionResult, InsurerKind, MappedRow};

use super::{extension_of, extract_file, load_config, load_registry, parse_insurer, SUPPORTED_EXTENSIONS};
use crate::output::{format_result, write_xlsx, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern (e.g. "policies/*.pdf")
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Insurer of every input file; detected per file if omitted
    #[arg(short, long, value_parser = parse_insurer)]
    insurer: Option<InsurerKind>,

    /// Also write a summary CSV
    #[arg(long)]
    summary: bool,

    /// Write all vehicles into one Fordon workbook
    #[arg(long)]
    combined: Option<PathBuf>,

    /// Number of files processed in parallel
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let registry = Arc::new(load_registry(&config)?);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| SUPPORTED_EXTENSIONS.contains(&extension_of(p).as_str()))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let jobs = args.jobs.max(1);
    let insurer = args.insurer;
    let mut tasks = stream::iter(files.into_iter().map(|path| {
        let config = config.clone();
        let registry = Arc::clone(&registry);
        async move {
            let file_start = Instant::now();
            let task_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                extract_file(&task_path, insurer, &config, &registry)
            })
            .await
            .map_err(anyhow::Error::from)
            .and_then(|result| result);
            (path, outcome, file_start.elapsed().as_millis() as u64)
        }
    }))
    .buffered(jobs);

    let mut results = Vec::new();
    while let Some((path, outcome, processing_time_ms)) = tasks.next().await {
        match outcome {
            Ok(extraction) => {
                debug!("{}: {} vehicle(s)", path.display(), extraction.rows.len());
                results.push(FileResult {
                    path,
                    extraction: Some(extraction),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing {} failed: {}", path.display(), error_msg);
                }
            }
        }
        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    let successful: Vec<&FileResult> = results.iter().filter(|r| r.extraction.is_some()).collect();
    let failed: Vec<&FileResult> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(extraction) = &result.extraction {
                write_file_output(output_dir, &result.path, extraction, args.format, &config.output)?;
            }
        }
    }

    if let Some(combined_path) = &args.combined {
        let rows: Vec<MappedRow> = successful
            .iter()
            .filter_map(|r| r.extraction.as_ref())
            .flat_map(|extraction| extraction.mapped_rows())
            .collect();
        let dropped = write_xlsx(combined_path, &rows, &config.output)?;
        println!(
            "{} {} vehicle(s) written to {}",
            style("✓").green(),
            rows.len() - dropped,
            combined_path.display()
        );
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_file_output(
    output_dir: &Path,
    input: &Path,
    extraction: &ExtractionResult,
    format: OutputFormat,
    output_config: &fordon_core::models::config::OutputConfig,
) -> anyhow::Result<()> {
    let output_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("policy");
    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

    match format {
        OutputFormat::Xlsx => {
            write_xlsx(&output_path, &extraction.mapped_rows(), output_config)?;
        }
        _ => fs::write(&output_path, format_result(extraction, format)?)?,
    }

    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "insurer",
        "vehicles",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(extraction) = &result.extraction {
            wtr.write_record([
                filename,
                "success",
                extraction.insurer.as_str(),
                &extraction.rows.len().to_string(),
                &extraction.warnings.len().to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
