//! Extract command - vehicle rows of a single policy document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use fordon_core::InsurerKind;

use super::{extract_file, load_config, load_registry, parse_insurer};
use crate::output::{format_result, write_xlsx, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or decoded text)
    #[arg(required = true)]
    input: PathBuf,

    /// Insurer whose layout to apply (if, gjensidige, tryg); detected from the text if omitted
    #[arg(short, long, value_parser = parse_insurer)]
    insurer: Option<InsurerKind>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Keep repeated blocks describing the same vehicle
    #[arg(long)]
    keep_duplicates: bool,

    /// Print extraction warnings to stderr
    #[arg(long)]
    show_warnings: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.keep_duplicates {
        config.extraction.deduplicate = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if args.format == OutputFormat::Xlsx && args.output.is_none() {
        anyhow::bail!("xlsx output needs a file path (use --output)");
    }

    let registry = load_registry(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Extracting {}", args.input.display()));

    let result = extract_file(&args.input, args.insurer, &config, &registry);
    pb.finish_and_clear();
    let result = result?;

    if args.show_warnings {
        for warning in &result.warnings {
            eprintln!("{} {}", style("⚠").yellow(), warning);
        }
    }

    match (&args.output, args.format) {
        (Some(output_path), OutputFormat::Xlsx) => {
            let dropped = write_xlsx(output_path, &result.mapped_rows(), &config.output)?;
            if dropped > 0 {
                eprintln!(
                    "{} {} vehicle(s) did not fit the sheet sections",
                    style("⚠").yellow(),
                    dropped
                );
            }
            println!(
                "{} {} vehicle(s) written to {}",
                style("✓").green(),
                result.rows.len(),
                output_path.display()
            );
        }
        (Some(output_path), format) => {
            fs::write(output_path, format_result(&result, format)?)?;
            println!(
                "{} Output written to {}",
                style("✓").green(),
                output_path.display()
            );
        }
        (None, format) => {
            println!("{}", format_result(&result, format)?);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
