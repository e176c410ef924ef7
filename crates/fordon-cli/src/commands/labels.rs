//! Labels command - list the field labels recognized per insurer.

use clap::Args;
use console::style;

use fordon_core::{FieldId, InsurerKind, LabelOrigin, LabelRegistry};

use super::{load_config, load_registry, parse_insurer};

/// Arguments for the labels command.
#[derive(Args)]
pub struct LabelsArgs {
    /// Only show this insurer
    #[arg(short, long, value_parser = parse_insurer)]
    insurer: Option<InsurerKind>,

    /// Print the labels as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: LabelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registry = load_registry(&config)?;

    let insurers: Vec<InsurerKind> = match args.insurer {
        Some(insurer) => vec![insurer],
        None => registry.insurers().collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&labels_json(&registry, &insurers)?)?);
        return Ok(());
    }

    for insurer in insurers {
        println!("{}", style(insurer).bold());
        for field in FieldId::ALL {
            let patterns = registry.patterns(insurer, field)?;
            if patterns.is_empty() {
                println!("  {:<16} {}", field.as_str(), style("not printed").dim());
                continue;
            }

            let labels: Vec<String> = patterns
                .iter()
                .map(|pattern| match pattern.origin() {
                    LabelOrigin::Original => pattern.label().to_string(),
                    LabelOrigin::OcrVariant => format!("{}", style(pattern.label()).yellow()),
                })
                .collect();
            println!("  {:<16} {}", field.as_str(), labels.join(" | "));
        }
        println!();
    }

    Ok(())
}

/// `{"tryg": {"bonus": ["Bonus", ...]}}`, the shape label overlays use.
fn labels_json(
    registry: &LabelRegistry,
    insurers: &[InsurerKind],
) -> anyhow::Result<serde_json::Value> {
    let mut root = serde_json::Map::new();
    for insurer in insurers {
        let mut fields = serde_json::Map::new();
        for field in registry.supported_fields(*insurer)? {
            let labels: Vec<&str> = registry
                .patterns(*insurer, field)?
                .iter()
                .map(|pattern| pattern.label())
                .collect();
            fields.insert(field.as_str().to_string(), serde_json::json!(labels));
        }
        root.insert(insurer.as_str().to_string(), serde_json::Value::Object(fields));
    }
    Ok(serde_json::Value::Object(root))
}
