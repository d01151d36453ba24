use crate::ui;
use anyhow::{Context, Result};
use clap::ValueEnum;
use pulse_core::Snapshot;
use pulse_export::{format_text, render_prometheus};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Prometheus,
}

pub async fn execute(
    snapshot_file: PathBuf,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let contents = tokio::fs::read_to_string(&snapshot_file)
        .await
        .with_context(|| format!("Failed to read {}", snapshot_file.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a metrics snapshot", snapshot_file.display()))?;

    let rendered = render(&snapshot, format)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ui::print_success(&format!("Report written to {}", path.display()));
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn render(snapshot: &Snapshot, format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => format_text(snapshot),
        ReportFormat::Json => format!("{}\n", serde_json::to_string_pretty(snapshot)?),
        ReportFormat::Prometheus => render_prometheus(snapshot),
    })
}
