// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::AppConfig;
use crate::model::load_model;
use crate::panels::{ChartData, Panel, PanelBody};
use crate::session::{DashboardSession, EXPORT_FILE_NAME};
use crate::utils::format_probability;

#[derive(Parser)]
#[command(name = "spot-the-scam")]
#[command(about = "Job posting fraud detection dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the YAML configuration file
    #[arg(long, global = true, default_value = "config.yaml")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the web dashboard (default)
    Serve,
    /// Score a CSV file offline and write the predictions export
    Score {
        input: PathBuf,
        /// Where to write the augmented CSV
        #[arg(long, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,
        /// Directory for one SVG per chart panel
        #[arg(long)]
        charts: Option<PathBuf>,
        /// Write the JSON report served by /api/predict
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

pub async fn handle_score_command(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    charts: Option<&Path>,
    report: Option<&Path>,
) -> Result<()> {
    let model = load_model(&config.model)?;
    let bytes = fs::read(input)
        .with_context(|| format!("Failed to read input CSV: {}", input.display()))?;
    let file_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("input.csv");

    let session = DashboardSession::run(file_name, &bytes, model.as_ref()).await?;

    let export = session.export_csv()?;
    fs::write(output, export)
        .with_context(|| format!("Failed to write predictions: {}", output.display()))?;
    info!(output = %output.display(), "Wrote predictions export");

    let panels = session.panels(&config.panels);
    if let Some(dir) = charts {
        write_charts(dir, &panels)?;
    }
    if let Some(path) = report {
        let json = serde_json::to_string_pretty(&session.report(panels.clone()))
            .context("Failed to serialize report")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!(report = %path.display(), "Wrote JSON report");
    }

    println!(
        "{}: {} postings, {} predicted fraudulent (model {})",
        session.file_name,
        session.row_count(),
        session.fraud_count(),
        session.model_name
    );
    for row in session.results() {
        println!(
            "  {:<50} {}  {}",
            row.title,
            format_probability(row.fraud_probability),
            row.fraud_prediction
        );
    }
    for panel in &panels {
        println!("{}: {}", panel.heading, describe(&panel.body));
    }
    println!("Predictions written to {}", output.display());

    Ok(())
}

fn write_charts(dir: &Path, panels: &[Panel]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create chart directory: {}", dir.display()))?;
    for panel in panels {
        if let PanelBody::Chart { svg, .. } = &panel.body {
            let path = dir.join(format!("{}.svg", panel.id));
            fs::write(&path, svg)
                .with_context(|| format!("Failed to write chart: {}", path.display()))?;
        }
    }
    Ok(())
}

/// One-line text rendering of a panel for the terminal.
fn describe(body: &PanelBody) -> String {
    match body {
        PanelBody::Info { message } => message.clone(),
        PanelBody::Error { message } => format!("error: {}", message),
        PanelBody::Chart { data, .. } => match data {
            ChartData::Histogram { bins, .. } => {
                let counts: Vec<String> = bins.iter().map(|b| b.count.to_string()).collect();
                format!("bin counts [{}]", counts.join(" "))
            }
            ChartData::Pie { slices } => slices
                .iter()
                .map(|s| format!("{} {} ({:.1}%)", s.label, s.count, s.percent))
                .collect::<Vec<_>>()
                .join(", "),
            ChartData::HorizontalBar { bars, .. } => bars
                .iter()
                .map(|(label, count)| format!("{} x{}", label, count))
                .collect::<Vec<_>>()
                .join(", "),
            ChartData::StackedBar { groups } => groups
                .iter()
                .map(|g| format!("{} real {} / fraud {}", g.category, g.real, g.fraud))
                .collect::<Vec<_>>()
                .join(", "),
            ChartData::Scatter { points, .. } => format!("{} points", points.len()),
            ChartData::BoxPlot { groups } => groups
                .iter()
                .map(|g| format!("{} median {}", g.label, g.summary.median))
                .collect::<Vec<_>>()
                .join(", "),
            ChartData::Heatmap { columns, .. } => {
                format!("{} numeric columns ({})", columns.len(), columns.join(", "))
            }
        },
    }
}
