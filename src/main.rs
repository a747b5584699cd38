use anyhow::{Context, Result};
use clap::Parser;
use spot_the_scam::cli::{handle_score_command, Cli, Command};
use spot_the_scam::{load_model, start_web_server, AppConfig};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "spot_the_scam=info,rocket::server=off";

fn init_logging(json_file: Option<&Path>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match json_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(file)
                        .with_current_span(true)
                        .with_span_list(false),
                )
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;
    init_logging(config.logging.json_file.as_deref())?;

    info!(
        config = %cli.config.display(),
        found = cli.config.exists(),
        environment = %AppConfig::get_environment(),
        "Configuration loaded"
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let model = load_model(&config.model)?;
            start_web_server(&config, model).await
        }
        Command::Score {
            input,
            output,
            charts,
            report,
        } => {
            handle_score_command(
                &config,
                &input,
                &output,
                charts.as_deref(),
                report.as_deref(),
            )
            .await
        }
    }
}
