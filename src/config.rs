// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::panels::PanelKind;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
    #[serde(default)]
    pub model: ModelConfig,
    /// Panels to attempt, in display order
    #[serde(default = "PanelKind::all")]
    pub panels: Vec<PanelKind>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub kind: ModelKind,
    /// Artifact path for a local model
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    /// Base URL for a remote model
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Also write JSON logs to this file
    #[serde(default)]
    pub json_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: AppConfig,
    production: Option<AppConfig>,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_max_upload_mb() -> u64 {
    20
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/fraud_model.toml")
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Local,
            path: default_model_path(),
            url: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
            model: ModelConfig::default(),
            panels: PanelKind::all(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration for the current environment
    pub fn load(path: &Path) -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_yaml_str(&content, &environment)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            warn!(
                "{} not found, starting with default configuration",
                path.display()
            );
            Self::default()
        };

        if let Ok(port) = std::env::var("SCAM_PORT") {
            config.port = port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("SCAM_PORT must be a valid port number"))?;
        }

        config.model.path = Self::resolve_path(&config.model.path)?;
        if let Some(json_file) = &config.logging.json_file {
            config.logging.json_file = Some(Self::resolve_path(json_file)?);
        }

        Ok(config)
    }

    pub fn from_yaml_str(content: &str, environment: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        let config = match environment {
            "production" => file
                .production
                .ok_or_else(|| anyhow::anyhow!("no 'production' section in configuration"))?,
            _ => file.local,
        };

        if config.panels.is_empty() {
            warn!("Panel list is empty, only the results table will be shown");
        }
        Ok(config)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn get_environment() -> String {
        std::env::var("SCAM_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }
}
