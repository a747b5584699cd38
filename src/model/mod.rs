// src/model/mod.rs
//! Inference adapter: the boundary between the dashboard and an externally supplied model

pub mod linear;
pub mod remote;

pub use linear::LinearTextModel;
pub use remote::RemoteModel;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::{ModelConfig, ModelKind};
use crate::error::DashboardError;
use crate::table::PostingTable;

/// Per-row model output, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionBatch {
    pub predictions: Vec<u8>,
    pub probabilities: Vec<f64>,
}

/// An externally supplied fraud classifier. The decision threshold belongs to the model.
#[rocket::async_trait]
pub trait FraudModel: Send + Sync {
    fn name(&self) -> &str;

    /// Columns the model cannot predict without.
    fn required_columns(&self) -> Vec<String>;

    async fn predict(&self, table: &PostingTable) -> Result<PredictionBatch>;
}

/// Load the configured model once; it is shared read-only by every request.
pub fn load_model(config: &ModelConfig) -> Result<Arc<dyn FraudModel>> {
    let model: Arc<dyn FraudModel> = match config.kind {
        ModelKind::Local => Arc::new(LinearTextModel::load(&config.path)?),
        ModelKind::Remote => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("model.url is required for a remote model"))?;
            Arc::new(RemoteModel::new(url, config.timeout_seconds)?)
        }
    };

    info!(model = %model.name(), kind = ?config.kind, "Fraud model loaded");
    Ok(model)
}

/// Call the model and hold its answer to the table contract.
pub async fn predict_fraud(
    model: &dyn FraudModel,
    table: &PostingTable,
) -> Result<PredictionBatch, DashboardError> {
    for column in model.required_columns() {
        if !table.has_column(&column) {
            return Err(DashboardError::MissingColumn(column));
        }
    }

    let batch = model
        .predict(table)
        .await
        .map_err(DashboardError::Model)?;

    let rows = table.row_count();
    if batch.predictions.len() != rows || batch.probabilities.len() != rows {
        return Err(DashboardError::InvalidOutput(format!(
            "expected {} predictions and probabilities, got {} and {}",
            rows,
            batch.predictions.len(),
            batch.probabilities.len()
        )));
    }

    if let Some(p) = batch
        .probabilities
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(DashboardError::InvalidOutput(format!(
            "probability {} is outside [0, 1]",
            p
        )));
    }

    if let Some(label) = batch.predictions.iter().find(|label| **label > 1) {
        return Err(DashboardError::InvalidOutput(format!(
            "prediction {} is not 0 or 1",
            label
        )));
    }

    Ok(batch)
}
