// src/model/remote.rs
//! Model served over HTTP by an external prediction service

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info, trace};

use super::{FraudModel, PredictionBatch};
use crate::table::{PostingTable, TITLE};

const PREDICT_ENDPOINT: &str = "/predict";

#[derive(Serialize)]
struct PredictRequest<'a> {
    columns: &'a [String],
    rows: &'a [Vec<String>],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<u8>,
    probabilities: Vec<f64>,
    #[serde(default)]
    model: Option<String>,
}

pub struct RemoteModel {
    client: reqwest::Client,
    base_url: String,
    name: String,
}

impl RemoteModel {
    pub fn new(base_url: String, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let name = format!("remote:{}", base_url);
        Ok(Self {
            client,
            base_url,
            name,
        })
    }
}

#[rocket::async_trait]
impl FraudModel for RemoteModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_columns(&self) -> Vec<String> {
        vec![TITLE.to_string()]
    }

    async fn predict(&self, table: &PostingTable) -> Result<PredictionBatch> {
        let url = format!("{}{}", self.base_url, PREDICT_ENDPOINT);
        let payload = PredictRequest {
            columns: table.columns(),
            rows: table.rows(),
        };

        info!(url = %url, rows = table.row_count(), "Calling prediction service");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to call prediction service")?;

        let status = response.status();
        trace!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Prediction service error response: {}", error_text);
            anyhow::bail!("Prediction service returned status {}: {}", status, error_text);
        }

        let body: PredictResponse = response
            .json()
            .await
            .context("Failed to parse prediction service response")?;

        if let Some(model) = &body.model {
            trace!(model = %model, "Prediction service model");
        }

        Ok(PredictionBatch {
            predictions: body.predictions,
            probabilities: body.probabilities,
        })
    }
}
