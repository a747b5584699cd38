// src/session.rs
//! One upload, start to finish: ingest, predict, augment, present

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::DashboardError;
use crate::model::{predict_fraud, FraudModel, PredictionBatch};
use crate::panels::{build_panels, Panel, PanelKind};
use crate::table::{PostingTable, FRAUD_PREDICTION, FRAUD_PROBABILITY, TITLE};

pub const EXPORT_FILE_NAME: &str = "scam_predictions.csv";

/// Request-scoped context; dropped when the response is sent.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    pub id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub model_name: String,
    pub table: PostingTable,
    batch: PredictionBatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub title: String,
    pub fraud_probability: f64,
    pub fraud_prediction: u8,
}

#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub session_id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub row_count: usize,
    pub fraud_count: usize,
    pub columns: Vec<String>,
    pub results: Vec<ResultRow>,
    pub panels: Vec<Panel>,
}

impl DashboardSession {
    pub async fn run(
        file_name: &str,
        bytes: &[u8],
        model: &dyn FraudModel,
    ) -> Result<Self, DashboardError> {
        let id = Uuid::new_v4();
        let span = info_span!("dashboard_session", session_id = %id, file = %file_name);
        Self::score(id, file_name, bytes, model)
            .instrument(span)
            .await
    }

    async fn score(
        id: Uuid,
        file_name: &str,
        bytes: &[u8],
        model: &dyn FraudModel,
    ) -> Result<Self, DashboardError> {
        let mut table = PostingTable::from_csv_bytes(bytes)?;
        table.require_column(TITLE)?;

        let batch = predict_fraud(model, &table).await?;

        table.set_column(
            FRAUD_PROBABILITY,
            batch.probabilities.iter().map(|p| p.to_string()).collect(),
        )?;
        table.set_column(
            FRAUD_PREDICTION,
            batch.predictions.iter().map(|p| p.to_string()).collect(),
        )?;
        table.add_derived_columns()?;

        let fraud_count = batch.predictions.iter().filter(|p| **p == 1).count();
        info!(
            rows = table.row_count(),
            fraud = fraud_count,
            model = %model.name(),
            "Scored upload"
        );

        Ok(Self {
            id,
            file_name: file_name.to_string(),
            created_at: Utc::now(),
            model_name: model.name().to_string(),
            table,
            batch,
        })
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn fraud_count(&self) -> usize {
        self.batch.predictions.iter().filter(|p| **p == 1).count()
    }

    /// The `title`, `fraud_probability`, `fraud_prediction` view shown on the page.
    pub fn results(&self) -> Vec<ResultRow> {
        let titles = self.table.column(TITLE).unwrap_or_default();
        titles
            .into_iter()
            .zip(&self.batch.probabilities)
            .zip(&self.batch.predictions)
            .map(|((title, probability), prediction)| ResultRow {
                title: title.to_string(),
                fraud_probability: *probability,
                fraud_prediction: *prediction,
            })
            .collect()
    }

    pub fn panels(&self, kinds: &[PanelKind]) -> Vec<Panel> {
        build_panels(&self.table, kinds)
    }

    /// Drawing is CPU-bound, so request handlers render on the blocking pool.
    pub async fn render_panels(&self, kinds: &[PanelKind]) -> anyhow::Result<Vec<Panel>> {
        let table = self.table.clone();
        let kinds = kinds.to_vec();
        tokio::task::spawn_blocking(move || build_panels(&table, &kinds))
            .await
            .context("Panel rendering task failed")
    }

    pub fn export_csv(&self) -> anyhow::Result<String> {
        self.table.to_csv_string()
    }

    pub fn report(&self, panels: Vec<Panel>) -> DashboardReport {
        DashboardReport {
            session_id: self.id,
            file_name: self.file_name.clone(),
            created_at: self.created_at,
            model: self.model_name.clone(),
            row_count: self.row_count(),
            fraud_count: self.fraud_count(),
            columns: self.table.columns().to_vec(),
            results: self.results(),
            panels,
        }
    }
}
