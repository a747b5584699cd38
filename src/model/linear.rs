// src/model/linear.rs
//! Serialized logistic text classifier loaded from a TOML artifact

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use super::{FraudModel, PredictionBatch};
use crate::table::PostingTable;

#[derive(Debug, Clone, Deserialize)]
pub struct LinearTextModel {
    pub name: String,
    #[serde(default)]
    pub bias: f64,
    pub threshold: f64,
    pub text_columns: Vec<String>,
    #[serde(default)]
    pub required_columns: Vec<String>,
    #[serde(default)]
    pub token_weights: HashMap<String, f64>,
    /// column -> value -> weight
    #[serde(default)]
    pub categorical_weights: HashMap<String, HashMap<String, f64>>,
    /// Added when the column is absent or the cell is empty
    #[serde(default)]
    pub missing_weights: HashMap<String, f64>,
}

impl LinearTextModel {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse model artifact: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let model: Self = toml::from_str(content)?;
        if !(0.0..=1.0).contains(&model.threshold) {
            anyhow::bail!("threshold {} is outside [0, 1]", model.threshold);
        }
        if model.text_columns.is_empty() {
            anyhow::bail!("text_columns must name at least one column");
        }
        Ok(model)
    }

    fn score_row(&self, table: &PostingTable, row: &[String]) -> f64 {
        let cell = |column: &str| non_empty_cell(table, row, column);

        let mut logit = self.bias;

        let mut tokens = HashSet::new();
        for column in &self.text_columns {
            if let Some(text) = cell(column) {
                tokens.extend(tokenize(text));
            }
        }
        logit += tokens
            .iter()
            .filter_map(|token| self.token_weights.get(token))
            .sum::<f64>();

        for (column, weights) in &self.categorical_weights {
            if let Some(weight) = cell(column).and_then(|value| weights.get(value)) {
                logit += weight;
            }
        }

        for (column, weight) in &self.missing_weights {
            if cell(column).is_none() {
                logit += weight;
            }
        }

        sigmoid(logit)
    }
}

#[rocket::async_trait]
impl FraudModel for LinearTextModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_columns(&self) -> Vec<String> {
        self.required_columns.clone()
    }

    async fn predict(&self, table: &PostingTable) -> Result<PredictionBatch> {
        let probabilities: Vec<f64> = table
            .rows()
            .iter()
            .map(|row| self.score_row(table, row))
            .collect();
        let predictions = probabilities
            .iter()
            .map(|p| u8::from(*p >= self.threshold))
            .collect();

        debug!(model = %self.name, rows = table.row_count(), "Scored postings");
        Ok(PredictionBatch {
            predictions,
            probabilities,
        })
    }
}

fn non_empty_cell<'a>(table: &PostingTable, row: &'a [String], column: &str) -> Option<&'a str> {
    table
        .column_index(column)
        .map(|index| row[index].trim())
        .filter(|value| !value.is_empty())
}

/// Lowercase alphanumeric runs.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
