// src/table.rs
//! Posting table: the in-memory CSV of one upload, augmented in place

use anyhow::{Context, Result};
use std::io::Read;

use crate::error::DashboardError;

pub const TITLE: &str = "title";
pub const LOCATION: &str = "location";
pub const EMPLOYMENT_TYPE: &str = "employment_type";
pub const DESCRIPTION: &str = "description";
pub const FRAUD_PROBABILITY: &str = "fraud_probability";
pub const FRAUD_PREDICTION: &str = "fraud_prediction";
pub const TITLE_LENGTH: &str = "title_length";
pub const DESC_WORD_COUNT: &str = "desc_word_count";

/// Row-major table of string cells with ordered column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PostingTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DashboardError> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DashboardError::Ingest(format!(
                    "row {} has {} fields, expected {}",
                    index + 1,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Parse CSV bytes. A header row is required; ragged rows are rejected.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DashboardError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| DashboardError::Ingest(e.to_string()))?
            .clone();

        if headers.is_empty() {
            return Err(DashboardError::Ingest(
                "the uploaded file is empty".to_string(),
            ));
        }

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let name = if i == 0 {
                    name.trim_start_matches('\u{feff}')
                } else {
                    name
                };
                name.trim().to_string()
            })
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DashboardError::Ingest(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(columns, rows)
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, DashboardError> {
        Self::from_csv_reader(bytes)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column in row order, or `None` when absent.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    pub fn require_column(&self, name: &str) -> Result<Vec<&str>, DashboardError> {
        self.column(name)
            .ok_or_else(|| DashboardError::MissingColumn(name.to_string()))
    }

    /// Parsed numeric cells; empty or unparsable cells are `None`.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|cells| cells.into_iter().map(parse_number).collect())
    }

    /// Columns where every non-empty cell is a finite number and at least one is present.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                let mut seen = false;
                for row in &self.rows {
                    let cell = row[*index].trim();
                    if cell.is_empty() {
                        continue;
                    }
                    if parse_number(cell).is_none() {
                        return false;
                    }
                    seen = true;
                }
                seen
            })
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Add a column, or overwrite it in place when it already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<(), DashboardError> {
        if values.len() != self.rows.len() {
            return Err(DashboardError::InvalidOutput(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Derive `title_length` and, when a description exists, `desc_word_count`.
    pub fn add_derived_columns(&mut self) -> Result<(), DashboardError> {
        let title_lengths: Vec<String> = self
            .require_column(TITLE)?
            .into_iter()
            .map(|title| title_length(title).to_string())
            .collect();
        self.set_column(TITLE_LENGTH, title_lengths)?;

        if let Some(descriptions) = self.column(DESCRIPTION) {
            let counts: Vec<String> = descriptions
                .into_iter()
                .map(|text| word_count(text).to_string())
                .collect();
            self.set_column(DESC_WORD_COUNT, counts)?;
        }
        Ok(())
    }

    /// Full export: all columns, header row, no index column.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .context("Failed to write CSV header")?;
        for row in &self.rows {
            writer.write_record(row).context("Failed to write CSV row")?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
        String::from_utf8(bytes).context("CSV export is not valid UTF-8")
    }
}

pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Character count of the title text.
pub fn title_length(title: &str) -> usize {
    title.chars().count()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PostingTable {
        PostingTable::from_csv_bytes(
            b"title,location,description\nEngineer,\"Berlin, DE\",Build things\nScam Job,,Earn $$$ from home now\nAnalyst,NYC,\n",
        )
        .unwrap()
    }

    #[test]
    fn test_parses_header_and_rows() {
        let table = sample();
        assert_eq!(table.columns(), &["title", "location", "description"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column(LOCATION).unwrap(), vec!["Berlin, DE", "", "NYC"]);
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = PostingTable::from_csv_bytes(b"title,location\n").unwrap();
        assert_eq!(table.row_count(), 0);
        assert!(table.has_column(TITLE));
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        assert!(matches!(
            PostingTable::from_csv_bytes(b""),
            Err(DashboardError::Ingest(_))
        ));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let result = PostingTable::from_csv_bytes(b"title,location\nEngineer\n");
        assert!(matches!(result, Err(DashboardError::Ingest(_))));
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let table = PostingTable::from_csv_bytes("\u{feff}title\nEngineer\n".as_bytes()).unwrap();
        assert!(table.has_column(TITLE));
    }

    #[test]
    fn test_derived_columns() {
        let mut table = sample();
        table.add_derived_columns().unwrap();
        assert_eq!(table.column(TITLE_LENGTH).unwrap(), vec!["8", "8", "7"]);
        assert_eq!(table.column(DESC_WORD_COUNT).unwrap(), vec!["2", "5", "0"]);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_title_length_counts_characters() {
        assert_eq!(title_length("Ingénieur"), 9);
        assert_eq!(title_length(""), 0);
    }

    #[test]
    fn test_no_word_count_without_description() {
        let mut table = PostingTable::from_csv_bytes(b"title\nEngineer\n").unwrap();
        table.add_derived_columns().unwrap();
        assert!(!table.has_column(DESC_WORD_COUNT));
    }

    #[test]
    fn test_set_column_overwrites_in_place() {
        let mut table = PostingTable::from_csv_bytes(b"title,fraud_probability\nA,x\n").unwrap();
        table
            .set_column(FRAUD_PROBABILITY, vec!["0.5".to_string()])
            .unwrap();
        assert_eq!(table.columns(), &["title", "fraud_probability"]);
        assert_eq!(table.column(FRAUD_PROBABILITY).unwrap(), vec!["0.5"]);
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut table = sample();
        assert!(table.set_column("x", vec!["1".to_string()]).is_err());
    }

    #[test]
    fn test_numeric_columns() {
        let table =
            PostingTable::from_csv_bytes(b"title,salary,telecommuting,empty\nA,100,0,\nB,,1,\nC,250.5,0,\n")
                .unwrap();
        assert_eq!(table.numeric_columns(), vec!["salary", "telecommuting"]);
    }

    #[test]
    fn test_export_has_no_index_column() {
        let mut table = sample();
        table.add_derived_columns().unwrap();
        let csv = table.to_csv_string().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "title,location,description,title_length,desc_word_count"
        );
        let reparsed = PostingTable::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(reparsed.row_count(), 3);
        assert_eq!(reparsed.column(LOCATION).unwrap()[0], "Berlin, DE");
    }
}
