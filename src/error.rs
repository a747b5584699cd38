// src/error.rs
use std::fmt;

/// Why an upload was refused before its contents were read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    TooLarge,
    InvalidFormat,
}

impl UploadRejection {
    pub fn error_code(&self) -> &'static str {
        match self {
            UploadRejection::TooLarge => "FILE_TOO_LARGE",
            UploadRejection::InvalidFormat => "INVALID_FORMAT",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            UploadRejection::TooLarge => 413,
            UploadRejection::InvalidFormat => 415,
        }
    }
}

/// Failures of one dashboard run, mapped to HTTP status and error code at the web edge.
#[derive(Debug)]
pub enum DashboardError {
    /// Upload could not be parsed as CSV
    Ingest(String),
    /// A column required by the model is missing
    MissingColumn(String),
    /// Upload rejected before parsing
    Upload {
        rejection: UploadRejection,
        message: String,
    },
    /// The model call itself failed
    Model(anyhow::Error),
    /// The model answered with something that breaks the table contract
    InvalidOutput(String),
}

impl DashboardError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DashboardError::Ingest(_) => "INVALID_CSV",
            DashboardError::MissingColumn(_) => "MISSING_COLUMN",
            DashboardError::Upload { rejection, .. } => rejection.error_code(),
            DashboardError::Model(_) | DashboardError::InvalidOutput(_) => "MODEL_ERROR",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            DashboardError::Ingest(_) => 400,
            DashboardError::MissingColumn(_) => 422,
            DashboardError::Upload { rejection, .. } => rejection.status_code(),
            DashboardError::Model(_) | DashboardError::InvalidOutput(_) => 502,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            DashboardError::Ingest(_) => vec![
                "Check that the file is a comma-separated CSV with a header row".to_string(),
                "Make sure every row has the same number of fields".to_string(),
            ],
            DashboardError::MissingColumn(column) => vec![
                format!("Add a '{}' column to the CSV", column),
                "Export the postings with their original column names".to_string(),
            ],
            DashboardError::Upload { .. } => vec![
                "Upload a .csv file".to_string(),
                "Split very large files before uploading".to_string(),
            ],
            DashboardError::Model(_) | DashboardError::InvalidOutput(_) => vec![
                "Try again in a few moments".to_string(),
                "Contact support if the problem persists".to_string(),
            ],
        }
    }
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::Ingest(message) => write!(f, "Could not parse CSV: {}", message),
            DashboardError::MissingColumn(column) => {
                write!(f, "Required column '{}' is missing from the upload", column)
            }
            DashboardError::Upload { message, .. } => write!(f, "{}", message),
            DashboardError::Model(e) => write!(f, "Prediction failed: {:#}", e),
            DashboardError::InvalidOutput(message) => {
                write!(f, "Model returned invalid output: {}", message)
            }
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashboardError::Model(e) => Some(&**e),
            _ => None,
        }
    }
}
