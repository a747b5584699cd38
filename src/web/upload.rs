// src/web/upload.rs
use rocket::fs::TempFile;
use rocket::http::ContentType;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::error::{DashboardError, UploadRejection};
use crate::utils::{display_file_name, validate_file_extension};

/// An uploaded CSV read fully into memory.
pub struct CsvUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Validate size and format of the uploaded file, then read it.
pub async fn read_csv_upload(
    file: &TempFile<'_>,
    max_bytes: u64,
) -> Result<CsvUpload, DashboardError> {
    // Extract file information before touching the contents
    let content_type = file.content_type();
    let file_size = file.len();
    let file_name = file
        .raw_name()
        .map(|name| display_file_name(name.dangerous_unsafe_unsanitized_raw().as_str()))
        .unwrap_or_else(|| "upload.csv".to_string());

    check_upload(&file_name, content_type, file_size, max_bytes)?;

    let mut bytes = Vec::with_capacity(file_size as usize);
    let reader = file
        .open()
        .await
        .map_err(|e| DashboardError::Ingest(format!("could not read upload: {}", e)))?;
    tokio::pin!(reader);
    reader
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| DashboardError::Ingest(format!("could not read upload: {}", e)))?;

    info!(file = %file_name, size = bytes.len(), "Received CSV upload");
    Ok(CsvUpload { file_name, bytes })
}

/// Size and format gate applied before the contents are read.
pub fn check_upload(
    file_name: &str,
    content_type: Option<&ContentType>,
    file_size: u64,
    max_bytes: u64,
) -> Result<(), DashboardError> {
    if file_size > max_bytes {
        warn!(file = %file_name, size = file_size, max = max_bytes, "Upload too large");
        return Err(DashboardError::Upload {
            rejection: UploadRejection::TooLarge,
            message: format!("File size exceeds {}MB limit", max_bytes / (1024 * 1024)),
        });
    }

    if !is_csv_upload(file_name, content_type) {
        let received_type = content_type
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        warn!(file = %file_name, content_type = %received_type, "Rejected non-CSV upload");
        return Err(DashboardError::Upload {
            rejection: UploadRejection::InvalidFormat,
            message: format!(
                "Only CSV files are supported. Received content type: {}",
                received_type
            ),
        });
    }

    Ok(())
}

/// Browsers label CSV inconsistently, so a `.csv` name is enough on its own.
fn is_csv_upload(file_name: &str, content_type: Option<&ContentType>) -> bool {
    if validate_file_extension(file_name, &["csv"]).is_ok() {
        return true;
    }
    content_type.map_or(false, |ct| {
        ct.is_csv() || (ct.top() == "text" && (ct.sub() == "csv" || ct.sub() == "plain"))
    })
}
