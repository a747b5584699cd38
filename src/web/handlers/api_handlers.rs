// src/web/handlers/api_handlers.rs
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use crate::session::{DashboardReport, EXPORT_FILE_NAME};
use crate::web::handlers::score_upload;
use crate::web::types::*;

pub async fn predict_handler(
    upload: &CsvUploadForm<'_>,
    config: &State<ServerConfig>,
) -> Result<Json<DataResponse<DashboardReport>>, ApiError> {
    let session = score_upload(&upload.csv_file, config)
        .await
        .map_err(|e| api_error(&e))?;

    let panels = session.render_panels(&config.panels).await.map_err(|e| {
        error!(session_id = %session.id, "Failed to render panels: {:#}", e);
        Custom(
            Status::InternalServerError,
            Json(StandardErrorResponse::new(
                "Failed to render panels".to_string(),
                "RENDER_ERROR".to_string(),
                vec!["Try again in a few moments".to_string()],
            )),
        )
    })?;
    let report = session.report(panels);
    info!(session_id = %session.id, rows = report.row_count, "Served prediction report");

    Ok(Json(DataResponse::success(
        format!(
            "Scored {} postings, {} predicted fraudulent",
            report.row_count, report.fraud_count
        ),
        report,
        Some(session.id.to_string()),
    )))
}

pub async fn predict_csv_handler(
    upload: &CsvUploadForm<'_>,
    config: &State<ServerConfig>,
) -> Result<CsvResponse, ApiError> {
    let session = score_upload(&upload.csv_file, config)
        .await
        .map_err(|e| api_error(&e))?;

    match session.export_csv() {
        Ok(data) => Ok(CsvResponse::attachment(data, EXPORT_FILE_NAME)),
        Err(e) => {
            error!(session_id = %session.id, "Failed to export predictions: {:#}", e);
            Err(Custom(
                Status::InternalServerError,
                Json(StandardErrorResponse::new(
                    "Failed to export predictions".to_string(),
                    "EXPORT_ERROR".to_string(),
                    vec!["Try again in a few moments".to_string()],
                )),
            ))
        }
    }
}
