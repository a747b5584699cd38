// src/web/handlers/dashboard_handlers.rs
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::response::status::Custom;
use rocket::State;
use tracing::{error, info, warn};

use crate::error::DashboardError;
use crate::session::DashboardSession;
use crate::web::page;
use crate::web::types::*;
use crate::web::upload::read_csv_upload;

/// Read the upload and run the whole pipeline for it.
pub async fn score_upload(
    file: &TempFile<'_>,
    config: &ServerConfig,
) -> Result<DashboardSession, DashboardError> {
    let upload = read_csv_upload(file, config.max_upload_bytes).await?;
    DashboardSession::run(&upload.file_name, &upload.bytes, config.model.as_ref()).await
}

pub async fn index_handler() -> RawHtml<String> {
    RawHtml(page::upload_page(None))
}

pub async fn dashboard_handler(
    upload: &CsvUploadForm<'_>,
    config: &State<ServerConfig>,
) -> Custom<RawHtml<String>> {
    let session = match score_upload(&upload.csv_file, config).await {
        Ok(session) => session,
        Err(e) => {
            warn!(error_code = e.error_code(), "Dashboard request failed: {}", e);
            return Custom(
                Status::new(e.status_code()),
                RawHtml(page::upload_page(Some(&e))),
            );
        }
    };

    let export = match session.export_csv() {
        Ok(export) => export,
        Err(e) => {
            error!(session_id = %session.id, "Failed to export predictions: {:#}", e);
            return Custom(
                Status::InternalServerError,
                RawHtml(page::status_page(
                    "Internal server error",
                    "The predictions could not be exported. Try again in a few moments.",
                )),
            );
        }
    };

    let panels = match session.render_panels(&config.panels).await {
        Ok(panels) => panels,
        Err(e) => {
            error!(session_id = %session.id, "Failed to render panels: {:#}", e);
            return Custom(
                Status::InternalServerError,
                RawHtml(page::status_page(
                    "Internal server error",
                    "The charts could not be drawn. Try again in a few moments.",
                )),
            );
        }
    };
    info!(
        session_id = %session.id,
        panels = panels.len(),
        "Rendered dashboard"
    );
    Custom(
        Status::Ok,
        RawHtml(page::dashboard_page(&session, &panels, &export)),
    )
}
