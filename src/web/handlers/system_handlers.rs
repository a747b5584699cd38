// src/web/handlers/system_handlers.rs
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

pub async fn health_handler(config: &State<ServerConfig>) -> Json<TextResponse> {
    info!(model = %config.model.name(), "Health check");
    Json(TextResponse::success(format!(
        "OK - model {}",
        config.model.name()
    )))
}
