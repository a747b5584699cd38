// src/web/mod.rs

pub mod handlers;
pub mod page;
pub mod types;
pub mod upload;

pub use handlers::*;
pub use types::*;

use crate::config::AppConfig;
use crate::model::FraudModel;
use crate::session::DashboardReport;
use anyhow::Result;
use rocket::data::{ByteUnit, Limits, ToByteUnit};
use rocket::form::Form;
use rocket::response::content::RawHtml;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{catchers, get, post, routes, Build, Request, Rocket, State};
use std::sync::Arc;
use tracing::info;

/// Room for multipart boundaries and headers on top of the file itself.
const FORM_OVERHEAD_BYTES: u64 = 64 * 1024;

// Dashboard pages

#[get("/")]
pub async fn index() -> RawHtml<String> {
    handlers::index_handler().await
}

#[post("/dashboard", data = "<upload>")]
pub async fn dashboard(
    upload: Form<CsvUploadForm<'_>>,
    config: &State<ServerConfig>,
) -> Custom<RawHtml<String>> {
    handlers::dashboard_handler(&upload, config).await
}

// Machine-readable twins of the dashboard

#[post("/predict", data = "<upload>")]
pub async fn predict(
    upload: Form<CsvUploadForm<'_>>,
    config: &State<ServerConfig>,
) -> Result<Json<DataResponse<DashboardReport>>, ApiError> {
    handlers::predict_handler(&upload, config).await
}

#[post("/predict/csv", data = "<upload>")]
pub async fn predict_csv(
    upload: Form<CsvUploadForm<'_>>,
    config: &State<ServerConfig>,
) -> Result<CsvResponse, ApiError> {
    handlers::predict_csv_handler(&upload, config).await
}

#[get("/health")]
pub async fn health(config: &State<ServerConfig>) -> Json<TextResponse> {
    handlers::health_handler(config).await
}

// Error catchers for the HTML pages

#[rocket::catch(400)]
pub fn page_bad_request() -> RawHtml<String> {
    RawHtml(page::status_page(
        "Invalid upload",
        "The request could not be read. Choose a CSV file and try again.",
    ))
}

#[rocket::catch(404)]
pub fn page_not_found() -> RawHtml<String> {
    RawHtml(page::status_page(
        "Page not found",
        "Start again from the upload form below.",
    ))
}

fn upload_limit_mb(req: &Request<'_>) -> u64 {
    req.rocket()
        .state::<ServerConfig>()
        .map_or(0, |config| config.max_upload_bytes / (1024 * 1024))
}

#[rocket::catch(413)]
pub fn page_too_large(req: &Request<'_>) -> RawHtml<String> {
    RawHtml(page::status_page(
        "File too large",
        &format!(
            "Uploads are limited to {}MB. Split the file and try again.",
            upload_limit_mb(req)
        ),
    ))
}

#[rocket::catch(422)]
pub fn page_unprocessable() -> RawHtml<String> {
    RawHtml(page::status_page(
        "No file received",
        "Choose a CSV file in the upload form before submitting.",
    ))
}

#[rocket::catch(500)]
pub fn page_internal_error() -> RawHtml<String> {
    RawHtml(page::status_page(
        "Internal server error",
        "Try again in a few moments.",
    ))
}

// Error catchers for the API

#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Send the file as multipart/form-data".to_string(),
            "Use the field name 'csv_file'".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Endpoint not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Available endpoints: /api/predict, /api/predict/csv, /api/health".to_string()],
    ))
}

#[rocket::catch(413)]
pub fn payload_too_large(req: &Request<'_>) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("File size exceeds {}MB limit", upload_limit_mb(req)),
        "FILE_TOO_LARGE".to_string(),
        vec!["Split very large files before uploading".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Missing or unreadable 'csv_file' form field".to_string(),
        "MISSING_FILE".to_string(),
        vec![
            "Send the file as multipart/form-data".to_string(),
            "Use the field name 'csv_file'".to_string(),
        ],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

fn form_limit(max_upload_bytes: u64) -> ByteUnit {
    max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES).bytes()
}

/// Assemble the server without launching it.
pub fn build_rocket(config: &AppConfig, model: Arc<dyn FraudModel>) -> Rocket<Build> {
    let max_upload_bytes = config.max_upload_bytes();
    let form_limit = form_limit(max_upload_bytes);
    let limits = Limits::default()
        .limit("file", form_limit)
        .limit("data-form", form_limit);

    let figment = rocket::Config::figment()
        .merge(("address", config.address.clone()))
        .merge(("port", config.port))
        .merge(("limits", limits));

    let server_config = ServerConfig {
        model,
        panels: config.panels.clone(),
        max_upload_bytes,
    };

    rocket::custom(figment)
        .manage(server_config)
        .register(
            "/",
            catchers![
                page_bad_request,
                page_not_found,
                page_too_large,
                page_unprocessable,
                page_internal_error
            ],
        )
        .register(
            "/api",
            catchers![
                bad_request,
                not_found,
                payload_too_large,
                unprocessable,
                internal_error
            ],
        )
        .mount("/", routes![index, dashboard])
        .mount("/api", routes![predict, predict_csv, health])
}

// Main server start function
pub async fn start_web_server(config: &AppConfig, model: Arc<dyn FraudModel>) -> Result<()> {
    info!("Starting Spot the Scam dashboard");
    info!(
        address = %config.address,
        port = config.port,
        model = %model.name(),
        panels = config.panels.len(),
        "Server configuration"
    );

    let _rocket = build_rocket(config, model)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Web server failed: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::FixedModel;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use scraper::{Html, Selector};

    const BOUNDARY: &str = "spot-the-scam-boundary";

    fn multipart(file_name: &str, content_type: &str, body: &str) -> String {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"csv_file\"; filename=\"{f}\"\r\nContent-Type: {ct}\r\n\r\n{body}\r\n--{b}--\r\n",
            b = BOUNDARY,
            f = file_name,
            ct = content_type,
            body = body
        )
    }

    fn multipart_type() -> ContentType {
        ContentType::new("multipart", "form-data").with_params(("boundary", BOUNDARY))
    }

    async fn client(model: FixedModel) -> Client {
        client_with(&AppConfig::default(), model).await
    }

    async fn client_with(config: &AppConfig, model: FixedModel) -> Client {
        Client::tracked(build_rocket(config, Arc::new(model)))
            .await
            .unwrap()
    }

    fn scenario_model() -> FixedModel {
        FixedModel::new(vec![0, 1, 0], vec![0.1, 0.9, 0.3])
    }

    const SCENARIO: &str = "title,location\nEngineer,Berlin\nScam Job,Remote\nAnalyst,Paris";

    #[rocket::async_test]
    async fn test_index_serves_upload_form() {
        let client = client(scenario_model()).await;
        let response = client.get("/").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let html = response.into_string().await.unwrap();
        let document = Html::parse_document(&html);
        let input = Selector::parse("form[action='/dashboard'] input[type=file]").unwrap();
        assert_eq!(document.select(&input).count(), 1);
    }

    #[rocket::async_test]
    async fn test_dashboard_renders_results_and_panels() {
        let client = client(scenario_model()).await;
        let response = client
            .post("/dashboard")
            .header(multipart_type())
            .body(multipart("jobs.csv", "text/csv", SCENARIO))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let html = response.into_string().await.unwrap();
        let document = Html::parse_document(&html);

        let titles = Selector::parse("#results tbody tr td:first-child").unwrap();
        let titles: Vec<String> = document
            .select(&titles)
            .map(|cell| cell.text().collect())
            .collect();
        assert_eq!(titles, vec!["Engineer", "Scam Job", "Analyst"]);

        let sections = Selector::parse("section.panel").unwrap();
        let ids: Vec<&str> = document
            .select(&sections)
            .filter_map(|s| s.value().attr("id"))
            .collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(ids[0], "probability_histogram");

        let employment = Selector::parse("#employment_type_breakdown .info").unwrap();
        assert_eq!(document.select(&employment).count(), 1);
    }

    #[rocket::async_test]
    async fn test_dashboard_missing_title_shows_banner() {
        let client = client(scenario_model()).await;
        let response = client
            .post("/dashboard")
            .header(multipart_type())
            .body(multipart("jobs.csv", "text/csv", "name\nEngineer"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let html = response.into_string().await.unwrap();
        assert!(html.contains("data-code=\"MISSING_COLUMN\""));
    }

    #[rocket::async_test]
    async fn test_dashboard_rejects_non_csv_upload() {
        let client = client(scenario_model()).await;
        let response = client
            .post("/dashboard")
            .header(multipart_type())
            .body(multipart("jobs.pdf", "application/pdf", "%PDF-1.4"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnsupportedMediaType);
        let html = response.into_string().await.unwrap();
        let document = Html::parse_document(&html);
        let banner = Selector::parse(".error-banner").unwrap();
        let banner = document.select(&banner).next().unwrap();
        assert_eq!(banner.value().attr("data-code"), Some("INVALID_FORMAT"));
    }

    #[rocket::async_test]
    async fn test_api_rejects_non_csv_upload() {
        let client = client(scenario_model()).await;
        let response = client
            .post("/api/predict")
            .header(multipart_type())
            .body(multipart("jobs.xlsx", "application/octet-stream", "PK"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnsupportedMediaType);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "INVALID_FORMAT");
        assert_eq!(body["success"], false);
    }

    #[rocket::async_test]
    async fn test_api_rejects_file_over_limit() {
        let config = AppConfig {
            max_upload_mb: 1,
            ..AppConfig::default()
        };
        let client = client_with(&config, scenario_model()).await;

        // a little over 1 MiB of rows, still inside the multipart allowance
        let row = "Engineer\n";
        let rows = (1024 * 1024 + 4096) / row.len();
        let csv = format!("title\n{}", row.repeat(rows));
        assert!(csv.len() as u64 > config.max_upload_bytes());

        let response = client
            .post("/api/predict")
            .header(multipart_type())
            .body(multipart("jobs.csv", "text/csv", &csv))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::PayloadTooLarge);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "FILE_TOO_LARGE");
        assert_eq!(body["error"], "File size exceeds 1MB limit");
    }

    #[test]
    fn test_form_limit_saturates() {
        let config = AppConfig {
            max_upload_mb: u64::MAX,
            ..AppConfig::default()
        };
        assert_eq!(form_limit(config.max_upload_bytes()), u64::MAX.bytes());
        assert_eq!(form_limit(1024), (1024 + FORM_OVERHEAD_BYTES).bytes());
    }

    #[rocket::async_test]
    async fn test_api_predict_returns_report() {
        let client = client(scenario_model()).await;
        let response = client
            .post("/api/predict")
            .header(multipart_type())
            .body(multipart("jobs.csv", "text/csv", SCENARIO))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["row_count"], 3);
        assert_eq!(body["data"]["fraud_count"], 1);
        assert_eq!(body["data"]["results"][1]["title"], "Scam Job");
        assert_eq!(body["data"]["results"][1]["fraud_prediction"], 1);
        assert_eq!(body["data"]["panels"][1]["id"], "prediction_pie");
        assert!(body["session_id"].is_string());
    }

    #[rocket::async_test]
    async fn test_api_predict_malformed_csv() {
        let client = client(FixedModel::new(vec![], vec![])).await;
        let response = client
            .post("/api/predict")
            .header(multipart_type())
            .body(multipart("jobs.csv", "text/csv", "title,location\nA,B,C"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "INVALID_CSV");
        assert_eq!(body["success"], false);
    }

    #[rocket::async_test]
    async fn test_api_predict_csv_is_download() {
        let client = client(scenario_model()).await;
        let response = client
            .post("/api/predict/csv")
            .header(multipart_type())
            .body(multipart("jobs.csv", "text/csv", SCENARIO))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::CSV));
        let disposition = response.headers().get_one("Content-Disposition").unwrap();
        assert!(disposition.contains("scam_predictions.csv"));

        let body = response.into_string().await.unwrap();
        let mut lines = body.lines();
        assert_eq!(
            lines.next(),
            Some("title,location,fraud_probability,fraud_prediction,title_length")
        );
        assert_eq!(lines.count(), 3);
    }

    #[rocket::async_test]
    async fn test_api_missing_field_is_json_error() {
        let client = client(scenario_model()).await;
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{b}--\r\n",
            b = BOUNDARY
        );
        let response = client
            .post("/api/predict")
            .header(multipart_type())
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "MISSING_FILE");
    }

    #[rocket::async_test]
    async fn test_health_reports_model() {
        let client = client(scenario_model()).await;
        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert!(body["message"].as_str().unwrap().starts_with("OK"));
    }
}
