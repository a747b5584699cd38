pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod panels;
pub mod session;
pub mod table;
pub mod template_processor;
pub mod utils;
pub mod web;

pub use config::AppConfig;
pub use error::DashboardError;
pub use model::{load_model, predict_fraud, FraudModel, PredictionBatch};
pub use session::{DashboardReport, DashboardSession};
pub use table::PostingTable;
pub use web::{build_rocket, start_web_server};
