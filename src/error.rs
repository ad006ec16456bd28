use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metrics error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_message = match self {
            AppError::Prometheus(ref e) => {
                tracing::error!("Metrics error: {:?}", e);
                "Failed to encode metrics"
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error"
            }
            ref other => {
                tracing::error!("Unexpected error: {}", other);
                "Internal server error"
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Why a single device fetch produced no reading.
///
/// These never leave the collector: they are logged and replaced by the zero
/// reading so a scrape always succeeds.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("device unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed reading device response: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed decoding device response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("device returned no readings")]
    Empty,
}
