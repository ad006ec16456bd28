use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};

use super::AppState;
use crate::error::{AppError, Result};

/// Scrape endpoint.
///
/// Gathering triggers the blocking device fetch, so it runs on the blocking
/// pool. Device failures show up as zero values, not as an error response.
pub async fn metrics(State(state): State<AppState>) -> Result<Response> {
    let registry = state.registry.clone();
    let families = tokio::task::spawn_blocking(move || registry.gather())
        .await
        .map_err(|e| AppError::Internal(format!("scrape task failed: {}", e)))?;

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;

    Ok((
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response())
}
