use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{health::health_check, metrics::metrics, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
