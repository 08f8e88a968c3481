mod health;
mod interaction;
mod metrics;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(interaction::index))
        .route("/upload", post(interaction::upload))
        .route("/analyze", post(interaction::analyze))
        .route("/clear", post(interaction::clear))
        .route("/preview", get(interaction::preview))
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
}
