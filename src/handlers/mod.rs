mod check;
mod health;
mod metrics;
mod stats;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

pub use check::{check_handler, method_not_allowed};
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use stats::stats_handler;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/check", post(check_handler).fallback(method_not_allowed))
        .route("/api/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
