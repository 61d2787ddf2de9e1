use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::error::TallyError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{CheckRequest, CheckResponse, ErrorBody};
use crate::state::AppState;

// POST /api/check
pub async fn check_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>, TallyError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let Json(payload) = payload.map_err(|e| TallyError::BadRequest(e.body_text()))?;
    let ip = payload.ip.unwrap_or_default();

    let status = state.tally.submit(&ip, Utc::now()).await?;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    Ok(Json(CheckResponse { status }))
}

// Any method other than POST on /api/check
pub async fn method_not_allowed() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error: "Method not allowed".to_string(),
        }),
    )
}
