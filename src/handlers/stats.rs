use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::error::TallyError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::Stats;
use crate::state::AppState;

// GET /api/stats
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, TallyError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let stats = state.tally.stats(Utc::now()).await?;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    Ok(Json(stats))
}
