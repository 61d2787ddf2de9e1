use chrono::Utc;
use tokio::time::{Duration, interval};

use crate::processor::Tally;

// Sweeper: runs the daily reset and expiry purge on a timer, so stale
// counters and old records are cleared even while no requests arrive.
pub async fn sweeper(tally: Tally, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    tracing::info!("Sweeper started (interval: {:?})", sweep_interval);

    loop {
        interval.tick().await;

        if let Err(e) = tally.maintain(Utc::now()).await {
            tracing::warn!(error = %e, "sweep failed, retrying next tick");
        }
    }
}
