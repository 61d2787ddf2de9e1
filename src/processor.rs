use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::Result;
use crate::expiry::ExpiryPolicy;
use crate::metrics::{ADDED_TOTAL, DUPLICATES_TOTAL, LIVE_RECORDS};
use crate::models::{Outcome, Stats};
use crate::reset::DailyReset;
use crate::stats::compute_stats;
use crate::store::RecordStore;
use crate::validation::parse_ipv4;

// Submission processing and stats over one store handle
#[derive(Clone)]
pub struct Tally {
    pub store: Arc<RecordStore>,
    pub expiry: ExpiryPolicy,
    pub reset: DailyReset,
}

impl Tally {
    pub fn new(store: Arc<RecordStore>, expiry: ExpiryPolicy, reset: DailyReset) -> Self {
        Self { store, expiry, reset }
    }

    /// Validates and records one submission.
    ///
    /// Malformed input is rejected before the store is touched. Otherwise the
    /// daily reset and expiry run first, so an expired address counts as new.
    pub async fn submit(&self, text: &str, now: DateTime<Utc>) -> Result<Outcome> {
        let address = parse_ipv4(text)?;

        self.maintain(now).await?;
        let outcome = self.store.record_submission(address, now).await?;

        match outcome {
            Outcome::Added => ADDED_TOTAL.inc(),
            Outcome::Duplicate => DUPLICATES_TOTAL.inc(),
        }
        LIVE_RECORDS.set(self.store.len() as f64);
        tracing::debug!(%address, ?outcome, "submission recorded");
        Ok(outcome)
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<Stats> {
        let stats = compute_stats(&self.store, &self.expiry, now).await?;
        LIVE_RECORDS.set(stats.successful as f64);
        Ok(stats)
    }

    /// Runs the daily reset then the expiry purge.
    pub async fn maintain(&self, now: DateTime<Utc>) -> Result<()> {
        self.reset.reset_if_due(&self.store, now).await?;
        self.expiry.purge_expired(&self.store, now).await?;
        Ok(())
    }
}
