use chrono::{DateTime, Duration, Utc};

use crate::error::StoreError;
use crate::store::RecordStore;

// Purges records older than the retention window
#[derive(Debug, Clone, Copy)]
pub struct ExpiryPolicy {
    pub retention: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            retention: Duration::days(30),
        }
    }
}

impl ExpiryPolicy {
    pub fn new(retention: Duration) -> Self {
        Self { retention }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.retention
    }

    /// Removes every record created strictly before `now - retention`.
    /// Duplicate counters live on the record, so they go with it.
    pub async fn purge_expired(&self, store: &RecordStore, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let cutoff = self.cutoff(now);
        let removed = store.remove_where(|r| r.created_at < cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, %cutoff, "purged expired records");
        }
        Ok(removed)
    }
}
