use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::expiry::ExpiryPolicy;
use crate::models::Stats;
use crate::store::RecordStore;

/// Purges expired records, then counts what is left: live records and the
/// sum of their duplicate counters.
pub async fn compute_stats(
    store: &RecordStore,
    expiry: &ExpiryPolicy,
    now: DateTime<Utc>,
) -> Result<Stats, StoreError> {
    expiry.purge_expired(store, now).await?;

    let stats = store.list_all().iter().fold(Stats::default(), |mut acc, r| {
        acc.successful += 1;
        acc.duplicate_count += r.duplicate_count;
        acc
    });
    Ok(stats)
}
