//! Daily reset of duplicate counters.
//!
//! The boundary is `hour:00` local time in a fixed UTC offset. Counters are
//! cleared the first time the policy runs after a boundary has passed; any
//! further calls before the next boundary are no-ops.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

use crate::error::StoreError;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy)]
pub struct DailyReset {
    pub hour: u32,
    pub offset: FixedOffset,
}

impl Default for DailyReset {
    fn default() -> Self {
        Self {
            hour: 6,
            // UTC+05:00; constant input, cannot fail
            offset: FixedOffset::east_opt(5 * 3600).unwrap(),
        }
    }
}

impl DailyReset {
    pub fn new(hour: u32, offset: FixedOffset) -> Self {
        Self { hour, offset }
    }

    /// Most recent reset boundary at or before `now`.
    pub fn boundary_at_or_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&self.offset);
        let today = local
            .date_naive()
            .and_hms_opt(self.hour.min(23), 0, 0)
            .and_then(|naive| self.offset.from_local_datetime(&naive).single())
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or(now);

        if today > now { today - Duration::days(1) } else { today }
    }

    /// Clears every duplicate counter if no reset has happened since the last
    /// boundary. A store that has never been reset is always due.
    pub async fn reset_if_due(&self, store: &RecordStore, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let boundary = self.boundary_at_or_before(now);
        let fired = store.reset_duplicates_before(boundary, now).await?;
        if fired {
            tracing::info!(%boundary, "daily reset: duplicate counters cleared");
        }
        Ok(fired)
    }
}
