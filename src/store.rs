//! Record store: the live set of submitted addresses.
//!
//! Reads go straight to a `DashMap`. Every mutation takes the writer lock,
//! writes the resulting snapshot to the persistence backend and only then
//! applies the change in memory, so a failed write leaves the store as it was.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::{IpRecord, Outcome};

type StoreResult<T> = std::result::Result<T, StoreError>;

// Where snapshots go
#[derive(Debug, Clone)]
pub enum Persistence {
    Memory,
    JsonFile(PathBuf),
}

// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    last_reset: Option<DateTime<Utc>>,
    records: Vec<IpRecord>,
}

pub struct RecordStore {
    records: DashMap<Ipv4Addr, IpRecord>,
    // writer lock, also guards the last reset timestamp
    writer: Mutex<Option<DateTime<Utc>>>,
    persistence: Persistence,
}

impl RecordStore {
    pub fn in_memory() -> Self {
        Self {
            records: DashMap::new(),
            writer: Mutex::new(None),
            persistence: Persistence::Memory,
        }
    }

    /// Opens a store, loading the snapshot file if one exists.
    pub async fn open(persistence: Persistence) -> StoreResult<Self> {
        let snapshot = match &persistence {
            Persistence::Memory => Snapshot::default(),
            Persistence::JsonFile(path) => load_snapshot(path).await?,
        };

        let records = DashMap::new();
        for record in snapshot.records {
            if records.insert(record.address, record).is_some() {
                tracing::warn!("snapshot lists an address twice, keeping the later entry");
            }
        }

        Ok(Self {
            records,
            writer: Mutex::new(snapshot.last_reset),
            persistence,
        })
    }

    pub fn find(&self, address: Ipv4Addr) -> Option<IpRecord> {
        self.records.get(&address).map(|r| r.value().clone())
    }

    pub fn list_all(&self) -> Vec<IpRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub async fn last_reset(&self) -> Option<DateTime<Utc>> {
        *self.writer.lock().await
    }

    /// Creates a record with a zero counter. Fails if the address is known.
    pub async fn insert(&self, address: Ipv4Addr, now: DateTime<Utc>) -> StoreResult<IpRecord> {
        let last_reset = self.writer.lock().await;
        if self.records.contains_key(&address) {
            return Err(StoreError::AlreadyExists(address));
        }

        let record = IpRecord::new(address, now);
        self.save(*last_reset, |records| records.push(record.clone())).await?;
        self.records.insert(address, record.clone());
        Ok(record)
    }

    /// Bumps the duplicate counter of a known address by one.
    pub async fn increment_duplicate(&self, address: Ipv4Addr) -> StoreResult<u64> {
        let last_reset = self.writer.lock().await;
        let mut record = self.find(address).ok_or(StoreError::NotFound(address))?;
        record.duplicate_count += 1;

        self.save(*last_reset, |records| upsert(records, &record)).await?;
        let count = record.duplicate_count;
        self.records.insert(address, record);
        Ok(count)
    }

    /// Inserts the address, or bumps its counter if it is already known,
    /// as one step under the writer lock.
    pub async fn record_submission(&self, address: Ipv4Addr, now: DateTime<Utc>) -> StoreResult<Outcome> {
        let last_reset = self.writer.lock().await;
        let (record, outcome) = match self.find(address) {
            Some(mut existing) => {
                existing.duplicate_count += 1;
                (existing, Outcome::Duplicate)
            }
            None => (IpRecord::new(address, now), Outcome::Added),
        };

        self.save(*last_reset, |records| upsert(records, &record)).await?;
        self.records.insert(address, record);
        Ok(outcome)
    }

    pub async fn remove(&self, address: Ipv4Addr) -> StoreResult<bool> {
        Ok(self.remove_where(|r| r.address == address).await? == 1)
    }

    /// Deletes every record matching `predicate`, returning how many went.
    pub async fn remove_where<F>(&self, predicate: F) -> StoreResult<usize>
    where
        F: Fn(&IpRecord) -> bool,
    {
        let last_reset = self.writer.lock().await;
        let doomed: Vec<Ipv4Addr> = self
            .records
            .iter()
            .filter(|r| predicate(r.value()))
            .map(|r| *r.key())
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }

        self.save(*last_reset, |records| records.retain(|r| !doomed.contains(&r.address)))
            .await?;
        for address in &doomed {
            self.records.remove(address);
        }
        Ok(doomed.len())
    }

    /// Zeroes all duplicate counters and stamps `last_reset = now`, unless a
    /// reset already happened at or after `boundary`. Returns whether it fired.
    pub async fn reset_duplicates_before(
        &self,
        boundary: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut last_reset = self.writer.lock().await;
        if (*last_reset).is_some_and(|at| at >= boundary) {
            return Ok(false);
        }

        self.save(Some(now), |records| {
            records.iter_mut().for_each(|r| r.duplicate_count = 0)
        })
        .await?;
        self.records.iter_mut().for_each(|mut r| r.duplicate_count = 0);
        *last_reset = Some(now);
        Ok(true)
    }

    // Writes the current records with `edit` applied. Callers hold the writer lock.
    async fn save<F>(&self, last_reset: Option<DateTime<Utc>>, edit: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Vec<IpRecord>),
    {
        let Persistence::JsonFile(path) = &self.persistence else {
            return Ok(());
        };

        let mut records = self.list_all();
        edit(&mut records);
        records.sort_by_key(|r| r.address);
        let snapshot = Snapshot { last_reset, records };

        write_snapshot(path, &snapshot).await?;
        tracing::debug!(records = snapshot.records.len(), path = %path.display(), "snapshot saved");
        Ok(())
    }
}

// Upsert by address inside a snapshot vector
fn upsert(records: &mut Vec<IpRecord>, record: &IpRecord) {
    match records.iter_mut().find(|r| r.address == record.address) {
        Some(slot) => *slot = record.clone(),
        None => records.push(record.clone()),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

async fn load_snapshot(path: &Path) -> StoreResult<Snapshot> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
            tracing::info!(records = snapshot.records.len(), path = %path.display(), "loaded snapshot");
            Ok(snapshot)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no snapshot file yet, starting empty");
            Ok(Snapshot::default())
        }
        Err(e) => Err(io_error(path, e)),
    }
}

// Write to a sibling temp file then rename, so readers never see a torn file
async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(snapshot)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &json).await.map_err(|e| io_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| io_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = RecordStore::in_memory();
        assert!(store.find(ip(1)).is_none());

        let record = store.insert(ip(1), t0()).await.unwrap();
        assert_eq!(record.duplicate_count, 0);
        assert_eq!(store.find(ip(1)), Some(record));
    }

    #[tokio::test]
    async fn insert_refuses_known_address() {
        let store = RecordStore::in_memory();
        store.insert(ip(1), t0()).await.unwrap();
        let err = store.insert(ip(1), t0()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(a) if a == ip(1)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn increment_requires_existing_record() {
        let store = RecordStore::in_memory();
        assert!(matches!(
            store.increment_duplicate(ip(9)).await,
            Err(StoreError::NotFound(_))
        ));

        store.insert(ip(9), t0()).await.unwrap();
        assert_eq!(store.increment_duplicate(ip(9)).await.unwrap(), 1);
        assert_eq!(store.increment_duplicate(ip(9)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn record_submission_adds_then_counts() {
        let store = RecordStore::in_memory();
        assert_eq!(store.record_submission(ip(1), t0()).await.unwrap(), Outcome::Added);
        assert_eq!(store.record_submission(ip(1), t0()).await.unwrap(), Outcome::Duplicate);
        assert_eq!(store.record_submission(ip(1), t0()).await.unwrap(), Outcome::Duplicate);

        let record = store.find(ip(1)).unwrap();
        assert_eq!(record.duplicate_count, 2);
        assert_eq!(record.created_at, t0());
    }

    #[tokio::test]
    async fn concurrent_submissions_lose_nothing() {
        let store = std::sync::Arc::new(RecordStore::in_memory());
        let mut tasks = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.record_submission(ip(7), t0()).await.unwrap()
            }));
        }

        let mut added = 0;
        for task in tasks {
            if task.await.unwrap() == Outcome::Added {
                added += 1;
            }
        }
        assert_eq!(added, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.find(ip(7)).unwrap().duplicate_count, 49);
    }

    #[tokio::test]
    async fn remove_and_remove_where() {
        let store = RecordStore::in_memory();
        for n in 1..=4 {
            store.insert(ip(n), t0() + Duration::hours(i64::from(n))).await.unwrap();
        }

        assert!(store.remove(ip(1)).await.unwrap());
        assert!(!store.remove(ip(1)).await.unwrap());

        let cutoff = t0() + Duration::hours(3);
        assert_eq!(store.remove_where(|r| r.created_at < cutoff).await.unwrap(), 1);
        assert_eq!(store.remove_where(|r| r.created_at < cutoff).await.unwrap(), 0);

        let mut left: Vec<_> = store.list_all().into_iter().map(|r| r.address).collect();
        left.sort();
        assert_eq!(left, vec![ip(3), ip(4)]);
    }

    #[tokio::test]
    async fn reset_fires_once_per_boundary() {
        let store = RecordStore::in_memory();
        store.insert(ip(1), t0()).await.unwrap();
        store.increment_duplicate(ip(1)).await.unwrap();

        let boundary = t0();
        let now = t0() + Duration::minutes(5);
        assert!(store.reset_duplicates_before(boundary, now).await.unwrap());
        assert_eq!(store.find(ip(1)).unwrap().duplicate_count, 0);
        assert_eq!(store.last_reset().await, Some(now));

        store.increment_duplicate(ip(1)).await.unwrap();
        assert!(!store.reset_duplicates_before(boundary, now + Duration::seconds(1)).await.unwrap());
        assert_eq!(store.find(ip(1)).unwrap().duplicate_count, 1);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ips.json");
        let persistence = Persistence::JsonFile(path.clone());

        {
            let store = RecordStore::open(persistence.clone()).await.unwrap();
            store.record_submission(ip(1), t0()).await.unwrap();
            store.record_submission(ip(1), t0()).await.unwrap();
            store.record_submission(ip(2), t0()).await.unwrap();
            store.reset_duplicates_before(t0(), t0()).await.unwrap();
            store.record_submission(ip(2), t0()).await.unwrap();
        }

        let store = RecordStore::open(persistence).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.find(ip(1)).unwrap().duplicate_count, 0);
        assert_eq!(store.find(ip(2)).unwrap().duplicate_count, 1);
        assert_eq!(store.last_reset().await, Some(t0()));

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["records"][0]["ip"], "10.0.0.1");
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(Persistence::JsonFile(dir.path().join("none.json")))
            .await
            .unwrap();
        assert_eq!(store.len(), 0);
        assert_eq!(store.last_reset().await, None);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ips.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            RecordStore::open(Persistence::JsonFile(path)).await,
            Err(StoreError::Serialize(_))
        ));
    }

    #[tokio::test]
    async fn failed_write_leaves_state_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ips.json");
        let store = RecordStore::open(Persistence::JsonFile(path)).await.unwrap();
        // a directory squatting on the temp file name makes every write fail
        std::fs::create_dir(dir.path().join("ips.json.tmp")).unwrap();

        let err = store.record_submission(ip(1), t0()).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.len(), 0);
        assert!(store.reset_duplicates_before(t0(), t0()).await.is_err());
        assert_eq!(store.last_reset().await, None);
    }
}
