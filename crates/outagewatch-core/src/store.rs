//! Time-bucketed, retention-bounded history of affected-customer counts.
//!
//! Architecture:
//! 1. Every raw sample is floored to its bucket boundary
//! 2. One bucket per boundary, last write wins
//! 3. Buckets are kept sorted by binary-search insertion
//! 4. Buckets older than the retention window are pruned
//! 5. The whole collection is rewritten to a JSON file after each accepted sample
//!
//! # Storage Format
//!
//! ```json
//! {
//!   "dataPoints": [
//!     { "timestamp": "2026-03-14T10:00:00Z", "numPeople": 1520 }
//!   ]
//! }
//! ```
//!
//! A missing, truncated or otherwise unreadable file loads as empty history.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::bucket::{BucketInterval, bucket};
use crate::error::StoreError;

/// One persisted, interval-aligned sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "numPeople")]
    pub value: i64,
}

/// A sample as observed, before bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub value: i64,
}

impl RawSample {
    pub fn new(timestamp: DateTime<Utc>, value: i64) -> Self {
        Self { timestamp, value }
    }
}

/// How wide buckets are and how long they are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub interval: BucketInterval,
    pub retention: TimeDelta,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            interval: BucketInterval::TEN_MINUTES,
            retention: TimeDelta::days(10),
        }
    }
}

/// What an ingest did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Inserted,
    Replaced,
}

#[derive(Deserialize)]
struct HistoryFile {
    #[serde(rename = "dataPoints")]
    data_points: Vec<Bucket>,
}

#[derive(Serialize)]
struct HistoryFileRef<'a> {
    #[serde(rename = "dataPoints")]
    data_points: &'a [Bucket],
}

/// Ordered, deduplicated bucket history.
///
/// Invariant: `buckets` is strictly ascending by timestamp.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    buckets: Vec<Bucket>,
    policy: RetentionPolicy,
    /// Boundary of the newest accepted sample. Only moves forward.
    last_accepted: Option<DateTime<Utc>>,
}

impl SeriesStore {
    /// Create an empty store.
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            buckets: Vec::new(),
            policy,
            last_accepted: None,
        }
    }

    /// Load history from `path`, falling back to an empty store.
    ///
    /// Loaded entries are re-bucketed, deduplicated and pruned against `now`.
    pub fn load(path: &Path, policy: RetentionPolicy, now: DateTime<Utc>) -> Self {
        let mut store = Self::new(policy);

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                log::debug!("no history at {}: {e}", path.display());
                return store;
            }
        };

        let file: HistoryFile = match serde_json::from_slice(&data) {
            Ok(file) => file,
            Err(e) => {
                log::warn!(
                    "ignoring unreadable history at {}: {e}",
                    path.display()
                );
                return store;
            }
        };

        for point in file.data_points {
            store.ingest(RawSample::new(point.timestamp, point.value));
        }
        store.prune(now);
        store.last_accepted = store.buckets.last().map(|b| b.timestamp);
        store
    }

    /// Insert or overwrite the bucket containing `sample`.
    pub fn ingest(&mut self, sample: RawSample) -> Ingested {
        let boundary = bucket(&sample.timestamp, self.policy.interval);
        let entry = Bucket {
            timestamp: boundary,
            value: sample.value,
        };

        match self
            .buckets
            .binary_search_by_key(&boundary, |b| b.timestamp)
        {
            Ok(i) => {
                self.buckets[i] = entry;
                Ingested::Replaced
            }
            Err(i) => {
                self.buckets.insert(i, entry);
                Ingested::Inserted
            }
        }
    }

    /// Drop every bucket strictly older than `now - retention`.
    /// Returns how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.policy.retention;
        let stale = self.buckets.partition_point(|b| b.timestamp < cutoff);
        self.buckets.drain(..stale);
        stale
    }

    /// Ingest a freshly fetched sample unless it falls before the last
    /// accepted boundary, then prune.
    ///
    /// Returns `None` when the sample was rejected. Callers persist on `Some`.
    pub fn accept(&mut self, sample: RawSample, now: DateTime<Utc>) -> Option<Ingested> {
        let boundary = bucket(&sample.timestamp, self.policy.interval);
        if self.last_accepted.is_some_and(|last| boundary < last) {
            return None;
        }

        let outcome = self.ingest(sample);
        self.last_accepted = Some(boundary);
        self.prune(now);
        Some(outcome)
    }

    /// Rewrite the history file with the full current collection.
    ///
    /// The JSON is written to a temporary file in the same directory and
    /// renamed over `path`.
    pub fn persist(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&HistoryFileRef {
            data_points: &self.buckets,
        })?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path)?;
        Ok(())
    }

    /// Ordered view of the current buckets.
    pub fn snapshot(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn latest(&self) -> Option<&Bucket> {
        self.buckets.last()
    }

    pub fn last_accepted(&self) -> Option<DateTime<Utc>> {
        self.last_accepted
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
    }

    fn sample(ts: DateTime<Utc>, value: i64) -> RawSample {
        RawSample::new(ts, value)
    }

    fn assert_strictly_ascending(store: &SeriesStore) {
        for pair in store.snapshot().windows(2) {
            assert!(
                pair[0].timestamp < pair[1].timestamp,
                "{} !< {}",
                pair[0].timestamp,
                pair[1].timestamp
            );
        }
    }

    // -----------------------------------------------------------------------
    // Ingest
    // -----------------------------------------------------------------------

    #[test]
    fn test_same_interval_last_write_wins() {
        let mut store = SeriesStore::new(RetentionPolicy::default());
        assert_eq!(store.ingest(sample(at(14, 10, 3), 5)), Ingested::Inserted);
        assert_eq!(store.ingest(sample(at(14, 10, 7), 9)), Ingested::Replaced);

        assert_eq!(
            store.snapshot(),
            &[Bucket {
                timestamp: at(14, 10, 0),
                value: 9
            }]
        );
    }

    #[test]
    fn test_out_of_order_ingest_stays_sorted() {
        let mut store = SeriesStore::new(RetentionPolicy::default());
        let base = at(14, 0, 0);
        // Deterministic scramble of 200 minute offsets over ~33 hours.
        let mut x: u64 = 0x2545_f491;
        for i in 0..200 {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let minutes = (x >> 33) % 2000;
            store.ingest(sample(base + TimeDelta::minutes(minutes as i64), i));
        }

        assert_strictly_ascending(&store);
        for b in store.snapshot() {
            assert_eq!(bucket(&b.timestamp, BucketInterval::TEN_MINUTES), b.timestamp);
        }
    }

    #[test]
    fn test_ingest_then_prune_keeps_invariant() {
        let mut store = SeriesStore::new(RetentionPolicy {
            interval: BucketInterval::from_minutes(15),
            retention: TimeDelta::hours(6),
        });
        for i in (0..48).rev() {
            store.ingest(sample(at(14, 0, 0) + TimeDelta::minutes(i * 20), i));
            if i % 5 == 0 {
                store.prune(at(14, 12, 0));
            }
            assert_strictly_ascending(&store);
        }
    }

    // -----------------------------------------------------------------------
    // Prune
    // -----------------------------------------------------------------------

    #[test]
    fn test_prune_retention_days() {
        let now = at(20, 12, 0);
        let mut store = SeriesStore::new(RetentionPolicy::default());
        store.ingest(sample(now - TimeDelta::days(11), 1));
        store.ingest(sample(now - TimeDelta::days(9), 2));

        assert_eq!(store.prune(now), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].value, 2);
    }

    #[test]
    fn test_prune_cutoff_is_inclusive() {
        let now = at(20, 12, 0);
        let mut store = SeriesStore::new(RetentionPolicy::default());
        let cutoff = now - TimeDelta::days(10);
        store.ingest(sample(cutoff - TimeDelta::minutes(10), 1));
        store.ingest(sample(cutoff, 2));
        store.ingest(sample(cutoff + TimeDelta::minutes(10), 3));

        store.prune(now);
        let kept: Vec<i64> = store.snapshot().iter().map(|b| b.value).collect();
        assert_eq!(kept, vec![2, 3]);
        assert!(store.snapshot().iter().all(|b| b.timestamp >= cutoff));
    }

    #[test]
    fn test_prune_empty_store() {
        let mut store = SeriesStore::new(RetentionPolicy::default());
        assert_eq!(store.prune(at(1, 0, 0)), 0);
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // Accept
    // -----------------------------------------------------------------------

    #[test]
    fn test_accept_rejects_earlier_boundary() {
        let mut store = SeriesStore::new(RetentionPolicy::default());
        let now = at(14, 10, 5);
        assert_eq!(store.accept(sample(at(14, 10, 5), 4), now), Some(Ingested::Inserted));
        assert_eq!(store.accept(sample(at(14, 9, 55), 8), now), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.latest().unwrap().value, 4);
    }

    #[test]
    fn test_accept_same_boundary_overwrites() {
        let mut store = SeriesStore::new(RetentionPolicy::default());
        let now = at(14, 10, 9);
        store.accept(sample(at(14, 10, 1), 4), now);
        assert_eq!(store.accept(sample(at(14, 10, 9), 6), now), Some(Ingested::Replaced));
        assert_eq!(store.latest().unwrap().value, 6);
        assert_eq!(store.last_accepted(), Some(at(14, 10, 0)));
    }

    #[test]
    fn test_last_accepted_survives_full_prune() {
        let mut store = SeriesStore::new(RetentionPolicy {
            interval: BucketInterval::TEN_MINUTES,
            retention: TimeDelta::minutes(30),
        });
        store.accept(sample(at(14, 10, 0), 1), at(14, 10, 0));
        // A much later "now" prunes the sample it just accepted.
        store.accept(sample(at(14, 10, 0), 2), at(15, 10, 0));
        assert!(store.is_empty());
        assert_eq!(store.last_accepted(), Some(at(14, 10, 0)));

        // An older sample is still rejected even though history is empty.
        assert_eq!(store.accept(sample(at(14, 9, 0), 3), at(15, 10, 0)), None);
    }

    // -----------------------------------------------------------------------
    // Load / persist
    // -----------------------------------------------------------------------

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SeriesStore::load(
            &tmp.path().join("absent.json"),
            RetentionPolicy::default(),
            at(14, 0, 0),
        );
        assert!(store.is_empty());
        assert_eq!(store.last_accepted(), None);
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        for garbage in ["", "not json", "{\"dataPoints\": [{\"timestamp\": 3}]}", "{\"dataPo"] {
            fs::write(&path, garbage).unwrap();
            let store = SeriesStore::load(&path, RetentionPolicy::default(), at(14, 0, 0));
            assert!(store.is_empty(), "expected empty store for {garbage:?}");
        }
    }

    #[test]
    fn test_persist_then_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        let now = at(14, 12, 0);

        let mut store = SeriesStore::new(RetentionPolicy::default());
        for (i, m) in [0, 10, 20, 50].into_iter().enumerate() {
            store.ingest(sample(at(14, 11, m), i as i64 * 100));
        }
        store.persist(&path).unwrap();

        let loaded = SeriesStore::load(&path, RetentionPolicy::default(), now);
        assert_eq!(loaded.snapshot(), store.snapshot());
        assert_eq!(loaded.last_accepted(), Some(at(14, 11, 50)));
    }

    #[test]
    fn test_persist_file_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("history.json");

        let mut store = SeriesStore::new(RetentionPolicy::default());
        store.ingest(sample(at(14, 10, 4), 42));
        store.persist(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let points = value["dataPoints"].as_array().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0]["numPeople"], 42);
        assert_eq!(points[0]["timestamp"], "2026-03-14T10:00:00Z");
    }

    #[test]
    fn test_load_normalizes_foreign_history() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        // Unaligned, duplicated, unsorted, offset timestamps and one stale entry.
        fs::write(
            &path,
            r#"{"dataPoints":[
                {"timestamp":"2026-03-14T05:17:00-05:00","numPeople":7},
                {"timestamp":"2026-03-14T10:03:12Z","numPeople":3},
                {"timestamp":"2026-03-14T10:12:00Z","numPeople":4},
                {"timestamp":"2026-01-01T00:00:00Z","numPeople":99}
            ]}"#,
        )
        .unwrap();

        let store = SeriesStore::load(&path, RetentionPolicy::default(), at(14, 12, 0));
        assert_eq!(
            store.snapshot(),
            &[
                Bucket {
                    timestamp: at(14, 10, 0),
                    value: 3
                },
                Bucket {
                    timestamp: at(14, 10, 10),
                    value: 4
                },
            ]
        );
    }
}
