//! Storage layer for the baby activity tracker.
//!
//! Persists tracker state in a single `SQLite` database holding one
//! key-value table with JSON-serialized values, mirroring the browser
//! `localStorage` layout the snapshot format originated from.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`: an instance can be moved between threads but not shared without
//! external synchronization. The tracker model is single-writer, so this
//! never comes up in practice.
//!
//! # Keys
//!
//! - `activities`: JSON array of activity records
//! - `current_activity`: the single open-ended record; the row is deleted
//!   when nothing is running, so a missing key means "no current activity"
//! - `daily_stats`: per-day aggregates keyed `YYYY-MM-DD`, with the cache
//!   version embedded as a `_version` field of the same object
//! - `pending_deletion`: the undo tombstone and its deadline; dropped at
//!   load once the deadline has passed
//!
//! Timestamps inside the JSON are ISO 8601 with the local UTC offset, as
//! produced by `chrono::DateTime<Local>` serialization.

use std::path::Path;

use chrono::{DateTime, Local};
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use bt_core::{Activity, ActivityStore, PendingDeletion, StatsCache, Tracker};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A persisted value failed to decode.
    #[error("corrupt value for key {key}: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A value failed to encode (should never happen for tracker state).
    #[error("failed to encode value for key {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

const KEY_ACTIVITIES: &str = "activities";
const KEY_CURRENT: &str = "current_activity";
const KEY_STATS: &str = "daily_stats";
const KEY_PENDING: &str = "pending_deletion";

/// Database connection wrapper.
///
/// See the [module documentation](self) for the key layout.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Loads the persisted tracker state as of `now`.
    ///
    /// An expired pending deletion is discarded here (restarting the
    /// process cannot reopen its undo window). A corrupt or stale stats
    /// snapshot is dropped and rebuilt from the activity list; corrupt
    /// activity data is an error, since guessing would lose records.
    pub fn load_tracker(&self, now: DateTime<Local>) -> Result<Tracker, DbError> {
        let activities: Vec<Activity> = self.get_json(KEY_ACTIVITIES)?.unwrap_or_default();
        let current: Option<Activity> = self.get_json(KEY_CURRENT)?;
        let pending: Option<PendingDeletion> = self
            .get_json_lenient(KEY_PENDING)
            .filter(|p: &PendingDeletion| now < p.expires_at);
        let stats: Option<StatsCache> = self.get_json_lenient(KEY_STATS);

        let store = ActivityStore::from_parts(activities, current, pending);
        Ok(Tracker::from_parts(store, stats, now))
    }

    /// Persists the full tracker state in one transaction.
    pub fn save_tracker(&mut self, tracker: &Tracker, now: DateTime<Local>) -> Result<(), DbError> {
        let activities = encode(KEY_ACTIVITIES, &tracker.activities())?;
        let current = tracker
            .current()
            .map(|a| encode(KEY_CURRENT, a))
            .transpose()?;
        let pending = tracker
            .pending_deletion(now)
            .map(|p| encode(KEY_PENDING, p))
            .transpose()?;
        let stats = encode(KEY_STATS, tracker.stats())?;

        let tx = self.conn.transaction()?;
        upsert(&tx, KEY_ACTIVITIES, &activities)?;
        upsert_or_delete(&tx, KEY_CURRENT, current.as_deref())?;
        upsert_or_delete(&tx, KEY_PENDING, pending.as_deref())?;
        upsert(&tx, KEY_STATS, &stats)?;
        tx.commit()?;

        tracing::debug!(activity_count = tracker.activities().len(), "saved tracker state");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, DbError> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| DbError::Corrupt { key, source }),
            None => Ok(None),
        }
    }

    /// Like [`Self::get_json`], but treats corrupt values as absent.
    /// Only used for state that can be rebuilt or safely dropped.
    fn get_json_lenient<T: DeserializeOwned>(&self, key: &'static str) -> Option<T> {
        match self.get_json(key) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(key, %error, "discarding unreadable value");
                None
            }
        }
    }
}

fn encode<T: Serialize>(key: &'static str, value: &T) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|source| DbError::Encode { key, source })
}

fn upsert(tx: &rusqlite::Transaction<'_>, key: &str, value: &str) -> Result<(), DbError> {
    tx.execute(
        "
        INSERT INTO kv (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        ",
        params![key, value],
    )?;
    Ok(())
}

fn upsert_or_delete(
    tx: &rusqlite::Transaction<'_>,
    key: &str,
    value: Option<&str>,
) -> Result<(), DbError> {
    match value {
        Some(value) => upsert(tx, key, value),
        None => {
            tx.execute("DELETE FROM kv WHERE key = ?", params![key])?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use bt_core::{ActivityKind, DayKey, DiaperKind, FeedingSide, Subtype};

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 5, h, m, 0).unwrap()
    }

    fn raw_put(db: &Database, key: &str, value: &str) {
        db.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .unwrap();
    }

    fn raw_get(db: &Database, key: &str) -> Option<String> {
        db.get(key).unwrap()
    }

    #[test]
    fn round_trip_preserves_tracker_state() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bt.db");

        let mut tracker = Tracker::new();
        tracker.quick_add_at(
            ActivityKind::Diaper,
            Some(Subtype::Diaper(DiaperKind::Pee)),
            at(8, 0),
        );
        let feeding = tracker.start_at(
            ActivityKind::Feeding,
            Some(Subtype::Feeding(FeedingSide::Left)),
            at(9, 0),
        );

        {
            let mut db = Database::open(&path).unwrap();
            db.save_tracker(&tracker, at(9, 5)).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let loaded = db.load_tracker(at(9, 10)).unwrap();

        assert_eq!(loaded.activities(), tracker.activities());
        assert_eq!(loaded.current().unwrap().id, feeding);
        assert_eq!(
            loaded.stats().get(DayKey::of(at(8, 0))).unwrap(),
            tracker.stats().get(DayKey::of(at(8, 0))).unwrap()
        );
    }

    #[test]
    fn current_key_is_removed_when_nothing_is_running() {
        let mut db = Database::open_in_memory().unwrap();

        let mut tracker = Tracker::new();
        tracker.start_at(ActivityKind::Sleep, None, at(8, 0));
        db.save_tracker(&tracker, at(8, 5)).unwrap();
        assert!(raw_get(&db, KEY_CURRENT).is_some());

        tracker.stop_at(at(9, 0));
        db.save_tracker(&tracker, at(9, 0)).unwrap();
        assert!(raw_get(&db, KEY_CURRENT).is_none());
    }

    #[test]
    fn pending_deletion_survives_within_its_window() {
        let mut db = Database::open_in_memory().unwrap();

        let mut tracker = Tracker::new();
        let id = tracker.quick_add_at(ActivityKind::Diaper, None, at(8, 0));
        let deleted_at = at(9, 0);
        assert!(tracker.delete_at(id, deleted_at));
        db.save_tracker(&tracker, deleted_at).unwrap();

        let loaded = db.load_tracker(deleted_at + Duration::seconds(2)).unwrap();
        assert!(loaded.pending_deletion(deleted_at + Duration::seconds(2)).is_some());

        let expired = db.load_tracker(deleted_at + Duration::seconds(10)).unwrap();
        assert!(expired
            .pending_deletion(deleted_at + Duration::seconds(10))
            .is_none());
    }

    #[test]
    fn stale_stats_version_triggers_rebuild_on_load() {
        let mut db = Database::open_in_memory().unwrap();

        let mut tracker = Tracker::new();
        tracker.quick_add_at(
            ActivityKind::Diaper,
            Some(Subtype::Diaper(DiaperKind::Both)),
            at(8, 0),
        );
        db.save_tracker(&tracker, at(8, 5)).unwrap();

        // simulate a snapshot written by an older install
        raw_put(&db, KEY_STATS, r#"{"_version": 2}"#);

        let loaded = db.load_tracker(at(9, 0)).unwrap();
        assert!(loaded.stats().is_current());
        assert_eq!(loaded.stats().get(DayKey::of(at(8, 0))).unwrap().diapers, 1);
    }

    #[test]
    fn corrupt_stats_are_dropped_and_rebuilt() {
        let mut db = Database::open_in_memory().unwrap();

        let mut tracker = Tracker::new();
        tracker.quick_add_at(ActivityKind::Diaper, None, at(8, 0));
        db.save_tracker(&tracker, at(8, 5)).unwrap();
        raw_put(&db, KEY_STATS, "{definitely not json");

        let loaded = db.load_tracker(at(9, 0)).unwrap();
        assert_eq!(loaded.stats().get(DayKey::of(at(8, 0))).unwrap().diapers, 1);
    }

    #[test]
    fn corrupt_activities_are_an_error() {
        let db = Database::open_in_memory().unwrap();
        raw_put(&db, KEY_ACTIVITIES, "[{broken");

        let result = db.load_tracker(at(9, 0));
        assert!(matches!(
            result.unwrap_err(),
            DbError::Corrupt {
                key: "activities",
                ..
            }
        ));
    }

    #[test]
    fn empty_database_loads_an_empty_tracker() {
        let db = Database::open_in_memory().unwrap();
        let tracker = db.load_tracker(at(9, 0)).unwrap();

        assert!(tracker.activities().is_empty());
        assert!(tracker.current().is_none());
        assert!(tracker.stats().is_current());
    }

    #[test]
    fn open_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bt.db");

        drop(Database::open(&path).unwrap());
        let db = Database::open(&path).unwrap();
        assert!(db.load_tracker(at(9, 0)).unwrap().activities().is_empty());
    }
}
