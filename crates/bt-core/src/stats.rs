//! Per-day aggregate statistics, cached alongside the activity store.
//!
//! The cache exists so rendering a day never rescans the whole log, but it
//! is never allowed to silently diverge from it: every write path replaces
//! whole-day entries with the output of [`recompute`], the single ground
//! truth. There is no ±1 delta arithmetic anywhere.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};

use crate::activity::{Activity, ActivityKind, ParseError};
use crate::store::ActivityChange;

/// Cache schema version.
///
/// Bump whenever day-boundary semantics change so persisted entries from
/// older installs are rebuilt instead of trusted. Version 2 entries were
/// keyed off UTC-parsed dates and must never be read back.
pub const STATS_VERSION: u32 = 3;

/// A local calendar day, used as the cache key.
///
/// Built from explicit local date fields, never from a UTC round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey {
    year: i32,
    month: u32,
    day: u32,
}

impl DayKey {
    /// The local calendar day a timestamp falls on.
    #[must_use]
    pub fn of(at: DateTime<Local>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
            day: at.day(),
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl std::str::FromStr for DayKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidDayKey {
            value: s.to_string(),
        };
        let mut parts = s.splitn(3, '-');
        let year = parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let month = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let day = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(invalid());
        }
        Ok(Self { year, month, day })
    }
}

impl TryFrom<String> for DayKey {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}

/// Aggregates for one local day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: DayKey,
    /// Feedings started that day, ongoing ones included.
    pub feedings: u32,
    /// Diaper changes that day.
    pub diapers: u32,
    /// Total completed sleep in milliseconds; an ongoing sleep contributes
    /// nothing until it is stopped.
    #[serde(rename = "sleepDuration")]
    pub sleep_ms: i64,
    pub last_updated: DateTime<Local>,
}

/// Ground-truth aggregation for one day.
///
/// Every cached entry is the output of this function; the incremental
/// paths below only decide *which* days to recompute.
#[must_use]
pub fn recompute(activities: &[Activity], date: DayKey, now: DateTime<Local>) -> DailyStats {
    let mut stats = DailyStats {
        date,
        feedings: 0,
        diapers: 0,
        sleep_ms: 0,
        last_updated: now,
    };
    for activity in activities
        .iter()
        .filter(|a| DayKey::of(a.start_time) == date)
    {
        match activity.kind {
            ActivityKind::Feeding => stats.feedings += 1,
            ActivityKind::Diaper => stats.diapers += 1,
            ActivityKind::Sleep => {
                if let Some(ms) = activity.duration_ms() {
                    stats.sleep_ms += ms;
                }
            }
        }
    }
    stats
}

/// Cached per-day aggregates with an embedded version marker.
///
/// Persisted as a single JSON object: day entries keyed `YYYY-MM-DD` plus a
/// `_version` field in the same object, used to detect and rebuild stale
/// snapshots on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsCache {
    #[serde(rename = "_version", default)]
    version: u32,
    #[serde(flatten)]
    days: BTreeMap<DayKey, DailyStats>,
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsCache {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            version: STATS_VERSION,
            days: BTreeMap::new(),
        }
    }

    /// Whether a persisted snapshot can be trusted as-is.
    #[must_use]
    pub const fn is_current(&self) -> bool {
        self.version >= STATS_VERSION
    }

    #[must_use]
    pub fn get(&self, date: DayKey) -> Option<&DailyStats> {
        self.days.get(&date)
    }

    /// Day keys currently cached, in order.
    pub fn days(&self) -> impl Iterator<Item = DayKey> + '_ {
        self.days.keys().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Cached entry, or a fresh computation when absent.
    ///
    /// Reads never populate the cache; filling it is the write paths' job.
    #[must_use]
    pub fn get_or_compute(
        &self,
        date: DayKey,
        activities: &[Activity],
        now: DateTime<Local>,
    ) -> DailyStats {
        self.days
            .get(&date)
            .cloned()
            .unwrap_or_else(|| recompute(activities, date, now))
    }

    /// Applies one store mutation to the cache.
    pub fn apply(&mut self, change: &ActivityChange, activities: &[Activity], now: DateTime<Local>) {
        match (&change.before, &change.after) {
            (before, Some(after)) => self.apply_change(before.as_ref(), after, activities, now),
            (Some(before), None) => self.apply_removal(before, activities, now),
            (None, None) => {}
        }
    }

    /// Refreshes the day(s) touched by a created or edited activity: the
    /// new day, and the old day when an edit moved the record across a
    /// midnight boundary.
    pub fn apply_change(
        &mut self,
        before: Option<&Activity>,
        after: &Activity,
        activities: &[Activity],
        now: DateTime<Local>,
    ) {
        let new_day = DayKey::of(after.start_time);
        self.refresh(new_day, activities, now);
        if let Some(previous) = before {
            let old_day = DayKey::of(previous.start_time);
            if old_day != new_day {
                self.refresh(old_day, activities, now);
            }
        }
    }

    /// Refreshes the removed activity's day against the remaining list,
    /// dropping the entry entirely when the day has emptied rather than
    /// caching zeros.
    pub fn apply_removal(
        &mut self,
        removed: &Activity,
        remaining: &[Activity],
        now: DateTime<Local>,
    ) {
        let date = DayKey::of(removed.start_time);
        if remaining
            .iter()
            .any(|a| DayKey::of(a.start_time) == date)
        {
            self.days.insert(date, recompute(remaining, date, now));
        } else {
            self.days.remove(&date);
        }
    }

    /// Replaces one day's entry from the authoritative list.
    pub fn refresh(&mut self, date: DayKey, activities: &[Activity], now: DateTime<Local>) {
        self.days.insert(date, recompute(activities, date, now));
    }

    /// Discards everything and recomputes one entry per distinct day.
    pub fn rebuild(&mut self, activities: &[Activity], now: DateTime<Local>) {
        tracing::debug!(activity_count = activities.len(), "rebuilding stats cache");
        self.days.clear();
        self.version = STATS_VERSION;
        let dates: BTreeSet<DayKey> = activities.iter().map(|a| DayKey::of(a.start_time)).collect();
        for date in dates {
            self.days.insert(date, recompute(activities, date, now));
        }
    }
}
