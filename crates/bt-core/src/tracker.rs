//! The lifecycle engine: sequences store mutations and cache updates.
//!
//! Every user action runs as an explicit two-step transaction: the store
//! mutates and reports what changed, then the statistics cache replays
//! those changes against the authoritative list. Nothing about the cache
//! hides inside store setters, and both steps finish before the operation
//! returns.

use chrono::{DateTime, Local};

use crate::activity::{Activity, ActivityId, ActivityKind};
use crate::edit::EditSession;
use crate::stats::{DailyStats, DayKey, StatsCache};
use crate::store::{ActivityChange, ActivityStore, PendingDeletion, Subtype};

/// Owns the activity store and the statistics cache and keeps them
/// consistent across the whole operation surface.
#[derive(Debug, Clone, Default)]
pub struct Tracker {
    store: ActivityStore,
    stats: StatsCache,
}

impl Tracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a tracker from persisted state.
    ///
    /// A missing or stale statistics snapshot is discarded and rebuilt
    /// wholesale from the activity list, one entry per distinct day.
    #[must_use]
    pub fn from_parts(
        store: ActivityStore,
        stats: Option<StatsCache>,
        now: DateTime<Local>,
    ) -> Self {
        let stats = match stats {
            Some(cache) if cache.is_current() => cache,
            stale => {
                if stale.is_some() {
                    tracing::warn!("stale stats cache version, rebuilding");
                }
                let mut cache = StatsCache::new();
                cache.rebuild(store.activities(), now);
                cache
            }
        };
        Self { store, stats }
    }

    // ========== Read views ==========

    #[must_use]
    pub fn activities(&self) -> &[Activity] {
        self.store.activities()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Activity> {
        self.store.current()
    }

    #[must_use]
    pub fn find(&self, id: ActivityId) -> Option<&Activity> {
        self.store.find(id)
    }

    #[must_use]
    pub const fn store(&self) -> &ActivityStore {
        &self.store
    }

    #[must_use]
    pub const fn stats(&self) -> &StatsCache {
        &self.stats
    }

    #[must_use]
    pub fn pending_deletion(&self, now: DateTime<Local>) -> Option<&PendingDeletion> {
        self.store.pending_deletion(now)
    }

    #[must_use]
    pub fn most_recent_resumable(&self) -> Option<&Activity> {
        self.store.most_recent_resumable()
    }

    /// Stats for one day: the cached entry, or a fallback computation.
    /// Never mutates the cache.
    #[must_use]
    pub fn stats_for(&self, date: DayKey, now: DateTime<Local>) -> DailyStats {
        self.stats.get_or_compute(date, self.store.activities(), now)
    }

    // ========== Lifecycle operations ==========

    pub fn start(&mut self, kind: ActivityKind, subtype: Option<Subtype>) -> ActivityId {
        self.start_at(kind, subtype, Local::now())
    }

    pub fn start_at(
        &mut self,
        kind: ActivityKind,
        subtype: Option<Subtype>,
        now: DateTime<Local>,
    ) -> ActivityId {
        let (id, changes) = self.store.start_at(kind, subtype, now);
        self.apply_changes(&changes, now);
        id
    }

    pub fn quick_add(&mut self, kind: ActivityKind, subtype: Option<Subtype>) -> ActivityId {
        self.quick_add_at(kind, subtype, Local::now())
    }

    pub fn quick_add_at(
        &mut self,
        kind: ActivityKind,
        subtype: Option<Subtype>,
        now: DateTime<Local>,
    ) -> ActivityId {
        let (id, changes) = self.store.quick_add_at(kind, subtype, now);
        self.apply_changes(&changes, now);
        id
    }

    /// Stops the running activity. Returns its id, or `None` when nothing
    /// was running.
    pub fn stop(&mut self) -> Option<ActivityId> {
        self.stop_at(Local::now())
    }

    pub fn stop_at(&mut self, now: DateTime<Local>) -> Option<ActivityId> {
        let change = self.store.stop_at(now)?;
        let id = change.after.as_ref().map(|a| a.id);
        self.apply_changes(std::slice::from_ref(&change), now);
        id
    }

    /// Reopens a completed feeding or sleep. Returns whether anything
    /// happened; ineligible or unknown ids are silent no-ops.
    pub fn resume(&mut self, id: ActivityId) -> bool {
        self.resume_at(id, Local::now())
    }

    pub fn resume_at(&mut self, id: ActivityId, now: DateTime<Local>) -> bool {
        let Some(changes) = self.store.resume_at(id, now) else {
            return false;
        };
        self.apply_changes(&changes, now);
        true
    }

    /// Soft-deletes a completed activity. Returns whether it was deleted.
    pub fn delete(&mut self, id: ActivityId) -> bool {
        self.delete_at(id, Local::now())
    }

    pub fn delete_at(&mut self, id: ActivityId, now: DateTime<Local>) -> bool {
        let Some(change) = self.store.delete_at(id, now) else {
            return false;
        };
        self.apply_changes(std::slice::from_ref(&change), now);
        true
    }

    /// Restores the pending deletion while its window is open. Returns the
    /// restored id, or `None` when there was nothing to undo.
    pub fn undo_delete(&mut self) -> Option<ActivityId> {
        self.undo_delete_at(Local::now())
    }

    pub fn undo_delete_at(&mut self, now: DateTime<Local>) -> Option<ActivityId> {
        let change = self.store.undo_delete_at(now)?;
        let id = change.after.as_ref().map(|a| a.id);
        self.apply_changes(std::slice::from_ref(&change), now);
        id
    }

    /// Merges imported records (additive, deduplicated by id) and brings
    /// every day they touch back in sync. Returns how many were added.
    pub fn import_merge(&mut self, imported: Vec<Activity>) -> usize {
        self.import_merge_at(imported, Local::now())
    }

    pub fn import_merge_at(&mut self, imported: Vec<Activity>, now: DateTime<Local>) -> usize {
        let added = self.store.import_merge(imported);
        let days: std::collections::BTreeSet<DayKey> =
            added.iter().map(|a| DayKey::of(a.start_time)).collect();
        for date in days {
            self.stats.refresh(date, self.store.activities(), now);
        }
        added.len()
    }

    // ========== Edit sessions ==========

    /// Opens an edit session over a snapshot of the activity. `None` when
    /// the id is no longer in the store.
    #[must_use]
    pub fn begin_edit(&self, id: ActivityId) -> Option<EditSession> {
        self.store.find(id).cloned().map(EditSession::new)
    }

    /// Commits an edit session. Returns whether anything was written.
    ///
    /// For each field touched this session whose permanent audit slot is
    /// still unset, the pre-edit value is captured first (only when that
    /// value is present; there is nothing to audit about an empty field).
    /// Then the draft replaces the store record, the list re-sorts, and the
    /// cache refreshes the affected day(s).
    pub fn commit_edit(&mut self, session: EditSession) -> bool {
        self.commit_edit_at(session, Local::now())
    }

    pub fn commit_edit_at(&mut self, session: EditSession, now: DateTime<Local>) -> bool {
        if !session.is_dirty() {
            return false;
        }
        let Some(before) = self.store.find(session.id()).cloned() else {
            return false;
        };

        let baselines = session.baselines().clone();
        let mut record = session.into_draft();

        let original = &mut record.original;
        if baselines.start_time.is_some() && original.start_time.is_none() {
            original.start_time = Some(before.start_time);
        }
        if baselines.end_time.is_some() && original.end_time.is_none() {
            original.end_time = before.end_time;
        }
        if baselines.feeding_side.is_some() && original.feeding_side.is_none() {
            original.feeding_side = before.feeding_side;
        }
        if baselines.diaper_kind.is_some() && original.diaper_kind.is_none() {
            original.diaper_kind = before.diaper_kind;
        }
        if baselines.notes.is_some() && original.notes.is_none() {
            original.notes = before.notes.clone();
        }

        let Some(change) = self.store.apply_edit(&record) else {
            return false;
        };
        self.apply_changes(std::slice::from_ref(&change), now);
        true
    }

    fn apply_changes(&mut self, changes: &[ActivityChange], now: DateTime<Local>) {
        for change in changes {
            self.stats.apply(change, self.store.activities(), now);
        }
    }
}
