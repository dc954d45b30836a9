//! The ordered activity list and its lifecycle mutations.
//!
//! The store guarantees two invariants after every mutation:
//! - the list is sorted by start time descending (ties broken by id, so
//!   creation order wins when two records share a timestamp)
//! - at most one activity is open-ended, and it is the one the current
//!   pointer references
//!
//! Mutations return [`ActivityChange`] records describing exactly what
//! happened, so the statistics cache can be updated as an explicit second
//! step instead of a side effect buried inside the store.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

use crate::activity::{Activity, ActivityId, ActivityKind, AuditSnapshot, DiaperKind, FeedingSide};

/// How long a deleted activity can still be brought back, in milliseconds.
pub const UNDO_WINDOW_MS: i64 = 5_000;

/// Kind-specific detail supplied when logging an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subtype {
    Feeding(FeedingSide),
    Diaper(DiaperKind),
}

/// A soft-deleted activity awaiting either undo or expiry.
///
/// At most one exists at a time; a new deletion discards the previous one
/// for good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDeletion {
    pub activity: Activity,
    pub expires_at: DateTime<Local>,
}

/// Before/after images of one record mutation.
///
/// `before == None` is a creation, `after == None` a removal, both present
/// an in-place update. This is everything the statistics cache needs to
/// decide which days to recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityChange {
    pub before: Option<Activity>,
    pub after: Option<Activity>,
}

impl ActivityChange {
    fn created(after: Activity) -> Self {
        Self {
            before: None,
            after: Some(after),
        }
    }

    fn updated(before: Activity, after: Activity) -> Self {
        Self {
            before: Some(before),
            after: Some(after),
        }
    }

    fn removed(before: Activity) -> Self {
        Self {
            before: Some(before),
            after: None,
        }
    }
}

/// In-memory activity log with the current-activity pointer and the
/// single-slot undo buffer.
#[derive(Debug, Clone, Default)]
pub struct ActivityStore {
    activities: Vec<Activity>,
    current_id: Option<ActivityId>,
    pending: Option<PendingDeletion>,
}

impl ActivityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted parts, repairing the sort order and
    /// the current pointer.
    #[must_use]
    pub fn from_parts(
        mut activities: Vec<Activity>,
        current: Option<Activity>,
        pending: Option<PendingDeletion>,
    ) -> Self {
        if let Some(ref record) = current {
            if !activities.iter().any(|a| a.id == record.id) {
                activities.push(record.clone());
            }
        }
        let mut store = Self {
            activities,
            current_id: current.map(|a| a.id),
            pending,
        };
        store.sort();
        store
    }

    #[must_use]
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: ActivityId) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    #[must_use]
    pub const fn current_id(&self) -> Option<ActivityId> {
        self.current_id
    }

    /// The open-ended activity being tracked, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Activity> {
        self.current_id.and_then(|id| self.find(id))
    }

    /// The pending deletion, if its undo window is still open at `now`.
    #[must_use]
    pub fn pending_deletion(&self, now: DateTime<Local>) -> Option<&PendingDeletion> {
        self.pending.as_ref().filter(|p| now < p.expires_at)
    }

    /// The completed activity `resume` would currently accept: the most
    /// recently started completed feeding or sleep.
    #[must_use]
    pub fn most_recent_resumable(&self) -> Option<&Activity> {
        // list is sorted by start time descending
        self.activities
            .iter()
            .find(|a| a.end_time.is_some() && a.kind.is_resumable())
    }

    /// Starts a new open-ended activity, stopping any running one first as
    /// a single atomic step.
    ///
    /// Returns the new activity's id and the record changes in the order
    /// they happened (auto-stop first).
    pub fn start_at(
        &mut self,
        kind: ActivityKind,
        subtype: Option<Subtype>,
        now: DateTime<Local>,
    ) -> (ActivityId, Vec<ActivityChange>) {
        let mut changes = Vec::new();
        if let Some(change) = self.stop_current(now) {
            changes.push(change);
        }

        let id = self.next_id(now);
        let activity = new_activity(id, kind, subtype, now, None);
        self.activities.push(activity.clone());
        self.sort();
        self.current_id = Some(id);
        tracing::debug!(%id, kind = %kind, "started activity");

        changes.push(ActivityChange::created(activity));
        (id, changes)
    }

    /// Logs an instantaneous activity (`start == end == now`), stopping any
    /// running one first exactly as [`Self::start_at`] does.
    pub fn quick_add_at(
        &mut self,
        kind: ActivityKind,
        subtype: Option<Subtype>,
        now: DateTime<Local>,
    ) -> (ActivityId, Vec<ActivityChange>) {
        let mut changes = Vec::new();
        if let Some(change) = self.stop_current(now) {
            changes.push(change);
        }

        let id = self.next_id(now);
        let activity = new_activity(id, kind, subtype, now, Some(now));
        self.activities.push(activity.clone());
        self.sort();
        tracing::debug!(%id, kind = %kind, "logged quick activity");

        changes.push(ActivityChange::created(activity));
        (id, changes)
    }

    /// Stops the running activity in place, clearing the current pointer.
    /// No-op when nothing is running.
    pub fn stop_at(&mut self, now: DateTime<Local>) -> Option<ActivityChange> {
        let change = self.stop_current(now)?;
        if let Some(ref after) = change.after {
            tracing::debug!(id = %after.id, "stopped activity");
        }
        Some(change)
    }

    /// Reopens a completed feeding or sleep, making it current again.
    ///
    /// Only the most recently started completed resumable activity is
    /// accepted; anything else is a silent no-op. A running activity is
    /// stopped first with the same atomicity as `start` (eligibility is
    /// judged among completed records, so the running one never competes).
    pub fn resume_at(
        &mut self,
        id: ActivityId,
        now: DateTime<Local>,
    ) -> Option<Vec<ActivityChange>> {
        if self.most_recent_resumable().map(|a| a.id) != Some(id) {
            return None;
        }

        let mut changes = Vec::new();
        if let Some(change) = self.stop_current(now) {
            changes.push(change);
        }

        let idx = self.activities.iter().position(|a| a.id == id)?;
        let before = self.activities[idx].clone();
        self.activities[idx].end_time = None;
        self.current_id = Some(id);
        tracing::debug!(%id, "resumed activity");

        changes.push(ActivityChange::updated(before, self.activities[idx].clone()));
        Some(changes)
    }

    /// Soft-deletes a completed activity, arming the undo window.
    ///
    /// The running activity cannot be deleted (stop it first). A new
    /// deletion replaces, and permanently discards, any prior pending one.
    pub fn delete_at(&mut self, id: ActivityId, now: DateTime<Local>) -> Option<ActivityChange> {
        let idx = self.activities.iter().position(|a| a.id == id)?;
        if self.activities[idx].end_time.is_none() {
            return None;
        }

        let activity = self.activities.remove(idx);
        let pending = PendingDeletion {
            activity: activity.clone(),
            expires_at: now + Duration::milliseconds(UNDO_WINDOW_MS),
        };
        if let Some(dropped) = self.pending.replace(pending) {
            tracing::debug!(id = %dropped.activity.id, "pending deletion superseded");
        }
        tracing::debug!(%id, "deleted activity");

        Some(ActivityChange::removed(activity))
    }

    /// Restores the pending deletion if its window is still open at `now`.
    /// Consumes the pending slot either way.
    pub fn undo_delete_at(&mut self, now: DateTime<Local>) -> Option<ActivityChange> {
        let pending = self.pending.take()?;
        if now >= pending.expires_at {
            tracing::debug!(id = %pending.activity.id, "undo window already closed");
            return None;
        }

        self.activities.push(pending.activity.clone());
        self.sort();
        tracing::debug!(id = %pending.activity.id, "restored deleted activity");
        Some(ActivityChange::created(pending.activity))
    }

    /// Merges imported records, silently skipping ids already present.
    ///
    /// Imported records that claim to be ongoing are closed at their start
    /// time; only one activity may ever be open, and it is never one that
    /// arrived through a snapshot. Returns the records actually added.
    pub fn import_merge(&mut self, imported: Vec<Activity>) -> Vec<Activity> {
        let existing: HashSet<ActivityId> = self.activities.iter().map(|a| a.id).collect();
        let mut seen = existing;
        let mut added = Vec::new();
        for mut activity in imported {
            if !seen.insert(activity.id) {
                continue;
            }
            if activity.end_time.is_none() {
                tracing::debug!(id = %activity.id, "closing ongoing imported record");
                activity.end_time = Some(activity.start_time);
            }
            added.push(activity);
        }

        self.activities.extend(added.iter().cloned());
        self.sort();
        tracing::debug!(added = added.len(), "merged imported activities");
        added
    }

    /// Replaces a record with its committed edit draft and re-sorts.
    ///
    /// The draft must carry the same id; unknown ids are a no-op.
    pub fn apply_edit(&mut self, draft: &Activity) -> Option<ActivityChange> {
        let idx = self.activities.iter().position(|a| a.id == draft.id)?;
        let before = self.activities[idx].clone();
        self.activities[idx] = draft.clone();
        self.sort();
        tracing::debug!(id = %draft.id, "committed edit");
        Some(ActivityChange::updated(before, draft.clone()))
    }

    fn sort(&mut self) {
        self.activities
            .sort_by(|a, b| b.start_time.cmp(&a.start_time).then_with(|| b.id.cmp(&a.id)));
    }

    /// Ends the current activity in place. Shared by every operation that
    /// auto-stops.
    fn stop_current(&mut self, now: DateTime<Local>) -> Option<ActivityChange> {
        let id = self.current_id.take()?;
        let idx = self.activities.iter().position(|a| a.id == id)?;
        let before = self.activities[idx].clone();
        // end >= start must hold even if the clock stepped backwards
        self.activities[idx].end_time = Some(now.max(before.start_time));
        Some(ActivityChange::updated(before, self.activities[idx].clone()))
    }

    /// Allocates an id unique across the list and the undo buffer.
    fn next_id(&self, now: DateTime<Local>) -> ActivityId {
        let candidate = ActivityId::from_timestamp(now);
        let max_used = self
            .activities
            .iter()
            .map(|a| a.id)
            .chain(self.pending.as_ref().map(|p| p.activity.id))
            .max();
        match max_used {
            Some(max) if max >= candidate => max.next(),
            _ => candidate,
        }
    }
}

fn new_activity(
    id: ActivityId,
    kind: ActivityKind,
    subtype: Option<Subtype>,
    start: DateTime<Local>,
    end: Option<DateTime<Local>>,
) -> Activity {
    let (feeding_side, diaper_kind) = match (kind, subtype) {
        (ActivityKind::Feeding, Some(Subtype::Feeding(side))) => (Some(side), None),
        (ActivityKind::Diaper, Some(Subtype::Diaper(diaper))) => (None, Some(diaper)),
        _ => (None, None),
    };
    Activity {
        id,
        kind,
        start_time: start,
        end_time: end,
        feeding_side,
        diaper_kind,
        notes: None,
        original: AuditSnapshot::default(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 5, h, m, 0).unwrap()
    }

    fn assert_sorted(store: &ActivityStore) {
        let list = store.activities();
        for pair in list.windows(2) {
            assert!(
                pair[0].start_time > pair[1].start_time
                    || (pair[0].start_time == pair[1].start_time && pair[0].id > pair[1].id),
                "list must be sorted by start time descending"
            );
        }
    }

    fn assert_single_current(store: &ActivityStore) {
        let open: Vec<_> = store
            .activities()
            .iter()
            .filter(|a| a.end_time.is_none())
            .collect();
        match store.current_id() {
            Some(id) => {
                assert_eq!(open.len(), 1);
                assert_eq!(open[0].id, id);
            }
            None => assert!(open.is_empty()),
        }
    }

    #[test]
    fn start_adds_ongoing_activity_and_sets_current() {
        let mut store = ActivityStore::new();
        let (id, changes) = store.start_at(
            ActivityKind::Feeding,
            Some(Subtype::Feeding(FeedingSide::Left)),
            at(8, 0),
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(store.current().unwrap().id, id);
        assert!(store.current().unwrap().is_ongoing());
        assert_eq!(store.current().unwrap().feeding_side, Some(FeedingSide::Left));
        assert_single_current(&store);
    }

    #[test]
    fn start_stops_previous_activity_first() {
        let mut store = ActivityStore::new();
        let (first, _) = store.start_at(ActivityKind::Feeding, None, at(8, 0));
        let (second, changes) = store.start_at(ActivityKind::Sleep, None, at(9, 0));

        assert_eq!(changes.len(), 2);
        assert_eq!(store.find(first).unwrap().end_time, Some(at(9, 0)));
        assert_eq!(store.current().unwrap().id, second);
        assert_single_current(&store);
        assert_sorted(&store);
    }

    #[test]
    fn quick_add_creates_closed_activity() {
        let mut store = ActivityStore::new();
        let (_, _) = store.start_at(ActivityKind::Sleep, None, at(8, 0));
        let (id, changes) = store.quick_add_at(
            ActivityKind::Diaper,
            Some(Subtype::Diaper(DiaperKind::Both)),
            at(9, 0),
        );

        assert_eq!(changes.len(), 2);
        let diaper = store.find(id).unwrap();
        assert_eq!(diaper.start_time, diaper.end_time.unwrap());
        assert_eq!(diaper.diaper_kind, Some(DiaperKind::Both));
        assert!(store.current().is_none());
        assert_single_current(&store);
    }

    #[test]
    fn stop_without_current_is_noop() {
        let mut store = ActivityStore::new();
        assert!(store.stop_at(at(8, 0)).is_none());
    }

    #[test]
    fn stop_preserves_position_and_id() {
        let mut store = ActivityStore::new();
        let (id, _) = store.start_at(ActivityKind::Sleep, None, at(8, 0));
        let change = store.stop_at(at(9, 30)).unwrap();

        assert_eq!(change.after.as_ref().unwrap().id, id);
        assert_eq!(store.find(id).unwrap().end_time, Some(at(9, 30)));
        assert!(store.current().is_none());
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut store = ActivityStore::new();
        let now = at(8, 0);
        let (first, _) = store.quick_add_at(ActivityKind::Diaper, None, now);
        let (second, _) = store.quick_add_at(ActivityKind::Diaper, None, now);
        let (third, _) = store.quick_add_at(ActivityKind::Diaper, None, now);

        assert!(first < second && second < third);
        assert_sorted(&store);
    }

    #[test]
    fn resume_accepts_only_most_recent_completed_resumable() {
        let mut store = ActivityStore::new();
        let (sleep, _) = store.start_at(ActivityKind::Sleep, None, at(8, 0));
        store.stop_at(at(8, 30));
        let (feeding, _) = store.start_at(ActivityKind::Feeding, None, at(9, 0));
        store.stop_at(at(9, 20));

        // the sleep is older than the feeding
        assert!(store.resume_at(sleep, at(10, 0)).is_none());

        let changes = store.resume_at(feeding, at(10, 0)).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(store.current().unwrap().id, feeding);
        assert!(store.find(feeding).unwrap().is_ongoing());
        assert_single_current(&store);
    }

    #[test]
    fn resume_skips_diapers_and_ongoing_records() {
        let mut store = ActivityStore::new();
        let (feeding, _) = store.start_at(ActivityKind::Feeding, None, at(8, 0));
        store.stop_at(at(8, 20));
        let (diaper, _) = store.quick_add_at(ActivityKind::Diaper, None, at(9, 0));

        // the diaper is more recent but never resumable
        assert!(store.resume_at(diaper, at(10, 0)).is_none());
        assert!(store.resume_at(feeding, at(10, 0)).is_some());
    }

    #[test]
    fn resume_stops_running_activity_first() {
        let mut store = ActivityStore::new();
        let (feeding, _) = store.start_at(ActivityKind::Feeding, None, at(8, 0));
        store.stop_at(at(8, 20));
        let (sleep, _) = store.start_at(ActivityKind::Sleep, None, at(9, 0));

        let changes = store.resume_at(feeding, at(9, 30)).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(store.find(sleep).unwrap().end_time, Some(at(9, 30)));
        assert_eq!(store.current().unwrap().id, feeding);
        assert_single_current(&store);
    }

    #[test]
    fn resume_rejects_unknown_ids() {
        let mut store = ActivityStore::new();
        let (feeding, _) = store.start_at(ActivityKind::Feeding, None, at(8, 0));
        store.stop_at(at(8, 20));

        let bogus = ActivityId::from_timestamp(at(23, 59));
        assert!(store.resume_at(bogus, at(10, 0)).is_none());
        assert!(store.find(feeding).unwrap().end_time.is_some());
    }

    #[test]
    fn delete_refuses_ongoing_activity() {
        let mut store = ActivityStore::new();
        let (id, _) = store.start_at(ActivityKind::Sleep, None, at(8, 0));

        assert!(store.delete_at(id, at(8, 10)).is_none());
        assert!(store.find(id).is_some());
    }

    #[test]
    fn delete_then_undo_restores_identical_record() {
        let mut store = ActivityStore::new();
        let (id, _) = store.quick_add_at(
            ActivityKind::Diaper,
            Some(Subtype::Diaper(DiaperKind::Pee)),
            at(8, 0),
        );
        let original = store.find(id).unwrap().clone();

        store.delete_at(id, at(9, 0)).unwrap();
        assert!(store.find(id).is_none());
        assert!(store.pending_deletion(at(9, 0) + Duration::seconds(2)).is_some());

        let change = store.undo_delete_at(at(9, 0) + Duration::seconds(3)).unwrap();
        assert_eq!(change.after.as_ref().unwrap(), &original);
        assert_eq!(store.find(id).unwrap(), &original);
        assert_sorted(&store);
    }

    #[test]
    fn undo_after_window_is_noop() {
        let mut store = ActivityStore::new();
        let (id, _) = store.quick_add_at(ActivityKind::Diaper, None, at(8, 0));
        store.delete_at(id, at(9, 0)).unwrap();

        assert!(store.pending_deletion(at(9, 1)).is_none());
        assert!(store.undo_delete_at(at(9, 1)).is_none());
        // the slot was consumed; a second undo inside any window is still a no-op
        assert!(store.undo_delete_at(at(9, 0)).is_none());
    }

    #[test]
    fn second_undo_is_noop_after_consumption() {
        let mut store = ActivityStore::new();
        let (id, _) = store.quick_add_at(ActivityKind::Diaper, None, at(8, 0));
        let deleted_at = at(9, 0);
        store.delete_at(id, deleted_at).unwrap();

        let undo_at = deleted_at + Duration::seconds(2);
        assert!(store.undo_delete_at(undo_at).is_some());
        assert!(store.undo_delete_at(undo_at).is_none());
    }

    #[test]
    fn new_deletion_supersedes_pending_one() {
        let mut store = ActivityStore::new();
        let (first, _) = store.quick_add_at(ActivityKind::Diaper, None, at(8, 0));
        let (second, _) = store.quick_add_at(ActivityKind::Diaper, None, at(8, 30));

        store.delete_at(first, at(9, 0)).unwrap();
        store.delete_at(second, at(9, 0)).unwrap();

        // only the second deletion is undoable; the first is gone for good
        let change = store.undo_delete_at(at(9, 0) + Duration::seconds(1)).unwrap();
        assert_eq!(change.after.as_ref().unwrap().id, second);
        assert!(store.find(first).is_none());
    }

    #[test]
    fn import_merge_skips_existing_ids() {
        let mut store = ActivityStore::new();
        let (id, _) = store.quick_add_at(ActivityKind::Diaper, None, at(8, 0));
        let existing = store.find(id).unwrap().clone();

        let fresh = new_activity(
            ActivityId::from_timestamp(at(7, 0)),
            ActivityKind::Feeding,
            None,
            at(7, 0),
            Some(at(7, 15)),
        );
        let added = store.import_merge(vec![existing, fresh.clone()]);

        assert_eq!(added.len(), 1);
        assert_eq!(added[0].id, fresh.id);
        assert_eq!(store.len(), 2);
        assert_sorted(&store);
    }

    #[test]
    fn import_merge_dedups_within_the_batch() {
        let mut store = ActivityStore::new();
        let record = new_activity(
            ActivityId::from_timestamp(at(7, 0)),
            ActivityKind::Feeding,
            None,
            at(7, 0),
            Some(at(7, 15)),
        );

        let added = store.import_merge(vec![record.clone(), record]);
        assert_eq!(added.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn import_merge_closes_ongoing_records() {
        let mut store = ActivityStore::new();
        let open = new_activity(
            ActivityId::from_timestamp(at(7, 0)),
            ActivityKind::Sleep,
            None,
            at(7, 0),
            None,
        );

        let added = store.import_merge(vec![open]);
        assert_eq!(added[0].end_time, Some(at(7, 0)));
        assert_single_current(&store);
    }

    #[test]
    fn from_parts_repairs_missing_current_record() {
        let current = new_activity(
            ActivityId::from_timestamp(at(8, 0)),
            ActivityKind::Sleep,
            None,
            at(8, 0),
            None,
        );
        let store = ActivityStore::from_parts(Vec::new(), Some(current.clone()), None);

        assert_eq!(store.len(), 1);
        assert_eq!(store.current().unwrap(), &current);
    }

    #[test]
    fn sort_invariant_survives_mixed_operations() {
        let mut store = ActivityStore::new();
        store.quick_add_at(ActivityKind::Diaper, None, at(9, 0));
        store.start_at(ActivityKind::Feeding, None, at(8, 0));
        store.stop_at(at(8, 30));
        store.quick_add_at(ActivityKind::Diaper, None, at(10, 0));
        store.start_at(ActivityKind::Sleep, None, at(7, 0));
        store.stop_at(at(7, 45));
        store.import_merge(vec![new_activity(
            ActivityId::from_timestamp(at(6, 0)),
            ActivityKind::Feeding,
            None,
            at(9, 30),
            Some(at(9, 40)),
        )]);

        assert_sorted(&store);
        assert_single_current(&store);
    }
}
