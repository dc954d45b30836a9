//! Save/cancel edit sessions over a single activity.
//!
//! A session works on a draft copy of the record, so a form can reflect
//! every keystroke while the store stays untouched until the tracker
//! commits. The first touch of each field snapshots its pre-session value
//! into a typed baseline slot; cancelling restores the draft from those
//! baselines. This is separate from the permanent [`AuditSnapshot`] on the
//! record itself, which captures a field's value before its very first
//! edit ever and is written at commit time.
//!
//! [`AuditSnapshot`]: crate::activity::AuditSnapshot

use chrono::{DateTime, Local};

use crate::activity::{Activity, ActivityId, ActivityKind, DiaperKind, FeedingSide};

/// Pre-session values, recorded the first time each field is touched.
///
/// The outer `None` means "not touched this session"; the inner value is
/// the field's state when the session began (which may itself be empty,
/// hence the doubled `Option`s).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBaselines {
    pub start_time: Option<DateTime<Local>>,
    pub end_time: Option<Option<DateTime<Local>>>,
    pub feeding_side: Option<Option<FeedingSide>>,
    pub diaper_kind: Option<Option<DiaperKind>>,
    pub notes: Option<Option<String>>,
}

impl EditBaselines {
    /// Whether any field has been touched.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start_time.is_none()
            && self.end_time.is_none()
            && self.feeding_side.is_none()
            && self.diaper_kind.is_none()
            && self.notes.is_none()
    }
}

/// An in-progress edit of one activity.
#[derive(Debug, Clone)]
pub struct EditSession {
    draft: Activity,
    baselines: EditBaselines,
}

impl EditSession {
    /// Opens a session over a snapshot of the activity.
    #[must_use]
    pub fn new(activity: Activity) -> Self {
        Self {
            draft: activity,
            baselines: EditBaselines::default(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ActivityId {
        self.draft.id
    }

    /// The record as the form currently shows it.
    #[must_use]
    pub const fn draft(&self) -> &Activity {
        &self.draft
    }

    #[must_use]
    pub const fn baselines(&self) -> &EditBaselines {
        &self.baselines
    }

    /// Whether anything has changed this session.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        !self.baselines.is_empty()
    }

    /// Consumes the session, yielding the draft for commit.
    #[must_use]
    pub fn into_draft(self) -> Activity {
        self.draft
    }

    /// Sets the start time.
    ///
    /// A start past the current end drags the end up to match (the
    /// interval collapses rather than the edit failing). Moving an ongoing
    /// activity's start past `now` is ignored: an open activity cannot
    /// begin in the future.
    pub fn set_start_time(&mut self, new_start: DateTime<Local>, now: DateTime<Local>) {
        if self.draft.end_time.is_none() && new_start > now {
            return;
        }
        if let Some(end) = self.draft.end_time {
            if new_start > end {
                self.touch_end_time();
                self.draft.end_time = Some(new_start);
            }
        }
        self.touch_start_time();
        self.draft.start_time = new_start;
    }

    /// Sets the end time, dragging the start down when the new end would
    /// precede it. Ignored while the activity is ongoing: open activities
    /// are only ever closed by `stop`.
    pub fn set_end_time(&mut self, new_end: DateTime<Local>) {
        if self.draft.end_time.is_none() {
            return;
        }
        if new_end < self.draft.start_time {
            self.touch_start_time();
            self.draft.start_time = new_end;
        }
        self.touch_end_time();
        self.draft.end_time = Some(new_end);
    }

    /// Sets the feeding side. Ignored on non-feeding activities.
    pub fn set_feeding_side(&mut self, side: FeedingSide) {
        if self.draft.kind != ActivityKind::Feeding {
            return;
        }
        self.touch_feeding_side();
        self.draft.feeding_side = Some(side);
    }

    /// Sets the diaper kind. Ignored on non-diaper activities.
    pub fn set_diaper_kind(&mut self, kind: DiaperKind) {
        if self.draft.kind != ActivityKind::Diaper {
            return;
        }
        self.touch_diaper_kind();
        self.draft.diaper_kind = Some(kind);
    }

    /// Sets the notes; an empty string clears them.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.touch_notes();
        let notes = notes.into();
        self.draft.notes = if notes.is_empty() { None } else { Some(notes) };
    }

    /// Restores every touched field from its baseline and discards them.
    /// The session ends with the draft equal to the pre-session record.
    pub fn cancel(&mut self) {
        if let Some(start) = self.baselines.start_time.take() {
            self.draft.start_time = start;
        }
        if let Some(end) = self.baselines.end_time.take() {
            self.draft.end_time = end;
        }
        if let Some(side) = self.baselines.feeding_side.take() {
            self.draft.feeding_side = side;
        }
        if let Some(kind) = self.baselines.diaper_kind.take() {
            self.draft.diaper_kind = kind;
        }
        if let Some(notes) = self.baselines.notes.take() {
            self.draft.notes = notes;
        }
    }

    fn touch_start_time(&mut self) {
        if self.baselines.start_time.is_none() {
            self.baselines.start_time = Some(self.draft.start_time);
        }
    }

    fn touch_end_time(&mut self) {
        if self.baselines.end_time.is_none() {
            self.baselines.end_time = Some(self.draft.end_time);
        }
    }

    fn touch_feeding_side(&mut self) {
        if self.baselines.feeding_side.is_none() {
            self.baselines.feeding_side = Some(self.draft.feeding_side);
        }
    }

    fn touch_diaper_kind(&mut self) {
        if self.baselines.diaper_kind.is_none() {
            self.baselines.diaper_kind = Some(self.draft.diaper_kind);
        }
    }

    fn touch_notes(&mut self) {
        if self.baselines.notes.is_none() {
            self.baselines.notes = Some(self.draft.notes.clone());
        }
    }
}
