//! Activity records and their wire representation.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing activity fields from their wire form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The id was not a decimal creation token.
    #[error("invalid activity id: {value}")]
    InvalidId { value: String },
    /// Unknown activity kind string.
    #[error("invalid activity kind: {value}")]
    InvalidKind { value: String },
    /// Unknown feeding side string.
    #[error("invalid feeding side: {value}")]
    InvalidFeedingSide { value: String },
    /// Unknown diaper kind string.
    #[error("invalid diaper kind: {value}")]
    InvalidDiaperKind { value: String },
    /// A day key that is not `YYYY-MM-DD`.
    #[error("invalid day (expected YYYY-MM-DD): {value}")]
    InvalidDayKey { value: String },
}

/// Creation-order token identifying an activity.
///
/// Ids are the epoch-millisecond timestamp at creation, bumped past the
/// store's maximum when two creations land on the same millisecond, so
/// sorting by id matches creation order whenever start times tie.
/// Serialized as a JSON string for snapshot compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActivityId(i64);

impl ActivityId {
    /// The id a record created at `at` would get, absent collisions.
    #[must_use]
    pub fn from_timestamp(at: DateTime<Local>) -> Self {
        Self(at.timestamp_millis())
    }

    /// The next token in creation order.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl TryFrom<String> for ActivityId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse::<i64>()
            .map(Self)
            .map_err(|_| ParseError::InvalidId { value })
    }
}

impl From<ActivityId> for String {
    fn from(id: ActivityId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ActivityId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self).map_err(|_| ParseError::InvalidId {
            value: s.to_string(),
        })
    }
}

/// What was logged.
///
/// Wire names match the original snapshot format, so exported files from
/// older installs import cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    #[serde(rename = "breastfeeding")]
    Feeding,
    Diaper,
    Sleep,
}

impl ActivityKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Feeding => "breastfeeding",
            Self::Diaper => "diaper",
            Self::Sleep => "sleep",
        }
    }

    /// Completed feedings and sleeps can be reopened; a diaper change is
    /// instantaneous and never resumable.
    #[must_use]
    pub const fn is_resumable(&self) -> bool {
        matches!(self, Self::Feeding | Self::Sleep)
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breastfeeding" => Ok(Self::Feeding),
            "diaper" => Ok(Self::Diaper),
            "sleep" => Ok(Self::Sleep),
            _ => Err(ParseError::InvalidKind {
                value: s.to_string(),
            }),
        }
    }
}

/// How a feeding was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedingSide {
    Left,
    Right,
    Bottle,
}

impl FeedingSide {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Bottle => "bottle",
        }
    }
}

impl fmt::Display for FeedingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeedingSide {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "bottle" => Ok(Self::Bottle),
            _ => Err(ParseError::InvalidFeedingSide {
                value: s.to_string(),
            }),
        }
    }
}

/// What a diaper change dealt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiaperKind {
    Pee,
    Poo,
    Both,
}

impl DiaperKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pee => "pee",
            Self::Poo => "poo",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for DiaperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiaperKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pee" => Ok(Self::Pee),
            "poo" => Ok(Self::Poo),
            "both" => Ok(Self::Both),
            _ => Err(ParseError::InvalidDiaperKind {
                value: s.to_string(),
            }),
        }
    }
}

/// First-ever-edit snapshots, kept for audit display.
///
/// Each slot is written at most once: the first commit that touches a field
/// captures its pre-edit value, and later edits leave the slot alone. An
/// empty slot means the field was never edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSnapshot {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "originalStartTime"
    )]
    pub start_time: Option<DateTime<Local>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "originalEndTime"
    )]
    pub end_time: Option<DateTime<Local>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "originalFeedingType"
    )]
    pub feeding_side: Option<FeedingSide>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "originalDiaperType"
    )]
    pub diaper_kind: Option<DiaperKind>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "originalNotes"
    )]
    pub notes: Option<String>,
}

impl AuditSnapshot {
    /// True when no field has ever been edited.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start_time.is_none()
            && self.end_time.is_none()
            && self.feeding_side.is_none()
            && self.diaper_kind.is_none()
            && self.notes.is_none()
    }
}

/// One logged event.
///
/// Timestamps carry local wall-clock semantics: day membership is always
/// derived from their local calendar fields, never from a UTC round-trip.
/// A missing `end_time` means the activity is ongoing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub start_time: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "feedingType")]
    pub feeding_side: Option<FeedingSide>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "diaperType")]
    pub diaper_kind: Option<DiaperKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub original: AuditSnapshot,
}

impl Activity {
    /// Whether the activity is still open-ended.
    #[must_use]
    pub const fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }

    /// Elapsed milliseconds for a completed activity.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| end.signed_duration_since(self.start_time).num_milliseconds())
    }
}
