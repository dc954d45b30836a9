//! Export/import snapshot codec.
//!
//! Snapshots are plain JSON files a user can move between devices. Import
//! is purely additive: records whose id already exists in the store are
//! dropped silently, everything else is merged (see
//! [`Tracker::import_merge`](crate::tracker::Tracker::import_merge)).

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::Activity;

/// Version stamped into export files.
pub const APP_VERSION: &str = "1.0.0";

/// The snapshot file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub export_date: DateTime<Local>,
    pub app_version: String,
    pub activities: Vec<Activity>,
}

/// Why an import payload was rejected. Both variants surface to the user;
/// a rejected payload is never partially imported.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The payload was not valid JSON, or a record inside it was malformed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload parsed but carries no `activities` array.
    #[error("missing or malformed `activities` array")]
    MissingActivities,
}

/// Renders a snapshot of the activity list.
pub fn render_export(
    activities: &[Activity],
    now: DateTime<Local>,
) -> Result<String, serde_json::Error> {
    let file = ExportFile {
        export_date: now,
        app_version: APP_VERSION.to_string(),
        activities: activities.to_vec(),
    };
    serde_json::to_string_pretty(&file)
}

/// Parses an exported snapshot, validating the `activities` array before
/// decoding any record.
pub fn parse_export(json: &str) -> Result<Vec<Activity>, ImportError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let Some(items) = value.get("activities").and_then(serde_json::Value::as_array) else {
        return Err(ImportError::MissingActivities);
    };
    items
        .iter()
        .map(|item| serde_json::from_value(item.clone()).map_err(ImportError::Json))
        .collect()
}
