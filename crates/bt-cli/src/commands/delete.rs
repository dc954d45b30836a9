//! Delete a completed activity, with a short undo window.

use anyhow::{Context, Result};
use chrono::Local;

use bt_core::{ActivityId, UNDO_WINDOW_MS};
use bt_db::Database;

use crate::commands::util::activity_label;

pub fn run(db: &mut Database, id: &str) -> Result<()> {
    let now = Local::now();
    let id: ActivityId = id.parse().context("invalid activity id")?;
    let mut tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    let Some(activity) = tracker.find(id) else {
        println!("No activity with id {id}.");
        return Ok(());
    };
    if activity.is_ongoing() {
        println!("Cannot delete the running activity; stop it first.");
        return Ok(());
    }
    let label = activity_label(activity);

    if tracker.delete_at(id, now) {
        db.save_tracker(&tracker, now)
            .context("failed to save tracker state")?;
        println!(
            "Deleted {label}. Run `bt undo` within {} seconds to restore it.",
            UNDO_WINDOW_MS / 1000
        );
    } else {
        println!("Could not delete activity {id}.");
    }
    Ok(())
}
