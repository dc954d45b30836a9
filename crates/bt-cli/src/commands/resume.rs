//! Reopen a completed feeding or sleep.

use anyhow::{Context, Result};
use chrono::Local;

use bt_core::ActivityId;
use bt_db::Database;

use crate::commands::util::activity_label;

pub fn run(db: &mut Database, id: &str) -> Result<()> {
    let now = Local::now();
    let id: ActivityId = id.parse().context("invalid activity id")?;
    let mut tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    if tracker.resume_at(id, now) {
        db.save_tracker(&tracker, now)
            .context("failed to save tracker state")?;
        if let Some(activity) = tracker.find(id) {
            println!("Resumed {} (id {id}).", activity_label(activity));
        }
        return Ok(());
    }

    match tracker.most_recent_resumable() {
        Some(eligible) => println!(
            "Cannot resume {id}; only the most recent completed feeding or sleep (id {}) can be resumed.",
            eligible.id
        ),
        None => println!("Nothing to resume."),
    }
    Ok(())
}
