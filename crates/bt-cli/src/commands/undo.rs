//! Restore the most recently deleted activity.

use anyhow::{Context, Result};
use chrono::Local;

use bt_db::Database;

use crate::commands::util::activity_label;

pub fn run(db: &mut Database) -> Result<()> {
    let now = Local::now();
    let mut tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    match tracker.undo_delete_at(now) {
        Some(id) => {
            db.save_tracker(&tracker, now)
                .context("failed to save tracker state")?;
            match tracker.find(id) {
                Some(activity) => println!("Restored {} (id {id}).", activity_label(activity)),
                None => println!("Restored activity {id}."),
            }
        }
        None => println!("Nothing to undo."),
    }
    Ok(())
}
