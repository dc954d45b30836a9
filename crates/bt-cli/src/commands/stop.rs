//! Stop the running activity.

use anyhow::{Context, Result};
use chrono::Local;

use bt_db::Database;

use crate::commands::util::activity_label;

pub fn run(db: &mut Database) -> Result<()> {
    let now = Local::now();
    let mut tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    let label = tracker.current().map(activity_label);
    match tracker.stop_at(now) {
        Some(_) => {
            db.save_tracker(&tracker, now)
                .context("failed to save tracker state")?;
            println!(
                "Stopped {} at {}.",
                label.unwrap_or_else(|| "activity".to_string()),
                now.format("%H:%M")
            );
        }
        None => println!("Nothing is running."),
    }
    Ok(())
}
