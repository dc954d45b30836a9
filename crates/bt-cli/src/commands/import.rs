//! Merge activities from a JSON snapshot.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use bt_core::parse_export;
use bt_db::Database;

pub fn run(db: &mut Database, file: &Path) -> Result<()> {
    let now = Local::now();
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    // a rejected payload is never partially imported
    let activities = parse_export(&raw).context("rejected import file")?;

    let mut tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;
    let added = tracker.import_merge_at(activities, now);

    if added == 0 {
        println!("No new activities to import.");
    } else {
        db.save_tracker(&tracker, now)
            .context("failed to save tracker state")?;
        println!("Imported {added} new activities.");
    }
    Ok(())
}
