//! Write a JSON snapshot of all activities.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use bt_core::render_export;
use bt_db::Database;

pub fn run(db: &Database, output: Option<&Path>, now: DateTime<Local>) -> Result<()> {
    let tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    if tracker.activities().is_empty() {
        println!("Nothing to export.");
        return Ok(());
    }

    let json = render_export(tracker.activities(), now).context("failed to render export")?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Exported {} activities to {}.",
                tracker.activities().len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
