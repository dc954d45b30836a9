//! Start a feeding or a sleep.

use anyhow::{Context, Result};
use chrono::Local;

use bt_core::{ActivityKind, Subtype};
use bt_db::Database;

use crate::cli::StartActivity;
use crate::commands::util::kind_label;

pub fn run(db: &mut Database, activity: &StartActivity) -> Result<()> {
    let now = Local::now();
    let mut tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    let stopped = tracker.current().map(|a| kind_label(a.kind));
    let (kind, subtype) = match activity {
        StartActivity::Feeding { side } => (
            ActivityKind::Feeding,
            side.map(|s| Subtype::Feeding(s.into())),
        ),
        StartActivity::Sleep => (ActivityKind::Sleep, None),
    };

    let id = tracker.start_at(kind, subtype, now);
    db.save_tracker(&tracker, now)
        .context("failed to save tracker state")?;

    if let Some(label) = stopped {
        println!("Stopped {label}.");
    }
    println!(
        "Started {} at {} (id {id}).",
        kind_label(kind),
        now.format("%H:%M")
    );
    Ok(())
}
