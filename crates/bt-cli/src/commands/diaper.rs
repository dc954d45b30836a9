//! Log an instantaneous diaper change.

use anyhow::{Context, Result};
use chrono::Local;

use bt_core::{ActivityKind, DiaperKind, Subtype};
use bt_db::Database;

use crate::cli::DiaperArg;
use crate::commands::util::kind_label;

pub fn run(db: &mut Database, kind: DiaperArg) -> Result<()> {
    let now = Local::now();
    let mut tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    let stopped = tracker.current().map(|a| kind_label(a.kind));
    let diaper: DiaperKind = kind.into();
    let id = tracker.quick_add_at(ActivityKind::Diaper, Some(Subtype::Diaper(diaper)), now);
    db.save_tracker(&tracker, now)
        .context("failed to save tracker state")?;

    if let Some(label) = stopped {
        println!("Stopped {label}.");
    }
    println!(
        "Logged Diaper ({diaper}) at {} (id {id}).",
        now.format("%H:%M")
    );
    Ok(())
}
