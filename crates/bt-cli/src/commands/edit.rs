//! Edit a logged activity.
//!
//! Flags map onto an edit session: each one touches the corresponding
//! field (with the engine's clamp rules applied), and the session commits
//! once at the end. No flags means nothing to commit.

use anyhow::{Context, Result};
use chrono::Local;

use bt_core::ActivityId;
use bt_db::Database;

use crate::cli::EditArgs;
use crate::commands::util::parse_local_datetime;

pub fn run(db: &mut Database, args: &EditArgs) -> Result<()> {
    let now = Local::now();
    let id: ActivityId = args.id.parse().context("invalid activity id")?;
    let mut tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    let Some(mut session) = tracker.begin_edit(id) else {
        println!("No activity with id {id}.");
        return Ok(());
    };

    if let Some(raw) = &args.start {
        session.set_start_time(parse_local_datetime(raw)?, now);
    }
    if let Some(raw) = &args.end {
        session.set_end_time(parse_local_datetime(raw)?);
    }
    if let Some(side) = args.side {
        session.set_feeding_side(side.into());
    }
    if let Some(kind) = args.diaper {
        session.set_diaper_kind(kind.into());
    }
    if let Some(notes) = &args.notes {
        session.set_notes(notes.clone());
    }

    if tracker.commit_edit_at(session, now) {
        db.save_tracker(&tracker, now)
            .context("failed to save tracker state")?;
        println!("Updated activity {id}.");
    } else {
        println!("Nothing to change.");
    }
    Ok(())
}
