//! Status command: the running activity and today's totals.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use bt_core::DayKey;
use bt_db::Database;

use crate::Config;
use crate::commands::util::{activity_label, format_duration_ms, format_live};

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    now: DateTime<Local>,
) -> Result<()> {
    let tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    writeln!(writer, "Baby tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    match tracker.current() {
        Some(activity) => writeln!(
            writer,
            "Running: {}, started {} ({})",
            activity_label(activity),
            activity.start_time.format("%H:%M"),
            format_live(activity.start_time, now)
        )?,
        None => writeln!(writer, "Nothing running.")?,
    }

    let today = tracker.stats_for(DayKey::of(now), now);
    writeln!(
        writer,
        "Today: {} feedings, {} diapers, {} sleep",
        today.feedings,
        today.diapers,
        format_duration_ms(today.sleep_ms)
    )?;
    Ok(())
}
