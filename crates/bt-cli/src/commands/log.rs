//! List logged activities.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use bt_core::DayKey;
use bt_db::Database;

use crate::cli::LogArgs;
use crate::commands::util::{activity_line, parse_day};

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    args: &LogArgs,
    now: DateTime<Local>,
) -> Result<()> {
    let tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    if tracker.activities().is_empty() {
        writeln!(writer, "No activities logged.")?;
        return Ok(());
    }

    if args.all {
        // the list is sorted newest first; emit a day header on each change
        let mut last: Option<DayKey> = None;
        for activity in tracker.activities() {
            let day = DayKey::of(activity.start_time);
            if last != Some(day) {
                writeln!(writer, "{day}")?;
                last = Some(day);
            }
            writeln!(writer, "  {}", activity_line(activity, now))?;
        }
        return Ok(());
    }

    let day = match &args.day {
        Some(raw) => parse_day(raw)?,
        None => DayKey::of(now),
    };
    writeln!(writer, "{day}")?;
    let mut any = false;
    for activity in tracker
        .activities()
        .iter()
        .filter(|a| DayKey::of(a.start_time) == day)
    {
        writeln!(writer, "  {}", activity_line(activity, now))?;
        any = true;
    }
    if !any {
        writeln!(writer, "  (no activities)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use bt_core::{ActivityKind, DiaperKind, FeedingSide, Subtype, Tracker};

    use super::*;

    fn at(day: u32, h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, day, h, m, 0).unwrap()
    }

    fn seeded_database() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let mut tracker = Tracker::new();
        tracker.quick_add_at(
            ActivityKind::Diaper,
            Some(Subtype::Diaper(DiaperKind::Pee)),
            at(4, 21, 0),
        );
        tracker.start_at(
            ActivityKind::Feeding,
            Some(Subtype::Feeding(FeedingSide::Left)),
            at(5, 8, 30),
        );
        tracker.stop_at(at(5, 8, 45));
        db.save_tracker(&tracker, at(5, 9, 0)).unwrap();
        db
    }

    #[test]
    fn log_defaults_to_the_current_day() {
        let db = seeded_database();
        let mut output = Vec::new();
        let args = LogArgs {
            day: None,
            all: false,
        };
        run(&mut output, &db, &args, at(5, 9, 0)).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("2026-08-05"));
        assert!(output.contains("Feeding (left)"));
        assert!(!output.contains("Diaper"));
    }

    #[test]
    fn log_all_groups_by_day() {
        let db = seeded_database();
        let mut output = Vec::new();
        let args = LogArgs {
            day: None,
            all: true,
        };
        run(&mut output, &db, &args, at(5, 9, 0)).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("2026-08-05"));
        assert!(output.contains("2026-08-04"));
        let pos_new = output.find("2026-08-05").unwrap();
        let pos_old = output.find("2026-08-04").unwrap();
        assert!(pos_new < pos_old, "newest day prints first");
    }

    #[test]
    fn log_reports_empty_days() {
        let db = seeded_database();
        let mut output = Vec::new();
        let args = LogArgs {
            day: Some("2026-01-01".to_string()),
            all: false,
        };
        run(&mut output, &db, &args, at(5, 9, 0)).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("(no activities)"));
    }
}
