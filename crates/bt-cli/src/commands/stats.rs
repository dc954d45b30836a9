//! Show daily statistics.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use bt_core::DayKey;
use bt_db::Database;

use crate::commands::util::{format_duration_ms, parse_day};

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    day: Option<&str>,
    now: DateTime<Local>,
) -> Result<()> {
    let tracker = db
        .load_tracker(now)
        .context("failed to load tracker state")?;

    let date = match day {
        Some(raw) => parse_day(raw)?,
        None => DayKey::of(now),
    };
    let stats = tracker.stats_for(date, now);

    writeln!(writer, "Stats for {date}")?;
    writeln!(writer, "  Feedings: {}", stats.feedings)?;
    writeln!(writer, "  Diapers:  {}", stats.diapers)?;
    writeln!(writer, "  Sleep:    {}", format_duration_ms(stats.sleep_ms))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use bt_core::{ActivityKind, DiaperKind, Subtype, Tracker};

    use insta::assert_snapshot;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 5, h, m, 0).unwrap()
    }

    #[test]
    fn stats_command_reports_daily_totals() {
        let mut db = Database::open_in_memory().unwrap();
        let mut tracker = Tracker::new();
        tracker.start_at(ActivityKind::Sleep, None, at(13, 0));
        tracker.stop_at(at(14, 30));
        tracker.quick_add_at(
            ActivityKind::Diaper,
            Some(Subtype::Diaper(DiaperKind::Both)),
            at(14, 35),
        );
        tracker.start_at(ActivityKind::Feeding, None, at(15, 0));
        tracker.stop_at(at(15, 20));
        db.save_tracker(&tracker, at(15, 30)).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, Some("2026-08-05"), at(15, 30)).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output.trim_end(), @r"
        Stats for 2026-08-05
          Feedings: 1
          Diapers:  1
          Sleep:    1h 30m 0s
        ");
    }

    #[test]
    fn stats_for_an_untracked_day_are_zero() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, Some("2026-01-01"), at(9, 0)).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Feedings: 0"));
        assert!(output.contains("Sleep:    0m 0s"));
    }
}
