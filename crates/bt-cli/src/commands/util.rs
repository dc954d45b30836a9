//! Shared parsing and formatting helpers for command output.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone};

use bt_core::{Activity, ActivityKind, DayKey};

/// Formats a completed duration as `2h 5m 30s`, or `5m 30s` under an hour.
#[must_use]
pub fn format_duration_ms(ms: i64) -> String {
    if ms < 0 {
        return "0m 0s".to_string();
    }
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

/// Formats the elapsed time of an ongoing activity as `HH:MM:SS`.
#[must_use]
pub fn format_live(start: DateTime<Local>, now: DateTime<Local>) -> String {
    let ms = now.signed_duration_since(start).num_milliseconds().max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parses a local `YYYY-MM-DDTHH:MM` value from explicit calendar fields.
pub fn parse_local_datetime(input: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S"))
        .with_context(|| format!("invalid datetime (expected YYYY-MM-DDTHH:MM): {input}"))?;
    match Local.from_local_datetime(&naive) {
        // DST fall-back makes a wall-clock time ambiguous; take the earlier one
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt),
        LocalResult::None => {
            anyhow::bail!("datetime falls in a daylight-saving gap: {input}")
        }
    }
}

/// Parses a `YYYY-MM-DD` day key.
pub fn parse_day(input: &str) -> Result<DayKey> {
    Ok(input.parse::<DayKey>()?)
}

/// Plain label for an activity kind.
#[must_use]
pub const fn kind_label(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Feeding => "Feeding",
        ActivityKind::Diaper => "Diaper",
        ActivityKind::Sleep => "Sleep",
    }
}

/// Label with the subtype in parentheses, e.g. `Feeding (left)`.
#[must_use]
pub fn activity_label(activity: &Activity) -> String {
    match activity.kind {
        ActivityKind::Feeding => activity
            .feeding_side
            .map_or_else(|| "Feeding".to_string(), |side| format!("Feeding ({side})")),
        ActivityKind::Diaper => activity
            .diaper_kind
            .map_or_else(|| "Diaper".to_string(), |kind| format!("Diaper ({kind})")),
        ActivityKind::Sleep => "Sleep".to_string(),
    }
}

/// One log line for an activity.
///
/// Instant activities show a single time; timed ones show the range and
/// duration, live against `now` while still running.
#[must_use]
pub fn activity_line(activity: &Activity, now: DateTime<Local>) -> String {
    let mut line = format!(
        "[{}] {}",
        activity.id,
        activity.start_time.format("%H:%M")
    );
    match activity.end_time {
        Some(end) if end != activity.start_time => {
            line.push_str(&format!(
                " - {}  {}  {}",
                end.format("%H:%M"),
                activity_label(activity),
                format_duration_ms(
                    end.signed_duration_since(activity.start_time)
                        .num_milliseconds()
                )
            ));
        }
        Some(_) => {
            line.push_str(&format!("  {}", activity_label(activity)));
        }
        None => {
            line.push_str(&format!(
                " - now  {}  {}",
                activity_label(activity),
                format_live(activity.start_time, now)
            ));
        }
    }
    if let Some(notes) = &activity.notes {
        line.push_str(&format!("  \"{notes}\""));
    }
    if !activity.original.is_empty() {
        line.push_str("  [edited]");
    }
    line
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use bt_core::{ActivityId, AuditSnapshot, FeedingSide};

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 5, h, m, 0).unwrap()
    }

    #[test]
    fn duration_formats_with_and_without_hours() {
        assert_eq!(format_duration_ms(0), "0m 0s");
        assert_eq!(format_duration_ms(90_000), "1m 30s");
        assert_eq!(format_duration_ms(3_661_000), "1h 1m 1s");
        assert_eq!(format_duration_ms(-5), "0m 0s");
    }

    #[test]
    fn live_duration_pads_to_clock_format() {
        assert_eq!(format_live(at(8, 0), at(9, 30)), "01:30:00");
        assert_eq!(format_live(at(9, 30), at(8, 0)), "00:00:00");
    }

    #[test]
    fn local_datetime_parses_calendar_fields() {
        let parsed = parse_local_datetime("2026-08-05T14:30").unwrap();
        assert_eq!(parsed.year(), 2026);
        assert_eq!(parsed.day(), 5);
        assert_eq!(parsed, at(14, 30));

        assert!(parse_local_datetime("2026-08-05").is_err());
        assert!(parse_local_datetime("8:30am").is_err());
    }

    #[test]
    fn day_parses_or_errors() {
        assert_eq!(parse_day("2026-08-05").unwrap(), DayKey::of(at(0, 0)));
        assert!(parse_day("yesterday").is_err());
    }

    #[test]
    fn log_line_shows_range_and_duration() {
        let activity = Activity {
            id: ActivityId::from_timestamp(at(8, 30)),
            kind: ActivityKind::Feeding,
            start_time: at(8, 30),
            end_time: Some(at(8, 45)),
            feeding_side: Some(FeedingSide::Left),
            diaper_kind: None,
            notes: None,
            original: AuditSnapshot::default(),
        };
        let line = activity_line(&activity, at(9, 0));
        assert!(line.contains("08:30 - 08:45"));
        assert!(line.contains("Feeding (left)"));
        assert!(line.contains("15m 0s"));
        assert!(!line.contains("[edited]"));
    }

    #[test]
    fn log_line_marks_instant_and_edited_records() {
        let mut activity = Activity {
            id: ActivityId::from_timestamp(at(9, 0)),
            kind: ActivityKind::Diaper,
            start_time: at(9, 0),
            end_time: Some(at(9, 0)),
            feeding_side: None,
            diaper_kind: None,
            notes: Some("blowout".to_string()),
            original: AuditSnapshot::default(),
        };
        activity.original.start_time = Some(at(8, 55));

        let line = activity_line(&activity, at(10, 0));
        assert!(line.contains("[edited]"));
        assert!(line.contains("\"blowout\""));
        assert!(!line.contains(" - "));
    }
}
