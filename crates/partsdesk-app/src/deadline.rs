// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

pub const URGENT_MINUTES: i64 = 10;
pub const WARNING_MINUTES: i64 = 30;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;
const MINUTES_PER_WEEK: u64 = 7 * MINUTES_PER_DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineTier {
    Urgent,
    Warning,
    Normal,
}

impl DeadlineTier {
    pub const fn for_minutes(minutes_remaining: i64) -> Self {
        if minutes_remaining < URGENT_MINUTES {
            Self::Urgent
        } else if minutes_remaining < WARNING_MINUTES {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineInfo {
    pub tier: DeadlineTier,
    /// Whole minutes left, truncated toward zero.
    pub minutes_remaining: i64,
    pub overdue: bool,
    pub display: String,
}

impl DeadlineInfo {
    pub const fn is_overdue(&self) -> bool {
        self.overdue
    }
}

/// Urgency of a quote's `required_by` value relative to `now`.
///
/// Returns `None` when no deadline is set or the value cannot be parsed.
/// Legacy `dd/mm/yyyy h:mma` values are read in `now`'s offset.
pub fn deadline_info(required_by: Option<&str>, now: OffsetDateTime) -> Option<DeadlineInfo> {
    let raw = required_by?.trim();
    if raw.is_empty() {
        return None;
    }
    let deadline = parse_deadline(raw, now.offset()).ok()?;
    let remaining = deadline - now;
    let minutes_remaining = remaining.whole_minutes();
    Some(DeadlineInfo {
        tier: DeadlineTier::for_minutes(minutes_remaining),
        minutes_remaining,
        overdue: remaining.is_negative(),
        display: format_remaining(remaining),
    })
}

pub fn parse_deadline(raw: &str, local_offset: UtcOffset) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = OffsetDateTime::parse(
        raw,
        &format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
        ),
    ) {
        return Ok(value);
    }

    // Minute precision with an explicit offset.
    for format in [
        format_description!(
            "[year]-[month]-[day]T[hour]:[minute][offset_hour sign:mandatory]:[offset_minute]"
        ),
        format_description!(
            "[year]-[month]-[day] [hour]:[minute][offset_hour sign:mandatory]:[offset_minute]"
        ),
    ] {
        if let Ok(value) = OffsetDateTime::parse(raw, format) {
            return Ok(value);
        }
    }
    if let Some(utc) = raw.strip_suffix('Z')
        && let Ok(value) =
            PrimitiveDateTime::parse(utc, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_offset(local_offset));
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    ) {
        return Ok(value.assume_offset(local_offset));
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_offset(local_offset));
    }

    parse_legacy_deadline(raw, local_offset)
}

fn parse_legacy_deadline(raw: &str, local_offset: UtcOffset) -> Result<OffsetDateTime> {
    let (date_raw, time_raw) = raw
        .split_once(' ')
        .ok_or_else(|| anyhow!("unsupported deadline format {raw:?}"))?;
    let date = Date::parse(
        date_raw,
        &format_description!("[day padding:none]/[month padding:none]/[year]"),
    )
    .with_context(|| format!("invalid deadline date in {raw:?}"))?;
    let time = parse_twelve_hour_time(time_raw.trim())
        .with_context(|| format!("invalid deadline time in {raw:?}"))?;
    Ok(PrimitiveDateTime::new(date, time).assume_offset(local_offset))
}

fn parse_twelve_hour_time(raw: &str) -> Result<Time> {
    let lowered = raw.to_ascii_lowercase();
    let (clock, afternoon) = if let Some(clock) = lowered.strip_suffix("pm") {
        (clock, true)
    } else if let Some(clock) = lowered.strip_suffix("am") {
        (clock, false)
    } else {
        bail!("missing am/pm suffix in {raw:?}");
    };
    let (hour_raw, minute_raw) = clock
        .trim()
        .split_once(':')
        .ok_or_else(|| anyhow!("expected h:mm in {raw:?}"))?;
    let hour: u8 = hour_raw.parse().context("parse hour")?;
    let minute: u8 = minute_raw.parse().context("parse minute")?;
    if !(1..=12).contains(&hour) {
        bail!("hour {hour} is outside 1-12");
    }
    let hour = match (hour, afternoon) {
        (12, false) => 0,
        (12, true) => 12,
        (hour, true) => hour + 12,
        (hour, false) => hour,
    };
    Time::from_hms(hour, minute, 0).context("build time of day")
}

/// Signed compact duration: `1w 2d 3h 4m`, leading zero units dropped. The
/// sign follows the duration, so 30 seconds overdue reads `-0m`.
pub fn format_remaining(duration: Duration) -> String {
    let sign = if duration.is_negative() { "-" } else { "" };
    let mut remaining = duration.whole_minutes().unsigned_abs();
    let mut parts = Vec::with_capacity(4);
    for (suffix, size) in [
        ("w", MINUTES_PER_WEEK),
        ("d", MINUTES_PER_DAY),
        ("h", MINUTES_PER_HOUR),
        ("m", 1),
    ] {
        let value = remaining / size;
        remaining %= size;
        if value > 0 || !parts.is_empty() || suffix == "m" {
            parts.push(format!("{value}{suffix}"));
        }
    }
    format!("{sign}{}", parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::{DeadlineTier, deadline_info, format_remaining, parse_deadline};
    use time::macros::{datetime, offset};
    use time::{Duration, OffsetDateTime};

    const NOW: OffsetDateTime = datetime!(2026-10-19 15:00:00 +10:00);

    fn iso(value: OffsetDateTime) -> String {
        value
            .format(&time::format_description::well_known::Rfc3339)
            .expect("format rfc3339")
    }

    #[test]
    fn ninety_seconds_out_is_urgent() {
        let required_by = iso(NOW + Duration::seconds(90));
        let info = deadline_info(Some(&required_by), NOW).expect("deadline parsed");
        assert_eq!(info.tier, DeadlineTier::Urgent);
        assert_eq!(info.minutes_remaining, 1);
        assert_eq!(info.display, "1m");
        assert!(!info.is_overdue());
    }

    #[test]
    fn overdue_deadline_has_negative_display() {
        let required_by = iso(NOW - Duration::seconds(3_700));
        let info = deadline_info(Some(&required_by), NOW).expect("deadline parsed");
        assert_eq!(info.tier, DeadlineTier::Urgent);
        assert_eq!(info.minutes_remaining, -61);
        assert_eq!(info.display, "-1h 1m");
        assert!(info.is_overdue());
    }

    #[test]
    fn tiers_follow_minute_thresholds() {
        assert_eq!(DeadlineTier::for_minutes(9), DeadlineTier::Urgent);
        assert_eq!(DeadlineTier::for_minutes(10), DeadlineTier::Warning);
        assert_eq!(DeadlineTier::for_minutes(29), DeadlineTier::Warning);
        assert_eq!(DeadlineTier::for_minutes(30), DeadlineTier::Normal);
    }

    #[test]
    fn legacy_locale_format_uses_local_offset() {
        let info = deadline_info(Some("19/10/2026 3:45pm"), NOW).expect("legacy parsed");
        assert_eq!(info.minutes_remaining, 45);
        assert_eq!(info.tier, DeadlineTier::Normal);

        let morning = parse_deadline("1/2/2026 12:05AM", offset!(+10:00)).expect("midnight");
        assert_eq!(morning, datetime!(2026-02-01 00:05:00 +10:00));
    }

    #[test]
    fn naive_iso_values_use_local_offset() {
        let parsed = parse_deadline("2026-10-19T16:30", offset!(+10:00)).expect("datetime-local");
        assert_eq!(parsed, datetime!(2026-10-19 16:30:00 +10:00));
    }

    #[test]
    fn missing_or_garbage_deadline_is_none() {
        assert!(deadline_info(None, NOW).is_none());
        assert!(deadline_info(Some("  "), NOW).is_none());
        assert!(deadline_info(Some("next tuesday"), NOW).is_none());
        assert!(deadline_info(Some("31/02/2026 3:00pm"), NOW).is_none());
        assert!(deadline_info(Some("19/10/2026 13:00pm"), NOW).is_none());
    }

    #[test]
    fn compact_display_keeps_inner_zero_units() {
        assert_eq!(format_remaining(Duration::ZERO), "0m");
        assert_eq!(format_remaining(Duration::minutes(60)), "1h 0m");
        assert_eq!(
            format_remaining(Duration::minutes(2 * 24 * 60 + 3 * 60)),
            "2d 3h 0m"
        );
        assert_eq!(
            format_remaining(Duration::minutes(-(7 * 24 * 60 + 5))),
            "-1w 0d 0h 5m"
        );
    }

    #[test]
    fn just_missed_deadline_is_overdue() {
        let required_by = iso(NOW - Duration::seconds(30));
        let info = deadline_info(Some(&required_by), NOW).expect("deadline parsed");
        assert_eq!(info.minutes_remaining, 0);
        assert!(info.is_overdue());
        assert_eq!(info.display, "-0m");
        assert_eq!(info.tier, DeadlineTier::Urgent);
    }

    #[test]
    fn offset_values_without_seconds_parse() {
        assert_eq!(
            parse_deadline("2026-05-09T09:05+10:00", offset!(+00:00)).expect("minute precision"),
            datetime!(2026-05-09 09:05:00 +10:00)
        );
        assert_eq!(
            parse_deadline("2026-05-09 09:05+05:30", offset!(+10:00)).expect("space separated"),
            datetime!(2026-05-09 09:05:00 +05:30)
        );
        assert_eq!(
            parse_deadline("2026-05-08T23:05Z", offset!(+10:00)).expect("zulu"),
            datetime!(2026-05-08 23:05:00 UTC)
        );
    }
}
