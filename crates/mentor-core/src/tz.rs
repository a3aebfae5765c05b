//! Timezone resolution — maps a user's stored timezone descriptor (IANA name
//! or a `UTC±H[:MM]` literal) to local wall-clock time.
//!
//! Resolution never fails: anything unrecognised collapses to UTC so a bad
//! row can't take a user out of the schedule.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// A resolved timezone, ready for instant → local conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveTz {
    Utc,
    /// Fixed `UTC±H[:MM]` offset — no DST.
    Fixed(FixedOffset),
    /// IANA zone; the effective offset is recomputed on every conversion so
    /// DST transitions are honoured.
    Named(Tz),
}

impl EffectiveTz {
    /// Local wall-clock date and time for `utc` in this zone.
    pub fn local(&self, utc: DateTime<Utc>) -> NaiveDateTime {
        match self {
            EffectiveTz::Utc => utc.naive_utc(),
            EffectiveTz::Fixed(offset) => utc.with_timezone(offset).naive_local(),
            EffectiveTz::Named(zone) => utc.with_timezone(zone).naive_local(),
        }
    }

    /// The local calendar date ("today") for `utc` in this zone. Dedup dates
    /// and `due_date == today` comparisons all use this.
    pub fn today(&self, utc: DateTime<Utc>) -> NaiveDate {
        self.local(utc).date()
    }
}

/// Parse a `UTC`, `UTC+H`, `UTC-H` or `UTC±H:MM` literal into signed minutes.
///
/// Hours are 1–2 digits and bounded by the real offset range (−12..+14);
/// minutes, when present, must be exactly two digits below 60.
pub fn parse_offset(s: &str) -> Option<i32> {
    let rest = s.strip_prefix("UTC")?;
    if rest.is_empty() {
        return Some(0);
    }

    let mut chars = rest.chars();
    let sign: i32 = match chars.next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return None,
    };
    let body = chars.as_str();

    let (hour_part, minute_part) = match body.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (body, None),
    };

    if hour_part.is_empty()
        || hour_part.len() > 2
        || !hour_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let hours: i32 = hour_part.parse().ok()?;

    let minutes: i32 = match minute_part {
        Some(m) => {
            if m.len() != 2 || !m.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let value: i32 = m.parse().ok()?;
            if value > 59 {
                return None;
            }
            value
        }
        None => 0,
    };

    let hour_limit = if sign > 0 { 14 } else { 12 };
    if hours > hour_limit {
        return None;
    }

    Some(sign * (hours * 60 + minutes))
}

/// True iff `tz` is an accepted offset literal or a recognised IANA zone.
pub fn validate(tz: &str) -> bool {
    parse_offset(tz).is_some() || tz.parse::<Tz>().is_ok()
}

/// Resolve a stored timezone descriptor. `None`, empty, and unrecognised
/// values all resolve to UTC.
pub fn resolve(tz: Option<&str>) -> EffectiveTz {
    let Some(raw) = tz else {
        return EffectiveTz::Utc;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return EffectiveTz::Utc;
    }

    if let Some(minutes) = parse_offset(raw) {
        return match FixedOffset::east_opt(minutes * 60) {
            Some(offset) => EffectiveTz::Fixed(offset),
            None => EffectiveTz::Utc,
        };
    }

    match raw.parse::<Tz>() {
        Ok(zone) => EffectiveTz::Named(zone),
        Err(_) => EffectiveTz::Utc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn format_offset(hours: i32, minutes: i32) -> String {
        if hours == 0 && minutes == 0 {
            return "UTC".to_string();
        }
        let sign = if hours < 0 { '-' } else { '+' };
        if minutes == 0 {
            format!("UTC{sign}{}", hours.abs())
        } else {
            format!("UTC{sign}{}:{minutes:02}", hours.abs())
        }
    }

    #[test]
    fn bare_utc_is_zero() {
        assert_eq!(parse_offset("UTC"), Some(0));
    }

    #[test]
    fn offset_round_trip() {
        for hours in -12..=14 {
            for minutes in [0, 15, 30, 45] {
                if hours == 0 && minutes != 0 {
                    continue; // format_offset can't express a signless +0:MM
                }
                let formatted = format_offset(hours, minutes);
                let expected = hours * 60 + hours.signum() * minutes;
                assert_eq!(
                    parse_offset(&formatted),
                    Some(expected),
                    "failed for {formatted}"
                );
            }
        }
    }

    #[test]
    fn rejects_malformed_offsets() {
        for bad in [
            "UTC+", "UTC-", "UTC+abc", "UTC+3:5", "UTC+3:60", "UTC+15", "UTC-13", "UTC+123",
            "GMT+3", "utc+3", "UTC 3",
        ] {
            assert_eq!(parse_offset(bad), None, "accepted {bad}");
        }
    }

    #[test]
    fn validate_accepts_iana_and_offsets() {
        assert!(validate("Europe/Moscow"));
        assert!(validate("America/New_York"));
        assert!(validate("UTC-5"));
        assert!(!validate("Mars/Olympus"));
    }

    #[test]
    fn unknown_zone_collapses_to_utc() {
        assert_eq!(resolve(Some("Mars/Olympus")), EffectiveTz::Utc);
        assert_eq!(resolve(Some("")), EffectiveTz::Utc);
        assert_eq!(resolve(None), EffectiveTz::Utc);
    }

    #[test]
    fn fixed_offset_shifts_wall_clock() {
        let tz = resolve(Some("UTC+3"));
        let utc = Utc.with_ymd_and_hms(2025, 1, 15, 4, 0, 0).unwrap();
        let local = tz.local(utc);
        assert_eq!(local.time().hour(), 7);
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn negative_offset_crosses_date_line() {
        let tz = resolve(Some("UTC-5"));
        let utc = Utc.with_ymd_and_hms(2025, 1, 15, 2, 0, 0).unwrap();
        assert_eq!(tz.today(utc), NaiveDate::from_ymd_opt(2025, 1, 14).unwrap());
    }

    #[test]
    fn iana_zone_honours_dst() {
        let tz = resolve(Some("America/New_York"));
        // Winter: UTC-5.
        let winter = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(tz.local(winter).time().hour(), 7);
        // Summer: UTC-4.
        let summer = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(tz.local(summer).time().hour(), 8);
    }
}
