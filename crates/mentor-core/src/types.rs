//! Wire conventions shared by the store and the scheduler: `HH:MM` reminder
//! times, `Mon..Sun` day masks, todo priorities.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// A wall-clock minute in the `HH:MM` wire format (24-hour, zero-padded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Minute-window match: same hour, minute within ±1. This is the firing
    /// predicate for every scheduled job; paired with the minute-granularity
    /// tick and the dedup cache it yields at-most-once-per-day sends.
    pub fn matches(&self, local: NaiveTime) -> bool {
        local.hour() == self.hour as u32
            && (local.minute() as i32 - self.minute as i32).abs() <= 1
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| format!("bad time (expected HH:MM): {s}"))?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(format!("bad time (expected HH:MM): {s}"));
        }
        let hour: u8 = h.parse().map_err(|_| format!("bad hour in: {s}"))?;
        let minute: u8 = m.parse().map_err(|_| format!("bad minute in: {s}"))?;
        if hour > 23 || minute > 59 {
            return Err(format!("time out of range: {s}"));
        }
        Ok(Self { hour, minute })
    }
}

/// Seven-day selection mask, stored as a 7-char `"0"`/`"1"` string with
/// Monday at index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayMask([bool; 7]);

impl DayMask {
    pub fn new(days: [bool; 7]) -> Self {
        Self(days)
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0[day.num_days_from_monday() as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|d| *d)
    }
}

impl fmt::Display for DayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for day in self.0 {
            f.write_str(if day { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for DayMask {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.len() != 7 {
            return Err(format!("day mask must be 7 chars: {s}"));
        }
        let mut days = [false; 7];
        for (i, c) in s.chars().enumerate() {
            days[i] = match c {
                '1' => true,
                '0' => false,
                other => return Err(format!("bad day mask char: {other}")),
            };
        }
        Ok(Self(days))
    }
}

/// Todo priority. Ordering is by urgency: `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_parses_and_prints() {
        let t: ClockTime = "07:05".parse().unwrap();
        assert_eq!(t, ClockTime::new(7, 5));
        assert_eq!(t.to_string(), "07:05");
    }

    #[test]
    fn clock_time_rejects_garbage() {
        for bad in ["7", "07:5", "24:00", "07:60", "ab:cd", ""] {
            assert!(bad.parse::<ClockTime>().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn minute_window_is_plus_minus_one_within_hour() {
        let target = ClockTime::new(7, 0);
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert!(target.matches(t(7, 0)));
        assert!(target.matches(t(7, 1)));
        // 06:59 is in the previous hour — the window never crosses hours.
        assert!(!target.matches(t(6, 59)));
        assert!(!target.matches(t(7, 2)));
        assert!(!target.matches(t(8, 0)));
    }

    #[test]
    fn day_mask_round_trip() {
        let mask: DayMask = "0010001".parse().unwrap();
        assert!(mask.contains(Weekday::Wed));
        assert!(mask.contains(Weekday::Sun));
        assert!(!mask.contains(Weekday::Mon));
        assert_eq!(mask.to_string(), "0010001");
    }

    #[test]
    fn priority_orders_by_urgency() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
    }
}
