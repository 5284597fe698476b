//! Parser for the registrar's human readable timing text.
//!
//! The published course list writes timings as `"MTh 09:30-11:00"`, possibly
//! several groups separated by commas. Day letters are `M T W Th F` (with
//! `Th` taking precedence over `T`); `S`/`Su` also occur but weekend
//! sessions have no timing code and are dropped.

use super::{ClockTime, Day, Session};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static GROUP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z]+)\s+(\d{1,2}:\d{2})\s*-\s*(\d{1,2}:\d{2})").unwrap()
});

/// Parses timing text into sessions, one per day letter per group.
pub fn parse_timing_text(text: &str) -> Vec<Session> {
    let mut sessions = Vec::new();

    for group in text.split(',').map(str::trim).filter(|g| !g.is_empty()) {
        let Some(caps) = GROUP_REGEX.captures(group) else {
            debug!(group = %group, "Timing group not understood");
            continue;
        };

        let (Some(start), Some(end)) = (parse_clock(&caps[2]), parse_clock(&caps[3])) else {
            debug!(group = %group, "Timing group has an invalid clock time");
            continue;
        };
        if start >= end {
            debug!(group = %group, "Timing group ends before it starts");
            continue;
        }

        for day in parse_day_letters(&caps[1]) {
            sessions.push(Session::new(day, start, end));
        }
    }

    sessions
}

/// Splits a run of day letters such as `"MWTh"` into teaching days.
fn parse_day_letters(letters: &str) -> Vec<Day> {
    let chars: Vec<char> = letters.chars().collect();
    let mut days = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (day, width) = match (chars[i], chars.get(i + 1)) {
            ('T', Some('h')) => (Some(Day::Thursday), 2),
            ('S', Some('u')) => (None, 2),
            ('M', _) => (Some(Day::Monday), 1),
            ('T', _) => (Some(Day::Tuesday), 1),
            ('W', _) => (Some(Day::Wednesday), 1),
            ('F', _) => (Some(Day::Friday), 1),
            _ => (None, 1),
        };
        match day {
            Some(day) => days.push(day),
            None => debug!(letters = %letters, index = i, "Ignoring non-teaching day letter"),
        }
        i += width;
    }

    days
}

/// Parses `"9:30"` or `"09:30"`.
fn parse_clock(text: &str) -> Option<ClockTime> {
    let (hour, minute) = text.split_once(':')?;
    ClockTime::new(hour.parse().ok()?, minute.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::encode_all;

    #[test]
    fn test_thursday_is_not_tuesday() {
        let sessions = parse_timing_text("MTh 09:30-11:00");
        assert_eq!(encode_all(&sessions), "109301100,409301100");
    }

    #[test]
    fn test_multiple_groups_and_single_digit_hours() {
        let sessions = parse_timing_text("TWF 8:00-8:50, Th 14:00-16:00");
        assert_eq!(
            encode_all(&sessions),
            "208000850,308000850,508000850,414001600"
        );
    }

    #[test]
    fn test_weekend_and_garbage_are_dropped() {
        assert_eq!(encode_all(&parse_timing_text("MS 10:00-11:00")), "110001100");
        assert!(parse_timing_text("Su 10:00-11:00").is_empty());
        assert!(parse_timing_text("TBA").is_empty());
        assert!(parse_timing_text("M 11:00-10:00").is_empty());
        assert!(parse_timing_text("").is_empty());
    }
}
