//! Compact weekly timing codes.
//!
//! A recurring weekly session is stored in the catalog as a nine character
//! code `DSSSSEEEE`: one day digit (1 = Monday .. 5 = Friday) followed by the
//! 24-hour start and end times as zero-padded `HHMM`. A course lists several
//! of these separated by commas, e.g. `"109301100,409301100"`.
//!
//! Times compare as the plain `HHMM` integer (`0930` -> 930), which is the
//! encoding the catalog already uses. They are never converted to minutes.

mod error;
pub mod human;

pub use error::DecodeError;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Length of a single timing code.
pub const CODE_LEN: usize = 9;

/// A teaching day. Weekends cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Maps the catalog day index (1 = Monday .. 5 = Friday).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Day::Monday),
            2 => Some(Day::Tuesday),
            3 => Some(Day::Wednesday),
            4 => Some(Day::Thursday),
            5 => Some(Day::Friday),
            _ => None,
        }
    }

    /// The catalog day index (1 = Monday .. 5 = Friday).
    pub fn index(self) -> u8 {
        match self {
            Day::Monday => 1,
            Day::Tuesday => 2,
            Day::Wednesday => 3,
            Day::Thursday => 4,
            Day::Friday => 5,
        }
    }

    /// Returns `None` for Saturday and Sunday.
    pub fn from_weekday(weekday: chrono::Weekday) -> Option<Self> {
        Self::from_index(weekday.number_from_monday() as u8)
    }

    pub fn weekday(self) -> chrono::Weekday {
        match self {
            Day::Monday => chrono::Weekday::Mon,
            Day::Tuesday => chrono::Weekday::Tue,
            Day::Wednesday => chrono::Weekday::Wed,
            Day::Thursday => chrono::Weekday::Thu,
            Day::Friday => chrono::Weekday::Fri,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A time of day held as the `HHMM` integer (e.g. 9:30 is `930`).
///
/// Ordering is the integer ordering, so `ClockTime` values compare the same
/// way the raw catalog codes do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Builds a clock time from hour and minute, rejecting out-of-range parts.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self(hour as u16 * 100 + minute as u16))
    }

    /// Builds a clock time from its `HHMM` integer value.
    pub fn from_hhmm(value: u16) -> Option<Self> {
        Self::new((value / 100) as u8, (value % 100) as u8)
    }

    pub fn hhmm(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u8 {
        (self.0 / 100) as u8
    }

    pub fn minute(self) -> u8 {
        (self.0 % 100) as u8
    }

    /// Clock time of a `chrono` time value, truncated to the minute.
    pub fn from_time<T: chrono::Timelike>(time: &T) -> Self {
        Self(time.hour() as u16 * 100 + time.minute() as u16)
    }
}

impl FromStr for ClockTime {
    type Err = DecodeError;

    /// Accepts `"0930"` as well as the form-field style `"09:30"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecodeError::InvalidTime {
            text: s.to_string(),
        };
        let trimmed = s.trim();
        let digits = match trimmed.split_once(':') {
            Some((hour, minute)) if hour.len() == 2 && minute.len() == 2 => format!("{hour}{minute}"),
            Some(_) => return Err(invalid()),
            None => trimmed.to_string(),
        };
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u8 = digits[..2].parse().map_err(|_| invalid())?;
        let minute: u8 = digits[2..].parse().map_err(|_| invalid())?;
        ClockTime::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One weekly occurrence of a lecture, tutorial or lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub day: Day,
    pub start: ClockTime,
    pub end: ClockTime,
    #[serde(default)]
    pub location: Option<String>,
}

impl Session {
    pub fn new(day: Day, start: ClockTime, end: ClockTime) -> Self {
        Self {
            day,
            start,
            end,
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// True when the session ends strictly after it starts.
    pub fn has_valid_range(&self) -> bool {
        self.start < self.end
    }

    /// Half-open containment: a session ending exactly at `t` does not hold `t`.
    pub fn covers(&self, day: Day, t: ClockTime) -> bool {
        self.day == day && self.start <= t && t < self.end
    }
}

/// Decodes a single `DSSSSEEEE` timing code.
pub fn decode(code: &str) -> Result<Session, DecodeError> {
    let len = code.chars().count();
    if len != CODE_LEN {
        return Err(DecodeError::MalformedLength { len });
    }

    let mut chars = code.chars();
    let digit = chars.next().unwrap_or_default();
    let day = digit
        .to_digit(10)
        .and_then(|d| Day::from_index(d as u8))
        .ok_or(DecodeError::InvalidDay { digit })?;

    let rest: String = chars.collect();
    if !rest.is_ascii() {
        return Err(DecodeError::InvalidTime { text: rest });
    }
    let start: ClockTime = rest[..4].parse()?;
    let end: ClockTime = rest[4..].parse()?;
    if start >= end {
        return Err(DecodeError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    Ok(Session::new(day, start, end))
}

/// Decodes a comma-separated list of timing codes.
///
/// Blank entries and codes that fail to decode are skipped.
pub fn decode_all(list: &str) -> Vec<Session> {
    list.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .filter_map(|code| match decode(code) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!(code = %code, error = %e, "Skipping undecodable timing code");
                None
            }
        })
        .collect()
}

/// Encodes a session back into its nine character code.
pub fn encode(session: &Session) -> String {
    format!("{}{}{}", session.day.index(), session.start, session.end)
}

/// Encodes several sessions as a comma-separated list.
pub fn encode_all<'a, I>(sessions: I) -> String
where
    I: IntoIterator<Item = &'a Session>,
{
    sessions.into_iter().map(encode).collect::<Vec<_>>().join(",")
}
