// libs/shared/utils/src/clock.rs
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const MINUTES_PER_HOUR: u32 = 60;
const MINUTES_PER_DAY: u32 = 24 * MINUTES_PER_HOUR;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Invalid clock time {0:?}: expected HH:MM")]
    InvalidFormat(String),

    #[error("Invalid clock time {0:?}: minutes must be between 00 and 59")]
    MinuteOutOfRange(String),
}

/// Wall-clock time of day with minute granularity, rendered as zero-padded `HH:MM`.
///
/// Values past `23:59` are representable: adding minutes never wraps, so an
/// appointment running over midnight renders as e.g. `25:30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    minutes: u32,
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime { minutes: 0 };

    pub fn from_hm(hours: u32, minutes: u32) -> Self {
        Self {
            minutes: hours * MINUTES_PER_HOUR + minutes,
        }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    /// Parse `HH:MM`, also accepting a trailing `:SS` which is discarded.
    pub fn parse(raw: &str) -> Result<Self, ClockError> {
        let trimmed = raw.trim();
        let mut parts = trimmed.split(':');

        let hours = parts.next().and_then(parse_digits);
        let minutes = parts.next().and_then(parse_digits);
        let seconds_ok = match parts.next() {
            None => true,
            Some(seconds) => parse_digits(seconds).is_some(),
        };

        match (hours, minutes) {
            (Some(h), Some(m)) if seconds_ok && parts.next().is_none() => {
                if m >= MINUTES_PER_HOUR {
                    return Err(ClockError::MinuteOutOfRange(raw.to_string()));
                }
                Ok(Self::from_hm(h, m))
            }
            _ => Err(ClockError::InvalidFormat(raw.to_string())),
        }
    }

    pub fn minutes_since_midnight(self) -> u32 {
        self.minutes
    }

    pub fn hour(self) -> u32 {
        self.minutes / MINUTES_PER_HOUR
    }

    pub fn minute(self) -> u32 {
        self.minutes % MINUTES_PER_HOUR
    }

    pub fn add_minutes(self, minutes: u32) -> Self {
        Self {
            minutes: self.minutes.saturating_add(minutes),
        }
    }

    /// True once the value has rolled past `23:59`.
    pub fn is_past_midnight(self) -> bool {
        self.minutes >= MINUTES_PER_DAY
    }
}

fn parse_digits(part: &str) -> Option<u32> {
    if part.is_empty() || part.len() > 3 || !part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
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
        ClockTime::parse(&raw).map_err(de::Error::custom)
    }
}

/// Half-open `[start, end)` interval on a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeInterval {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    pub fn starting_at(start: ClockTime, duration_minutes: u32) -> Self {
        Self {
            start,
            end: start.add_minutes(duration_minutes),
        }
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end
            .minutes_since_midnight()
            .saturating_sub(self.start.minutes_since_midnight())
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

pub fn add_minutes(time: ClockTime, minutes: u32) -> ClockTime {
    time.add_minutes(minutes)
}

/// Every slot `start, start + interval, ...` strictly before `end`.
///
/// A zero interval yields no slots.
pub fn generate_slots(start: ClockTime, end: ClockTime, interval_minutes: u32) -> Vec<ClockTime> {
    if interval_minutes == 0 {
        return Vec::new();
    }

    let mut slots = Vec::new();
    let mut current = start;
    while current < end {
        slots.push(current);
        current = current.add_minutes(interval_minutes);
    }
    slots
}
