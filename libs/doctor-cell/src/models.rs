// libs/doctor-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use shared_utils::{ClockTime, TimeInterval};

// ==============================================================================
// CORE DOCTOR MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    /// Globally disables new bookings regardless of the weekly schedule.
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    #[serde(alias = "monday")]
    Monday,
    #[serde(alias = "tuesday")]
    Tuesday,
    #[serde(alias = "wednesday")]
    Wednesday,
    #[serde(alias = "thursday")]
    Thursday,
    #[serde(alias = "friday")]
    Friday,
    #[serde(alias = "saturday")]
    Saturday,
    #[serde(alias = "sunday")]
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Weekday of a calendar date. `NaiveDate` carries no timezone, so this never shifts a day.
    pub fn from_date(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn name(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One weekly working-hours row for a doctor. At most one row per weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub id: String,
    pub doctor_id: String,
    pub day: DayOfWeek,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl DoctorSchedule {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub doctor_id: String,
    pub day: DayOfWeek,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

// ==============================================================================
// CLINIC HOURS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicDay {
    pub is_open: bool,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default)]
    pub break_start_time: Option<ClockTime>,
    #[serde(default)]
    pub break_end_time: Option<ClockTime>,
}

impl ClinicDay {
    pub fn open(start_time: ClockTime, end_time: ClockTime) -> Self {
        Self {
            is_open: true,
            start_time,
            end_time,
            break_start_time: None,
            break_end_time: None,
        }
    }

    pub fn closed() -> Self {
        Self {
            is_open: false,
            ..Self::open(ClockTime::from_hm(9, 0), ClockTime::from_hm(18, 0))
        }
    }

    pub fn with_break(mut self, start: ClockTime, end: ClockTime) -> Self {
        self.break_start_time = Some(start);
        self.break_end_time = Some(end);
        self
    }

    pub fn hours(&self) -> TimeInterval {
        TimeInterval::new(self.start_time, self.end_time)
    }

    /// Whether `slot` touches the break. Boundaries count as touching, so a
    /// slot ending exactly when the break starts is rejected too.
    pub fn overlaps_break(&self, slot: &TimeInterval) -> bool {
        match (self.break_start_time, self.break_end_time) {
            (Some(break_start), Some(break_end)) => {
                slot.start <= break_end && slot.end >= break_start
            }
            _ => false,
        }
    }
}

/// Weekly opening hours keyed by weekday. A missing weekday counts as closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClinicSchedule {
    pub days: BTreeMap<DayOfWeek, ClinicDay>,
}

impl ClinicSchedule {
    pub fn day(&self, day: DayOfWeek) -> Option<&ClinicDay> {
        self.days.get(&day)
    }

    pub fn is_open_on(&self, day: DayOfWeek) -> bool {
        self.day(day).map(|d| d.is_open).unwrap_or(false)
    }
}

impl Default for ClinicSchedule {
    /// Monday to Saturday 09:00-18:00 with a 12:00-13:00 break; closed Sunday.
    fn default() -> Self {
        let weekday = ClinicDay::open(ClockTime::from_hm(9, 0), ClockTime::from_hm(18, 0))
            .with_break(ClockTime::from_hm(12, 0), ClockTime::from_hm(13, 0));

        let days = DayOfWeek::ALL
            .iter()
            .map(|day| {
                let hours = if *day == DayOfWeek::Sunday {
                    ClinicDay {
                        is_open: false,
                        ..weekday.clone()
                    }
                } else {
                    weekday.clone()
                };
                (*day, hours)
            })
            .collect();

        Self { days }
    }
}

// ==============================================================================
// AVAILABILITY RESULTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedReason {
    ClinicClosed,
    DoctorUnscheduled,
    NoOverlap,
}

impl fmt::Display for ClosedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosedReason::ClinicClosed => write!(f, "clinic is closed"),
            ClosedReason::DoctorUnscheduled => write!(f, "doctor has no schedule"),
            ClosedReason::NoOverlap => write!(f, "doctor hours fall outside clinic hours"),
        }
    }
}

/// A doctor's bookable hours on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DayAvailability {
    Open {
        day: DayOfWeek,
        window: TimeInterval,
    },
    Closed {
        day: DayOfWeek,
        reason: ClosedReason,
    },
}

impl DayAvailability {
    pub fn window(&self) -> Option<TimeInterval> {
        match self {
            DayAvailability::Open { window, .. } => Some(*window),
            DayAvailability::Closed { .. } => None,
        }
    }

    pub fn day(&self) -> DayOfWeek {
        match self {
            DayAvailability::Open { day, .. } | DayAvailability::Closed { day, .. } => *day,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, DayAvailability::Open { .. })
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Doctor {doctor_id} has more than one schedule row for {day}")]
    DuplicateSchedule { doctor_id: String, day: DayOfWeek },

    #[error("Start time {start} must be before end time {end}")]
    InvalidTimeRange { start: ClockTime, end: ClockTime },
}
