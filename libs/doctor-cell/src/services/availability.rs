// libs/doctor-cell/src/services/availability.rs
use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_utils::TimeInterval;

use crate::directory::DoctorDirectory;
use crate::models::{
    AvailabilityError, ClinicSchedule, ClosedReason, CreateScheduleRequest, DayAvailability,
    DayOfWeek, DoctorSchedule,
};

pub struct AvailabilityService;

impl AvailabilityService {
    pub fn new() -> Self {
        Self
    }

    /// Intersect clinic hours with a doctor's schedule row for the weekday of `date`.
    ///
    /// `schedules` are the doctor's rows for any weekdays; only the matching
    /// weekday is considered. Two rows for that weekday is a data error.
    pub fn effective_window<'a, I>(
        &self,
        clinic: &ClinicSchedule,
        schedules: I,
        date: NaiveDate,
    ) -> Result<DayAvailability, AvailabilityError>
    where
        I: IntoIterator<Item = &'a DoctorSchedule>,
    {
        let day = DayOfWeek::from_date(date);
        debug!("Resolving effective window for {} ({})", date, day);

        let clinic_day = match clinic.day(day) {
            Some(clinic_day) if clinic_day.is_open => clinic_day,
            _ => {
                debug!("Clinic closed on {}", day);
                return Ok(DayAvailability::Closed {
                    day,
                    reason: ClosedReason::ClinicClosed,
                });
            }
        };

        let mut rows = schedules.into_iter().filter(|row| row.day == day);
        let row = match rows.next() {
            Some(row) => row,
            None => {
                return Ok(DayAvailability::Closed {
                    day,
                    reason: ClosedReason::DoctorUnscheduled,
                })
            }
        };

        if rows.next().is_some() {
            warn!("Doctor {} has duplicate schedule rows for {}", row.doctor_id, day);
            return Err(AvailabilityError::DuplicateSchedule {
                doctor_id: row.doctor_id.clone(),
                day,
            });
        }

        let start = clinic_day.start_time.max(row.start_time);
        let end = clinic_day.end_time.min(row.end_time);

        if start >= end {
            debug!(
                "Doctor {} hours {} do not overlap clinic hours {} on {}",
                row.doctor_id,
                row.interval(),
                clinic_day.hours(),
                day
            );
            return Ok(DayAvailability::Closed {
                day,
                reason: ClosedReason::NoOverlap,
            });
        }

        Ok(DayAvailability::Open {
            day,
            window: TimeInterval::new(start, end),
        })
    }

    /// Effective window for a doctor looked up through the directory.
    pub fn doctor_window(
        &self,
        directory: &dyn DoctorDirectory,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<DayAvailability, AvailabilityError> {
        if directory.doctor_by_id(doctor_id).is_none() {
            return Err(AvailabilityError::DoctorNotFound(doctor_id.to_string()));
        }

        self.effective_window(
            directory.clinic_schedule(),
            directory.schedules_by_doctor(doctor_id),
            date,
        )
    }

    /// Whether `interval` lies entirely inside the doctor's effective window on `date`.
    pub fn covers(
        &self,
        directory: &dyn DoctorDirectory,
        doctor_id: &str,
        date: NaiveDate,
        interval: &TimeInterval,
    ) -> Result<bool, AvailabilityError> {
        let availability = self.doctor_window(directory, doctor_id, date)?;
        Ok(availability
            .window()
            .map(|window| window.contains(interval))
            .unwrap_or(false))
    }

    /// Validate a new weekly row against the doctor's existing rows.
    pub fn validate_new_schedule(
        &self,
        existing: &[DoctorSchedule],
        request: CreateScheduleRequest,
    ) -> Result<DoctorSchedule, AvailabilityError> {
        debug!("Validating schedule for doctor {} on {}", request.doctor_id, request.day);

        if request.start_time >= request.end_time {
            return Err(AvailabilityError::InvalidTimeRange {
                start: request.start_time,
                end: request.end_time,
            });
        }

        let taken = existing
            .iter()
            .any(|row| row.doctor_id == request.doctor_id && row.day == request.day);
        if taken {
            return Err(AvailabilityError::DuplicateSchedule {
                doctor_id: request.doctor_id,
                day: request.day,
            });
        }

        Ok(DoctorSchedule {
            id: format!("sch_{}", Uuid::new_v4().simple()),
            doctor_id: request.doctor_id,
            day: request.day,
            start_time: request.start_time,
            end_time: request.end_time,
        })
    }
}

impl Default for AvailabilityService {
    fn default() -> Self {
        Self::new()
    }
}
