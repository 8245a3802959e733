// libs/appointment-cell/src/services/capacity.rs
use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

use shared_utils::ClockTime;

use crate::models::{Appointment, AppointmentError, BookingRules};

/// Booking-window and chair-capacity checks, applied when an appointment is created.
pub struct CapacityService<'a> {
    rules: &'a BookingRules,
}

impl<'a> CapacityService<'a> {
    pub fn new(rules: &'a BookingRules) -> Self {
        Self { rules }
    }

    /// Last date that can currently be booked.
    pub fn latest_bookable_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(u64::from(self.rules.booking_horizon_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn check_booking_window(
        &self,
        requested: NaiveDate,
        today: NaiveDate,
    ) -> Result<(), AppointmentError> {
        if requested < today {
            warn!("Rejecting booking for past date {} (today {})", requested, today);
            return Err(AppointmentError::PastDate { requested, today });
        }

        let latest = self.latest_bookable_date(today);
        if requested > latest {
            warn!("Rejecting booking for {}: beyond {}", requested, latest);
            return Err(AppointmentError::BeyondHorizon {
                requested,
                latest,
                horizon_days: self.rules.booking_horizon_days,
            });
        }

        Ok(())
    }

    /// Slot cap counts every active appointment at the same date and time,
    /// whichever doctor it belongs to; the day cap counts the whole date.
    pub fn check_capacity(
        &self,
        date: NaiveDate,
        time: ClockTime,
        appointments: &[Appointment],
        exclude_id: Option<&str>,
    ) -> Result<(), AppointmentError> {
        let active_that_day: Vec<&Appointment> = appointments
            .iter()
            .filter(|a| Some(a.id.as_str()) != exclude_id)
            .filter(|a| a.occupies_slot() && a.date == date)
            .collect();

        let in_slot = active_that_day.iter().filter(|a| a.time == time).count();
        debug!(
            "Capacity on {}: {} in {} slot, {} that day",
            date,
            in_slot,
            time,
            active_that_day.len()
        );

        if in_slot >= self.rules.max_appointments_per_slot {
            warn!("Slot {} on {} is full", time, date);
            return Err(AppointmentError::SlotFull {
                date,
                time,
                cap: self.rules.max_appointments_per_slot,
            });
        }

        if active_that_day.len() >= self.rules.max_appointments_per_day {
            warn!("{} is fully booked", date);
            return Err(AppointmentError::DayFull {
                date,
                cap: self.rules.max_appointments_per_day,
            });
        }

        Ok(())
    }
}
