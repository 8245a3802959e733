// libs/appointment-cell/src/services/slots.rs
use chrono::NaiveDate;
use tracing::debug;

use doctor_cell::{AvailabilityService, DayAvailability, DayOfWeek, DoctorDirectory};
use shared_utils::{generate_slots, TimeInterval};

use crate::directory::ServiceCatalog;
use crate::models::{Appointment, AppointmentError, BookingRules, SlotListing};
use crate::services::conflict::ConflictDetectionService;

pub struct SlotService<'a> {
    conflicts: ConflictDetectionService<'a>,
    availability: AvailabilityService,
    rules: &'a BookingRules,
}

impl<'a> SlotService<'a> {
    pub fn new(catalog: &'a dyn ServiceCatalog, rules: &'a BookingRules) -> Self {
        Self {
            conflicts: ConflictDetectionService::new(catalog),
            availability: AvailabilityService::new(),
            rules,
        }
    }

    /// Start times on `date` where a `duration_minutes` booking fits the doctor's
    /// effective window and overlaps nothing already booked.
    pub fn available_slots(
        &self,
        directory: &dyn DoctorDirectory,
        doctor_id: &str,
        date: NaiveDate,
        duration_minutes: u32,
        appointments: &[Appointment],
        exclude_id: Option<&str>,
    ) -> Result<SlotListing, AppointmentError> {
        let doctor = directory
            .doctor_by_id(doctor_id)
            .ok_or_else(|| AppointmentError::DoctorNotFound(doctor_id.to_string()))?;
        if !doctor.available {
            return Err(AppointmentError::DoctorUnavailable(doctor_id.to_string()));
        }

        let window = match self.availability.doctor_window(directory, doctor_id, date)? {
            DayAvailability::Open { window, .. } => window,
            DayAvailability::Closed { reason, .. } => {
                debug!("No slots for doctor {} on {}: {}", doctor_id, date, reason);
                return Ok(SlotListing::Closed { reason });
            }
        };

        let clinic_day = directory
            .clinic_schedule()
            .day(DayOfWeek::from_date(date))
            .filter(|_| self.rules.enforce_break_times);

        let slots = generate_slots(window.start, window.end, self.rules.slot_interval_minutes)
            .into_iter()
            .filter(|start| {
                let candidate = TimeInterval::starting_at(*start, duration_minutes);
                window.contains(&candidate)
                    && !clinic_day
                        .map(|day| day.overlaps_break(&candidate))
                        .unwrap_or(false)
                    && self.conflicts.is_slot_free(
                        doctor_id,
                        date,
                        *start,
                        duration_minutes,
                        appointments,
                        exclude_id,
                    )
            })
            .collect::<Vec<_>>();

        debug!(
            "Doctor {} has {} free slot(s) on {} within {}",
            doctor_id,
            slots.len(),
            date,
            window
        );

        Ok(SlotListing::Open {
            window,
            duration_minutes,
            slots,
        })
    }
}
