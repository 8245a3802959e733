// libs/appointment-cell/src/services/conflict.rs
use chrono::NaiveDate;
use tracing::{debug, warn};

use shared_utils::{ClockTime, TimeInterval};

use crate::directory::ServiceCatalog;
use crate::models::{
    Appointment, AppointmentError, ConflictCheckResponse, ConflictingAppointment,
};
use crate::services::duration::DurationService;

pub struct ConflictDetectionService<'a> {
    durations: DurationService<'a>,
}

impl<'a> ConflictDetectionService<'a> {
    pub fn new(catalog: &'a dyn ServiceCatalog) -> Self {
        Self {
            durations: DurationService::new(catalog),
        }
    }

    /// `[start, start + duration)` for an existing appointment, using its own services.
    pub fn occupied_interval(&self, appointment: &Appointment) -> TimeInterval {
        TimeInterval::starting_at(
            appointment.time,
            self.durations.appointment_duration(appointment),
        )
    }

    /// Whether two appointments block each other. Symmetric in its arguments.
    pub fn appointments_overlap(&self, first: &Appointment, second: &Appointment) -> bool {
        if first.id == second.id
            || !first.occupies_slot()
            || !second.occupies_slot()
            || !first.is_on(&second.doctor_id, second.date)
        {
            return false;
        }

        self.occupied_interval(first)
            .overlaps(&self.occupied_interval(second))
    }

    /// Every active appointment of `doctor_id` on `date` that overlaps `requested`.
    pub fn check_conflicts(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        requested: TimeInterval,
        appointments: &[Appointment],
        exclude_id: Option<&str>,
    ) -> ConflictCheckResponse {
        debug!(
            "Checking conflicts for doctor {} on {} at {} against {} appointments",
            doctor_id,
            date,
            requested,
            appointments.len()
        );

        let conflicting_appointments: Vec<ConflictingAppointment> = appointments
            .iter()
            .filter(|a| Some(a.id.as_str()) != exclude_id)
            .filter(|a| a.occupies_slot() && a.is_on(doctor_id, date))
            .filter_map(|a| {
                let interval = self.occupied_interval(a);
                interval.overlaps(&requested).then(|| ConflictingAppointment {
                    appointment_id: a.id.clone(),
                    status: a.status,
                    interval,
                })
            })
            .collect();

        let has_conflict = !conflicting_appointments.is_empty();
        if has_conflict {
            debug!(
                "Doctor {} has {} conflicting appointment(s) at {}",
                doctor_id,
                conflicting_appointments.len(),
                requested
            );
        }

        ConflictCheckResponse {
            requested,
            has_conflict,
            conflicting_appointments,
        }
    }

    pub fn is_slot_free(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        start: ClockTime,
        duration_minutes: u32,
        appointments: &[Appointment],
        exclude_id: Option<&str>,
    ) -> bool {
        let requested = TimeInterval::starting_at(start, duration_minutes);
        !self
            .check_conflicts(doctor_id, date, requested, appointments, exclude_id)
            .has_conflict
    }

    /// Like `is_slot_free`, but names the first appointment in the way.
    pub fn ensure_slot_free(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        requested: TimeInterval,
        appointments: &[Appointment],
        exclude_id: Option<&str>,
    ) -> Result<(), AppointmentError> {
        let response = self.check_conflicts(doctor_id, date, requested, appointments, exclude_id);

        match response.conflicting_appointments.into_iter().next() {
            None => Ok(()),
            Some(conflict) => {
                warn!(
                    "Rejecting {} for doctor {} on {}: overlaps {}",
                    requested, doctor_id, date, conflict.appointment_id
                );
                Err(AppointmentError::Overlap {
                    doctor_id: doctor_id.to_string(),
                    conflicting_id: conflict.appointment_id,
                    requested,
                    existing: conflict.interval,
                })
            }
        }
    }
}
