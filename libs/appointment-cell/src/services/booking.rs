// libs/appointment-cell/src/services/booking.rs
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::{AvailabilityService, DayAvailability, DayOfWeek, DoctorDirectory};
use shared_utils::TimeInterval;

use crate::directory::ServiceCatalog;
use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, BookingRules,
    ServiceRef, UpdateAppointmentRequest,
};
use crate::services::assignment::DoctorAssignmentService;
use crate::services::capacity::CapacityService;
use crate::services::conflict::ConflictDetectionService;
use crate::services::duration::DurationService;
use crate::services::lifecycle::AppointmentLifecycleService;

/// Validates bookings, reschedules and status changes against an in-memory
/// appointment list. Nothing here writes; callers persist the returned record.
pub struct BookingService<'a> {
    doctors: &'a dyn DoctorDirectory,
    catalog: &'a dyn ServiceCatalog,
    rules: &'a BookingRules,
    availability: AvailabilityService,
    lifecycle: AppointmentLifecycleService,
}

impl<'a> BookingService<'a> {
    pub fn new(
        doctors: &'a dyn DoctorDirectory,
        catalog: &'a dyn ServiceCatalog,
        rules: &'a BookingRules,
    ) -> Self {
        Self {
            doctors,
            catalog,
            rules,
            availability: AvailabilityService::new(),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Check a new booking and build the appointment to store.
    ///
    /// Order of checks: booking window, services, doctor and weekly hours,
    /// overlap, slot cap, day cap.
    pub fn validate_and_create(
        &self,
        request: &BookAppointmentRequest,
        appointments: &[Appointment],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Validating booking on {} at {} for doctor {:?}",
            request.date, request.time, request.doctor_id
        );

        let capacity = CapacityService::new(self.rules);
        capacity.check_booking_window(request.date, today)?;

        let duration = DurationService::new(self.catalog).booking_duration(&request.services)?;
        let requested = TimeInterval::starting_at(request.time, duration);

        let doctor_id = match &request.doctor_id {
            Some(doctor_id) => {
                let doctor = self
                    .doctors
                    .doctor_by_id(doctor_id)
                    .ok_or_else(|| AppointmentError::DoctorNotFound(doctor_id.clone()))?;
                if !doctor.available {
                    warn!("Doctor {} is not accepting bookings", doctor_id);
                    return Err(AppointmentError::DoctorUnavailable(doctor_id.clone()));
                }

                self.ensure_within_hours(doctor_id, request.date, requested)?;
                ConflictDetectionService::new(self.catalog).ensure_slot_free(
                    doctor_id,
                    request.date,
                    requested,
                    appointments,
                    None,
                )?;
                doctor_id.clone()
            }
            None => {
                self.ensure_outside_break(request.date, requested)
                    .map_err(|_| AppointmentError::NoDoctorAvailable {
                        date: request.date,
                        time: request.time,
                    })?;
                DoctorAssignmentService::new(self.catalog)
                    .find_available_doctor_within_hours(
                        self.doctors,
                        request.date,
                        request.time,
                        duration,
                        appointments,
                        None,
                    )
                    .map(|doctor| doctor.id.clone())
                    .ok_or(AppointmentError::NoDoctorAvailable {
                        date: request.date,
                        time: request.time,
                    })?
            }
        };

        capacity.check_capacity(request.date, request.time, appointments, None)?;

        let appointment = Appointment {
            id: format!("apt_{}", Uuid::new_v4().simple()),
            patient: request.patient.clone(),
            doctor_id,
            date: request.date,
            time: request.time,
            services: request.services.clone(),
            service_name: self.service_names(&request.services),
            status: request.origin.initial_status(),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        info!(
            "Booked appointment {} with doctor {} on {} at {} ({} min, {})",
            appointment.id,
            appointment.doctor_id,
            appointment.date,
            requested,
            duration,
            appointment.status
        );
        Ok(appointment)
    }

    /// Check an edit of an existing appointment and build the updated record.
    ///
    /// Capacity and booking-window limits apply at creation only.
    pub fn validate_and_update(
        &self,
        existing: &Appointment,
        update: &UpdateAppointmentRequest,
        appointments: &[Appointment],
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        self.lifecycle.ensure_editable(existing, update)?;

        let mut updated = existing.clone();
        if let Some(notes) = &update.notes {
            updated.notes = Some(notes.clone());
        }
        updated.updated_at = now;

        if !update.touches_schedule() {
            debug!("Appointment {} updated without schedule changes", existing.id);
            return Ok(updated);
        }

        if let Some(doctor_id) = &update.doctor_id {
            let doctor = self
                .doctors
                .doctor_by_id(doctor_id)
                .ok_or_else(|| AppointmentError::DoctorNotFound(doctor_id.clone()))?;
            if doctor_id != &existing.doctor_id && !doctor.available {
                return Err(AppointmentError::DoctorUnavailable(doctor_id.clone()));
            }
            updated.doctor_id = doctor_id.clone();
        }
        if let Some(date) = update.date {
            updated.date = date;
        }
        if let Some(time) = update.time {
            updated.time = time;
        }

        let durations = DurationService::new(self.catalog);
        let duration = match &update.services {
            Some(services) => {
                let minutes = durations.booking_duration(services)?;
                updated.services = services.clone();
                updated.service_name = self.service_names(services);
                minutes
            }
            None => durations.appointment_duration(existing),
        };

        let requested = TimeInterval::starting_at(updated.time, duration);
        self.ensure_within_hours(&updated.doctor_id, updated.date, requested)?;
        ConflictDetectionService::new(self.catalog).ensure_slot_free(
            &updated.doctor_id,
            updated.date,
            requested,
            appointments,
            Some(&existing.id),
        )?;

        info!(
            "Rescheduled appointment {} to doctor {} on {} at {}",
            updated.id, updated.doctor_id, updated.date, requested
        );
        Ok(updated)
    }

    pub fn validate_and_transition_status(
        &self,
        appointment: &Appointment,
        new_status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        self.lifecycle.transition(appointment, new_status, now)
    }

    fn ensure_within_hours(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        requested: TimeInterval,
    ) -> Result<(), AppointmentError> {
        let outside = |reason: String| {
            warn!("Rejecting {} for doctor {} on {}: {}", requested, doctor_id, date, reason);
            AppointmentError::OutsideAvailability {
                doctor_id: doctor_id.to_string(),
                date,
                requested,
                reason,
            }
        };

        match self.availability.doctor_window(self.doctors, doctor_id, date)? {
            DayAvailability::Closed { reason, .. } => Err(outside(reason.to_string())),
            DayAvailability::Open { window, .. } if !window.contains(&requested) => {
                Err(outside(format!("outside working hours {}", window)))
            }
            DayAvailability::Open { .. } => self
                .ensure_outside_break(date, requested)
                .map_err(outside),
        }
    }

    fn ensure_outside_break(&self, date: NaiveDate, requested: TimeInterval) -> Result<(), String> {
        if !self.rules.enforce_break_times {
            return Ok(());
        }

        match self.doctors.clinic_schedule().day(DayOfWeek::from_date(date)) {
            Some(day) if day.overlaps_break(&requested) => {
                Err("overlaps the clinic break".to_string())
            }
            _ => Ok(()),
        }
    }

    fn service_names(&self, services: &[ServiceRef]) -> Option<String> {
        let names: Vec<&str> = services
            .iter()
            .filter_map(|service_ref| match service_ref {
                ServiceRef::Service(id) => self.catalog.service_by_id(id).map(|s| s.name.as_str()),
                ServiceRef::Promotion(id) => {
                    self.catalog.promotion_by_id(id).map(|p| p.name.as_str())
                }
            })
            .collect();

        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }
}
