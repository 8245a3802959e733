// libs/appointment-cell/src/services/assignment.rs
use chrono::NaiveDate;
use tracing::{debug, info};

use doctor_cell::{AvailabilityService, Doctor, DoctorDirectory};
use shared_utils::{ClockTime, TimeInterval};

use crate::directory::ServiceCatalog;
use crate::models::Appointment;
use crate::services::conflict::ConflictDetectionService;

/// First-fit doctor selection. No ranking or load balancing.
pub struct DoctorAssignmentService<'a> {
    conflicts: ConflictDetectionService<'a>,
    availability: AvailabilityService,
}

impl<'a> DoctorAssignmentService<'a> {
    pub fn new(catalog: &'a dyn ServiceCatalog) -> Self {
        Self {
            conflicts: ConflictDetectionService::new(catalog),
            availability: AvailabilityService::new(),
        }
    }

    /// First doctor, in input order, who is accepting bookings and free for the slot.
    ///
    /// Weekly hours are not consulted; see `find_available_doctor_within_hours`.
    pub fn find_available_doctor<'d>(
        &self,
        date: NaiveDate,
        start: ClockTime,
        duration_minutes: u32,
        doctors: &'d [Doctor],
        appointments: &[Appointment],
        exclude_id: Option<&str>,
    ) -> Option<&'d Doctor> {
        debug!(
            "Scanning {} doctors for {} at {} ({} min)",
            doctors.len(),
            date,
            start,
            duration_minutes
        );

        let found = doctors.iter().find(|doctor| {
            doctor.available
                && self.conflicts.is_slot_free(
                    &doctor.id,
                    date,
                    start,
                    duration_minutes,
                    appointments,
                    exclude_id,
                )
        });

        if let Some(doctor) = found {
            info!("Assigned doctor {} for {} at {}", doctor.id, date, start);
        }
        found
    }

    /// As `find_available_doctor`, but also requires the slot to fit inside the
    /// doctor's effective window for that date.
    pub fn find_available_doctor_within_hours<'d>(
        &self,
        directory: &'d dyn DoctorDirectory,
        date: NaiveDate,
        start: ClockTime,
        duration_minutes: u32,
        appointments: &[Appointment],
        exclude_id: Option<&str>,
    ) -> Option<&'d Doctor> {
        let requested = TimeInterval::starting_at(start, duration_minutes);

        let within_hours: Vec<Doctor> = directory
            .doctors()
            .iter()
            .filter(|doctor| {
                match self.availability.covers(directory, &doctor.id, date, &requested) {
                    Ok(covered) => covered,
                    Err(e) => {
                        debug!("Skipping doctor {}: {}", doctor.id, e);
                        false
                    }
                }
            })
            .cloned()
            .collect();

        let chosen = self.find_available_doctor(
            date,
            start,
            duration_minutes,
            &within_hours,
            appointments,
            exclude_id,
        )?;

        directory.doctor_by_id(&chosen.id)
    }
}
