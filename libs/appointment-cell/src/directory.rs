// libs/appointment-cell/src/directory.rs
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use doctor_cell::{
    AvailabilityError, AvailabilityService, ClinicSchedule, CreateScheduleRequest, Doctor,
    DoctorDirectory, DoctorSchedule,
};
use shared_models::{Patient, Promotion, Service};

use crate::models::{Appointment, AppointmentError};

/// Read-only lookups for the service and promotion catalog.
pub trait ServiceCatalog {
    fn service_by_id(&self, id: &str) -> Option<&Service>;
    fn promotion_by_id(&self, id: &str) -> Option<&Promotion>;
}

pub trait PatientLookup {
    fn patient_by_id(&self, id: &str) -> Option<&Patient>;
}

// ==============================================================================
// IN-MEMORY DIRECTORY
// ==============================================================================

/// Everything the scheduler reads but never writes, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicDirectory {
    #[serde(default)]
    pub doctors: Vec<Doctor>,
    #[serde(default)]
    pub schedules: Vec<DoctorSchedule>,
    #[serde(default)]
    pub clinic_schedule: ClinicSchedule,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub promotions: Vec<Promotion>,
    #[serde(default)]
    pub patients: Vec<Patient>,
}

impl ClinicDirectory {
    pub fn from_json_str(raw: &str) -> Result<Self, AppointmentError> {
        let directory: Self = serde_json::from_str(raw)
            .map_err(|e| AppointmentError::Validation(format!("Invalid clinic directory: {}", e)))?;
        directory.validate()?;
        Ok(directory)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppointmentError> {
        let raw = read_file(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Reject schedule tables with more than one row per doctor and weekday.
    pub fn validate(&self) -> Result<(), AppointmentError> {
        let mut seen = BTreeSet::new();
        for row in &self.schedules {
            if !seen.insert((row.doctor_id.as_str(), row.day)) {
                return Err(AvailabilityError::DuplicateSchedule {
                    doctor_id: row.doctor_id.clone(),
                    day: row.day,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Add a weekly row after checking its range and that the weekday is still free.
    pub fn add_schedule(
        &mut self,
        request: CreateScheduleRequest,
    ) -> Result<&DoctorSchedule, AppointmentError> {
        if self.doctor_by_id(&request.doctor_id).is_none() {
            return Err(AppointmentError::DoctorNotFound(request.doctor_id));
        }

        let row = AvailabilityService::new().validate_new_schedule(&self.schedules, request)?;
        info!("Added {} schedule for doctor {}", row.day, row.doctor_id);
        self.schedules.push(row);

        let last = self.schedules.len() - 1;
        Ok(&self.schedules[last])
    }
}

impl DoctorDirectory for ClinicDirectory {
    fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    fn schedules_by_doctor(&self, doctor_id: &str) -> Vec<&DoctorSchedule> {
        self.schedules
            .iter()
            .filter(|row| row.doctor_id == doctor_id)
            .collect()
    }

    fn clinic_schedule(&self) -> &ClinicSchedule {
        &self.clinic_schedule
    }
}

impl ServiceCatalog for ClinicDirectory {
    fn service_by_id(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    fn promotion_by_id(&self, id: &str) -> Option<&Promotion> {
        self.promotions.iter().find(|p| p.id == id)
    }
}

impl PatientLookup for ClinicDirectory {
    fn patient_by_id(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }
}

// ==============================================================================
// SNAPSHOT
// ==============================================================================

/// A directory plus the current appointment list, as exported by the clinic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicSnapshot {
    #[serde(flatten)]
    pub directory: ClinicDirectory,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

impl ClinicSnapshot {
    pub fn from_json_str(raw: &str) -> Result<Self, AppointmentError> {
        let snapshot: Self = serde_json::from_str(raw)
            .map_err(|e| AppointmentError::Validation(format!("Invalid clinic snapshot: {}", e)))?;
        snapshot.directory.validate()?;

        debug!(
            "Loaded snapshot: {} doctors, {} services, {} appointments",
            snapshot.directory.doctors.len(),
            snapshot.directory.services.len(),
            snapshot.appointments.len()
        );
        Ok(snapshot)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppointmentError> {
        let raw = read_file(path.as_ref())?;
        Self::from_json_str(&raw)
    }
}

fn read_file(path: &Path) -> Result<String, AppointmentError> {
    fs::read_to_string(path)
        .map_err(|e| AppointmentError::Storage(format!("Cannot read {}: {}", path.display(), e)))
}
