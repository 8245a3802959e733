// libs/doctor-cell/src/directory.rs
use crate::models::{ClinicSchedule, Doctor, DoctorSchedule};

/// Read-only view of doctors and opening hours supplied by the persistence layer.
pub trait DoctorDirectory {
    fn doctors(&self) -> &[Doctor];

    fn schedules_by_doctor(&self, doctor_id: &str) -> Vec<&DoctorSchedule>;

    fn clinic_schedule(&self) -> &ClinicSchedule;

    fn doctor_by_id(&self, doctor_id: &str) -> Option<&Doctor> {
        self.doctors().iter().find(|doctor| doctor.id == doctor_id)
    }
}
