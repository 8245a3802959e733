// libs/appointment-cell/src/store.rs
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Appointment, AppointmentError};

/// Where appointments live. Writes are only issued after validation passes.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Appointment>, AppointmentError>;

    async fn get(&self, id: &str) -> Result<Option<Appointment>, AppointmentError>;

    async fn insert(&self, appointment: Appointment) -> Result<(), AppointmentError>;

    /// Overwrite an existing record with the same id.
    async fn replace(&self, appointment: Appointment) -> Result<(), AppointmentError>;
}

#[derive(Debug, Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<Vec<Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: RwLock::new(appointments),
        }
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn list(&self) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.appointments.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Appointment>, AppointmentError> {
        let appointments = self.appointments.read().await;
        Ok(appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, appointment: Appointment) -> Result<(), AppointmentError> {
        let mut appointments = self.appointments.write().await;
        if appointments.iter().any(|a| a.id == appointment.id) {
            return Err(AppointmentError::Storage(format!(
                "Appointment {} already exists",
                appointment.id
            )));
        }

        debug!("Storing appointment {}", appointment.id);
        appointments.push(appointment);
        Ok(())
    }

    async fn replace(&self, appointment: Appointment) -> Result<(), AppointmentError> {
        let mut appointments = self.appointments.write().await;
        match appointments.iter_mut().find(|a| a.id == appointment.id) {
            Some(existing) => {
                *existing = appointment;
                Ok(())
            }
            None => Err(AppointmentError::AppointmentNotFound(appointment.id)),
        }
    }
}
