// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, info, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, UpdateAppointmentRequest};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed.
    ///
    /// Terminal states are reported first, then the pending-to-completed
    /// shortcut, then anything outside the adjacency list.
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status.is_terminal() {
            warn!("Status change attempted on {} appointment", current_status);
            return Err(AppointmentError::Terminal(current_status));
        }

        if current_status == AppointmentStatus::Pending && new_status == AppointmentStatus::Completed {
            warn!("Attempted to complete an unconfirmed appointment");
            return Err(AppointmentError::MustConfirmFirst);
        }

        let valid_transitions = self.get_valid_transitions(current_status);
        if !valid_transitions.contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidTransition {
                from: current_status,
                to: new_status,
                allowed: valid_transitions,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::CancellationRequested,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::CancellationRequested,
            ],
            // Approved or turned down by staff.
            AppointmentStatus::CancellationRequested => vec![
                AppointmentStatus::Cancelled,
                AppointmentStatus::Confirmed,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Apply a validated status change, returning the updated record.
    pub fn transition(
        &self,
        appointment: &Appointment,
        new_status: AppointmentStatus,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Appointment, AppointmentError> {
        self.validate_status_transition(appointment.status, new_status)?;

        info!(
            "Appointment {} status: {} -> {}",
            appointment.id, appointment.status, new_status
        );

        Ok(Appointment {
            status: new_status,
            updated_at: now,
            ..appointment.clone()
        })
    }

    /// Terminal appointments keep their slot details frozen; notes stay editable.
    pub fn ensure_editable(
        &self,
        appointment: &Appointment,
        update: &UpdateAppointmentRequest,
    ) -> Result<(), AppointmentError> {
        if appointment.status.is_terminal() && update.touches_schedule() {
            warn!(
                "Rejected schedule edit on {} appointment {}",
                appointment.status, appointment.id
            );
            return Err(AppointmentError::TerminalAppointmentEdit {
                id: appointment.id.clone(),
                status: appointment.status,
            });
        }
        Ok(())
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
