// libs/appointment-cell/src/services/consistency.rs
//
// Serializes read-validate-write sequences so two concurrent bookings can never
// both pass validation against the same stale appointment list.
//

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use doctor_cell::DoctorDirectory;
use shared_utils::local_today;

use crate::directory::ServiceCatalog;
use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, BookingRules,
    UpdateAppointmentRequest,
};
use crate::services::booking::BookingService;
use crate::store::AppointmentStore;

/// Runs every write under a per-date lock.
///
/// The slot and day caps count appointments across all doctors, so the date is
/// the narrowest key that keeps both caps and per-doctor overlaps consistent.
pub struct SchedulingConsistencyService<D> {
    directory: Arc<D>,
    store: Arc<dyn AppointmentStore>,
    rules: BookingRules,
    date_locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
    fixed_today: Option<NaiveDate>,
}

impl<D> SchedulingConsistencyService<D>
where
    D: DoctorDirectory + ServiceCatalog + Send + Sync,
{
    pub fn new(directory: Arc<D>, store: Arc<dyn AppointmentStore>, rules: BookingRules) -> Self {
        Self {
            directory,
            store,
            rules,
            date_locks: Mutex::new(HashMap::new()),
            fixed_today: None,
        }
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn store(&self) -> &Arc<dyn AppointmentStore> {
        &self.store
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(local_today)
    }

    fn booking_service(&self) -> BookingService<'_> {
        BookingService::new(&*self.directory, &*self.directory, &self.rules)
    }

    /// Validate and store a new appointment atomically with respect to its date.
    #[instrument(skip(self, request), fields(date = %request.date, time = %request.time))]
    pub async fn book(&self, request: BookAppointmentRequest) -> Result<Appointment, AppointmentError> {
        let _guards = self.lock_dates(&[request.date]).await;

        let appointments = self.store.list().await?;
        let appointment = self.booking_service().validate_and_create(
            &request,
            &appointments,
            self.today(),
            Utc::now(),
        )?;

        self.store.insert(appointment.clone()).await?;
        info!("Appointment {} committed", appointment.id);
        Ok(appointment)
    }

    /// Validate and store an edit. Moving to another date locks both dates.
    #[instrument(skip(self, update))]
    pub async fn reschedule(
        &self,
        appointment_id: &str,
        update: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.load(appointment_id).await?;

        let mut dates = vec![current.date];
        if let Some(date) = update.date {
            dates.push(date);
        }
        let _guards = self.lock_dates(&dates).await;

        // Re-read under the lock; the record may have changed while waiting.
        let existing = self.load(appointment_id).await?;
        if existing.date != current.date {
            warn!("Appointment {} moved while waiting for lock", appointment_id);
            return Err(AppointmentError::Storage(format!(
                "Appointment {} was modified concurrently; retry",
                appointment_id
            )));
        }

        let appointments = self.store.list().await?;
        let updated = self.booking_service().validate_and_update(
            &existing,
            &update,
            &appointments,
            Utc::now(),
        )?;

        self.store.replace(updated.clone()).await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn transition_status(
        &self,
        appointment_id: &str,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.load(appointment_id).await?;
        let _guards = self.lock_dates(&[current.date]).await;

        let existing = self.load(appointment_id).await?;
        let updated = self
            .booking_service()
            .validate_and_transition_status(&existing, new_status, Utc::now())?;

        self.store.replace(updated.clone()).await?;
        Ok(updated)
    }

    async fn load(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        self.store
            .get(appointment_id)
            .await?
            .ok_or_else(|| AppointmentError::AppointmentNotFound(appointment_id.to_string()))
    }

    /// Acquire the locks for `dates` in ascending order so two reschedules
    /// crossing the same pair of dates cannot deadlock.
    ///
    /// Entries nobody else holds or waits on are dropped from the table first.
    async fn lock_dates(&self, dates: &[NaiveDate]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted = dates.to_vec();
        sorted.sort();
        sorted.dedup();

        let locks: Vec<Arc<Mutex<()>>> = {
            let mut table = self.date_locks.lock().await;
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
            sorted
                .iter()
                .map(|date| table.entry(*date).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(locks.len());
        for (date, lock) in sorted.iter().zip(locks) {
            debug!("Waiting for scheduling lock on {}", date);
            guards.push(lock.lock_owned().await);
        }
        guards
    }
}
