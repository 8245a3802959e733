// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use doctor_cell::AvailabilityError;
use shared_config::SchedulingConfig;
use shared_models::AppError;
use shared_utils::{ClockTime, TimeInterval};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient: PatientRef,
    pub doctor_id: String,
    #[serde(with = "shared_utils::dates::lenient")]
    pub date: NaiveDate,
    pub time: ClockTime,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    /// Free-text treatment name kept from older records; used when a
    /// referenced service no longer resolves.
    #[serde(default)]
    pub service_name: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn occupies_slot(&self) -> bool {
        self.status.occupies_slot()
    }

    pub fn is_on(&self, doctor_id: &str, date: NaiveDate) -> bool {
        self.doctor_id == doctor_id && self.date == date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    CancellationRequested,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::CancellationRequested,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// Cancelled appointments never block a slot; every other status does.
    pub fn occupies_slot(&self) -> bool {
        *self != AppointmentStatus::Cancelled
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::CancellationRequested => "cancellation_requested",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        AppointmentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| AppointmentError::Validation(format!("Unknown status: {}", s)))
    }
}

/// Who is being treated. Guests and walk-ins carry their details directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatientRef {
    Registered {
        id: String,
    },
    Guest {
        name: String,
        #[serde(default)]
        age: Option<u32>,
        #[serde(default)]
        contact: Option<String>,
    },
    WalkIn {
        name: String,
        #[serde(default)]
        age: Option<u32>,
        #[serde(default)]
        contact: Option<String>,
    },
}

static LEGACY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:GUEST|WALK-IN) PATIENT[\s\S]*?Name:\s*([^\r\n]+)").unwrap()
});
static LEGACY_AGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:GUEST|WALK-IN) PATIENT[\s\S]*?Age:\s*([^\r\n]+)").unwrap()
});
static LEGACY_CONTACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:GUEST|WALK-IN) PATIENT[\s\S]*?Contact:\s*([^\r\n]+)").unwrap()
});

fn capture(pattern: &Regex, notes: &str) -> Option<String> {
    pattern
        .captures(notes)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

impl PatientRef {
    pub fn registered(id: impl Into<String>) -> Self {
        PatientRef::Registered { id: id.into() }
    }

    /// Convert an old-style patient id plus notes blob into a structured reference.
    ///
    /// Ids starting with `guest_appointment` or `walkin_` had the patient's
    /// details embedded in a `GUEST PATIENT` / `WALK-IN PATIENT` block of the notes.
    pub fn from_legacy(patient_id: &str, notes: Option<&str>) -> Self {
        let is_guest = patient_id.starts_with("guest_appointment");
        let is_walk_in = patient_id.starts_with("walkin_");
        if !is_guest && !is_walk_in {
            return PatientRef::registered(patient_id);
        }

        let notes = notes.unwrap_or_default();
        let age = capture(&LEGACY_AGE, notes).and_then(|raw| raw.parse().ok());
        let contact = capture(&LEGACY_CONTACT, notes);

        if is_guest {
            PatientRef::Guest {
                name: capture(&LEGACY_NAME, notes).unwrap_or_else(|| "Guest Patient".to_string()),
                age,
                contact,
            }
        } else {
            PatientRef::WalkIn {
                name: capture(&LEGACY_NAME, notes)
                    .unwrap_or_else(|| "Walk-in Patient".to_string()),
                age,
                contact,
            }
        }
    }

    pub fn registered_id(&self) -> Option<&str> {
        match self {
            PatientRef::Registered { id } => Some(id),
            _ => None,
        }
    }

    /// Name stored on the appointment itself; registered patients are looked up elsewhere.
    pub fn inline_name(&self) -> Option<&str> {
        match self {
            PatientRef::Registered { .. } => None,
            PatientRef::Guest { name, .. } | PatientRef::WalkIn { name, .. } => Some(name),
        }
    }
}

/// A booked line item: a catalog service or a promotion.
///
/// Serialized in the legacy string form, promotions carrying a `promo_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceRef {
    Service(String),
    Promotion(String),
}

const PROMO_PREFIX: &str = "promo_";

impl ServiceRef {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(PROMO_PREFIX) {
            Some(id) => ServiceRef::Promotion(id.to_string()),
            None => ServiceRef::Service(raw.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ServiceRef::Service(id) | ServiceRef::Promotion(id) => id,
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceRef::Service(id) => f.write_str(id),
            ServiceRef::Promotion(id) => write!(f, "{}{}", PROMO_PREFIX, id),
        }
    }
}

impl Serialize for ServiceRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ServiceRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Err(de::Error::custom("service reference must not be empty"));
        }
        Ok(ServiceRef::parse(raw.trim()))
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingOrigin {
    Patient,
    Staff,
    Admin,
}

impl BookingOrigin {
    pub fn initial_status(&self) -> AppointmentStatus {
        match self {
            BookingOrigin::Patient => AppointmentStatus::Pending,
            BookingOrigin::Staff | BookingOrigin::Admin => AppointmentStatus::Confirmed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient: PatientRef,
    /// `None` asks for the first doctor free at the requested time.
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(with = "shared_utils::dates::lenient")]
    pub date: NaiveDate,
    pub time: ClockTime,
    pub services: Vec<ServiceRef>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_origin")]
    pub origin: BookingOrigin,
}

fn default_origin() -> BookingOrigin {
    BookingOrigin::Patient
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    #[serde(default, with = "shared_utils::dates::lenient_option")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<ClockTime>,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub services: Option<Vec<ServiceRef>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateAppointmentRequest {
    /// True when the request would move or re-scope the booked slot.
    pub fn touches_schedule(&self) -> bool {
        self.date.is_some()
            || self.time.is_some()
            || self.doctor_id.is_some()
            || self.services.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRules {
    pub booking_horizon_days: u32,
    pub max_appointments_per_slot: usize,
    pub max_appointments_per_day: usize,
    pub slot_interval_minutes: u32,
    pub enforce_break_times: bool,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self::from(&SchedulingConfig::default())
    }
}

impl From<&SchedulingConfig> for BookingRules {
    fn from(config: &SchedulingConfig) -> Self {
        Self {
            booking_horizon_days: config.booking_horizon_days,
            max_appointments_per_slot: config.max_appointments_per_slot,
            max_appointments_per_day: config.max_appointments_per_day,
            slot_interval_minutes: config.effective_slot_interval(),
            enforce_break_times: config.enforce_break_times,
        }
    }
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictingAppointment {
    pub appointment_id: String,
    pub status: AppointmentStatus,
    pub interval: TimeInterval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub requested: TimeInterval,
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<ConflictingAppointment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotListing {
    Open {
        window: TimeInterval,
        duration_minutes: u32,
        slots: Vec<ClockTime>,
    },
    Closed {
        reason: doctor_cell::ClosedReason,
    },
}

impl SlotListing {
    pub fn slots(&self) -> &[ClockTime] {
        match self {
            SlotListing::Open { slots, .. } => slots,
            SlotListing::Closed { .. } => &[],
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Logical failure categories callers render messages for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SlotConflict,
    CapacityExceeded,
    BookingWindowViolation,
    InvalidStatusTransition,
    TerminalAppointmentEdit,
    NotFound,
    OutsideAvailability,
    NoDoctorAvailable,
    Validation,
    Storage,
}

fn join_statuses(statuses: &[AppointmentStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(AppointmentStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Cannot book {requested}: date is before today ({today})")]
    PastDate { requested: NaiveDate, today: NaiveDate },

    #[error("Cannot book {requested}: bookings open only until {latest} ({horizon_days} days ahead)")]
    BeyondHorizon {
        requested: NaiveDate,
        latest: NaiveDate,
        horizon_days: u32,
    },

    #[error("The {time} slot on {date} is full ({cap} appointments)")]
    SlotFull {
        date: NaiveDate,
        time: ClockTime,
        cap: usize,
    },

    #[error("{date} is fully booked ({cap} appointments)")]
    DayFull { date: NaiveDate, cap: usize },

    #[error("Doctor {doctor_id} is busy: {requested} overlaps appointment {conflicting_id} ({existing})")]
    Overlap {
        doctor_id: String,
        conflicting_id: String,
        requested: TimeInterval,
        existing: TimeInterval,
    },

    #[error("Cannot change status from {from} to {to}; allowed: {}", join_statuses(.allowed))]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
        allowed: Vec<AppointmentStatus>,
    },

    #[error("Appointment must be confirmed before it can be completed")]
    MustConfirmFirst,

    #[error("Appointment is already {0}; no further status changes are allowed")]
    Terminal(AppointmentStatus),

    #[error("Appointment {id} is {status}; date, time, doctor and services can no longer change")]
    TerminalAppointmentEdit { id: String, status: AppointmentStatus },

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    #[error("Doctor {0} is not accepting bookings")]
    DoctorUnavailable(String),

    #[error("Doctor {doctor_id} cannot see patients at {requested} on {date}: {reason}")]
    OutsideAvailability {
        doctor_id: String,
        date: NaiveDate,
        requested: TimeInterval,
        reason: String,
    },

    #[error("No doctor is available on {date} at {time}")]
    NoDoctorAvailable { date: NaiveDate, time: ClockTime },

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppointmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppointmentError::PastDate { .. } | AppointmentError::BeyondHorizon { .. } => {
                ErrorKind::BookingWindowViolation
            }
            AppointmentError::SlotFull { .. } | AppointmentError::DayFull { .. } => {
                ErrorKind::CapacityExceeded
            }
            AppointmentError::Overlap { .. } => ErrorKind::SlotConflict,
            AppointmentError::InvalidTransition { .. }
            | AppointmentError::MustConfirmFirst
            | AppointmentError::Terminal(_) => ErrorKind::InvalidStatusTransition,
            AppointmentError::TerminalAppointmentEdit { .. } => ErrorKind::TerminalAppointmentEdit,
            AppointmentError::AppointmentNotFound(_)
            | AppointmentError::DoctorNotFound(_)
            | AppointmentError::ServiceNotFound(_)
            | AppointmentError::PromotionNotFound(_)
            | AppointmentError::Availability(AvailabilityError::DoctorNotFound(_)) => {
                ErrorKind::NotFound
            }
            AppointmentError::DoctorUnavailable(_) | AppointmentError::OutsideAvailability { .. } => {
                ErrorKind::OutsideAvailability
            }
            AppointmentError::NoDoctorAvailable { .. } => ErrorKind::NoDoctorAvailable,
            AppointmentError::Availability(_) | AppointmentError::Validation(_) => {
                ErrorKind::Validation
            }
            AppointmentError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::SlotConflict
            | ErrorKind::CapacityExceeded
            | ErrorKind::NoDoctorAvailable => AppError::Conflict(message),
            ErrorKind::BookingWindowViolation
            | ErrorKind::InvalidStatusTransition
            | ErrorKind::TerminalAppointmentEdit
            | ErrorKind::OutsideAvailability
            | ErrorKind::Validation => AppError::ValidationError(message),
            ErrorKind::Storage => AppError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_date_tolerates_time_component() {
        let update: UpdateAppointmentRequest =
            serde_json::from_value(json!({ "date": "2024-06-10T00:00:00" })).unwrap();
        assert_eq!(update.date, NaiveDate::from_ymd_opt(2024, 6, 10));
        assert_eq!(serde_json::to_value(&update).unwrap()["date"], json!("2024-06-10"));

        let untouched: UpdateAppointmentRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(untouched.date, None);
        assert!(!untouched.touches_schedule());

        let garbage = serde_json::from_value::<UpdateAppointmentRequest>(json!({ "date": "soon" }));
        assert!(garbage.is_err());
    }

    #[test]
    fn test_service_ref_legacy_string_form() {
        assert_eq!(ServiceRef::parse("srv001"), ServiceRef::Service("srv001".to_string()));
        assert_eq!(ServiceRef::parse("promo_p7"), ServiceRef::Promotion("p7".to_string()));
        assert_eq!(ServiceRef::Promotion("p7".to_string()).to_string(), "promo_p7");

        let refs: Vec<ServiceRef> = serde_json::from_value(json!(["srv001", "promo_p7"])).unwrap();
        assert_eq!(serde_json::to_value(&refs).unwrap(), json!(["srv001", "promo_p7"]));
    }

    #[test]
    fn test_status_parsing_and_terminal_states() {
        assert_eq!(
            "Cancellation_Requested".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::CancellationRequested
        );
        assert!("archived".parse::<AppointmentStatus>().is_err());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(!AppointmentStatus::CancellationRequested.is_terminal());
        assert!(AppointmentStatus::CancellationRequested.occupies_slot());
        assert!(!AppointmentStatus::Cancelled.occupies_slot());
    }

    #[test]
    fn test_guest_patient_from_legacy_notes() {
        let notes = "GUEST PATIENT\nName: Maria Clara\nAge: 34\nContact: 0917-555-0101\n\nToothache";
        let patient = PatientRef::from_legacy("guest_appointment_171", Some(notes));

        assert_eq!(
            patient,
            PatientRef::Guest {
                name: "Maria Clara".to_string(),
                age: Some(34),
                contact: Some("0917-555-0101".to_string()),
            }
        );
    }

    #[test]
    fn test_walk_in_and_registered_from_legacy() {
        let walk_in = PatientRef::from_legacy("walkin_88", Some("WALK-IN PATIENT\nName: Jose\r\nAge: n/a"));
        assert_eq!(
            walk_in,
            PatientRef::WalkIn {
                name: "Jose".to_string(),
                age: None,
                contact: None,
            }
        );

        let missing = PatientRef::from_legacy("guest_appointment_9", None);
        assert_eq!(missing.inline_name(), Some("Guest Patient"));

        let registered = PatientRef::from_legacy("pat001", Some("GUEST PATIENT\nName: Ignored"));
        assert_eq!(registered.registered_id(), Some("pat001"));
    }

    #[test]
    fn test_error_kinds_map_to_app_errors() {
        let overlap = AppointmentError::Overlap {
            doctor_id: "doc001".to_string(),
            conflicting_id: "apt001".to_string(),
            requested: TimeInterval::new(ClockTime::from_hm(9, 0), ClockTime::from_hm(10, 30)),
            existing: TimeInterval::new(ClockTime::from_hm(9, 30), ClockTime::from_hm(10, 0)),
        };
        assert_eq!(overlap.kind(), ErrorKind::SlotConflict);
        assert!(overlap.to_string().contains("09:00-10:30"));
        assert!(matches!(AppError::from(overlap), AppError::Conflict(_)));

        let transition = AppointmentError::InvalidTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Pending,
            allowed: vec![],
        };
        assert!(transition.to_string().ends_with("allowed: none"));
        assert!(matches!(AppError::from(transition), AppError::ValidationError(_)));

        let missing = AppointmentError::from(AvailabilityError::DoctorNotFound("doc9".to_string()));
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }
}
