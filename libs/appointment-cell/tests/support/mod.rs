#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};

use appointment_cell::{
    Appointment, BookAppointmentRequest, BookingOrigin, BookingRules, ClinicDirectory,
    PatientRef, ServiceRef,
};
use shared_utils::test_utils::{date, time, MockClinicData, TestConfig};

/// Saturday. Bookings run through 2024-06-22.
pub const TODAY: &str = "2024-06-08";
pub const MONDAY: &str = "2024-06-10";

pub fn today() -> NaiveDate {
    date(TODAY)
}

pub fn monday() -> NaiveDate {
    date(MONDAY)
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 8, 9, 0, 0).unwrap()
}

pub fn rules() -> BookingRules {
    BookingRules::from(&TestConfig::default().to_scheduling_config())
}

pub fn directory_json() -> Value {
    let doctors: Vec<Value> = (1..=6)
        .map(|n| MockClinicData::doctor(&format!("doc00{}", n), &format!("Dr. Number {}", n), true))
        .collect();
    let schedules: Vec<Value> = (1..=6)
        .flat_map(|n| MockClinicData::full_week(&format!("doc00{}", n), "09:00", "17:00"))
        .collect();

    json!({
        "doctors": doctors,
        "schedules": schedules,
        "clinic_schedule": MockClinicData::open_every_day(),
        "services": [
            MockClinicData::service("srv001", "Consultation", json!(30)),
            MockClinicData::service("srv002", "Root Canal", json!("1 hour 30 mins")),
            MockClinicData::service("srv003", "Teeth Cleaning", Value::Null),
            MockClinicData::service("srv004", "Tooth Extraction", json!("")),
            MockClinicData::service("srv005", "Dental X-Ray", json!(0))
        ],
        "promotions": [
            MockClinicData::promotion("p1", "Summer Whitening Promo", Some(75)),
            MockClinicData::promotion("p2", "Braces Promo", None)
        ],
        "patients": [
            { "id": "pat001", "full_name": "Juan Dela Cruz" },
            { "id": "pat002", "full_name": "Ana Santos" }
        ]
    })
}

/// Six doctors, each working 09:00-17:00 every day; clinic open every day.
pub fn clinic_directory() -> ClinicDirectory {
    serde_json::from_value(directory_json()).unwrap()
}

pub fn appointment(
    id: &str,
    doctor_id: &str,
    on: &str,
    at: &str,
    services: &[&str],
    status: &str,
) -> Appointment {
    serde_json::from_value(MockClinicData::appointment(id, doctor_id, on, at, services, status))
        .unwrap()
}

pub fn request(doctor_id: Option<&str>, on: &str, at: &str, services: &[&str]) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient: PatientRef::registered("pat001"),
        doctor_id: doctor_id.map(str::to_string),
        date: date(on),
        time: time(at),
        services: services.iter().map(|s| ServiceRef::parse(s)).collect(),
        notes: None,
        origin: BookingOrigin::Patient,
    }
}
