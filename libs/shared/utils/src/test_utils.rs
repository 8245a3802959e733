use chrono::NaiveDate;
use serde_json::{json, Value};

use shared_config::SchedulingConfig;

use crate::clock::ClockTime;
use crate::dates::normalize_date;

pub struct TestConfig {
    pub booking_horizon_days: u32,
    pub max_appointments_per_slot: usize,
    pub max_appointments_per_day: usize,
    pub enforce_break_times: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            booking_horizon_days: 14,
            max_appointments_per_slot: 5,
            max_appointments_per_day: 15,
            enforce_break_times: false,
        }
    }
}

impl TestConfig {
    pub fn to_scheduling_config(&self) -> SchedulingConfig {
        SchedulingConfig {
            booking_horizon_days: self.booking_horizon_days,
            max_appointments_per_slot: self.max_appointments_per_slot,
            max_appointments_per_day: self.max_appointments_per_day,
            enforce_break_times: self.enforce_break_times,
            ..SchedulingConfig::default()
        }
    }
}

/// Parse a fixture date, panicking on typos.
pub fn date(raw: &str) -> NaiveDate {
    normalize_date(raw).unwrap_or_else(|| panic!("invalid fixture date {:?}", raw))
}

/// Parse a fixture time, panicking on typos.
pub fn time(raw: &str) -> ClockTime {
    ClockTime::parse(raw).unwrap_or_else(|e| panic!("invalid fixture time: {}", e))
}

pub struct MockClinicData;

impl MockClinicData {
    pub fn doctor(id: &str, name: &str, available: bool) -> Value {
        json!({
            "id": id,
            "name": name,
            "specialty": "General Dentistry",
            "available": available
        })
    }

    pub fn schedule(id: &str, doctor_id: &str, day: &str, start: &str, end: &str) -> Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "day": day,
            "start_time": start,
            "end_time": end
        })
    }

    /// Every weekday from `start` to `end` for one doctor.
    pub fn full_week(doctor_id: &str, start: &str, end: &str) -> Vec<Value> {
        [
            "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
        ]
        .iter()
        .map(|day| {
            Self::schedule(
                &format!("sch_{}_{}", doctor_id, day.to_lowercase()),
                doctor_id,
                day,
                start,
                end,
            )
        })
        .collect()
    }

    pub fn service(id: &str, name: &str, duration: Value) -> Value {
        json!({
            "id": id,
            "name": name,
            "duration": duration,
            "price": "1000",
            "active": true
        })
    }

    pub fn promotion(id: &str, name: &str, duration: Option<u32>) -> Value {
        json!({
            "id": id,
            "name": name,
            "duration": duration,
            "active": true
        })
    }

    /// Clinic open every day 09:00-18:00 with a 12:00-13:00 break.
    pub fn open_every_day() -> Value {
        let day = json!({
            "is_open": true,
            "start_time": "09:00",
            "end_time": "18:00",
            "break_start_time": "12:00",
            "break_end_time": "13:00"
        });
        json!({
            "Monday": day.clone(),
            "Tuesday": day.clone(),
            "Wednesday": day.clone(),
            "Thursday": day.clone(),
            "Friday": day.clone(),
            "Saturday": day.clone(),
            "Sunday": day
        })
    }

    pub fn appointment(
        id: &str,
        doctor_id: &str,
        date: &str,
        time: &str,
        services: &[&str],
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "patient": { "kind": "registered", "id": "pat001" },
            "doctor_id": doctor_id,
            "date": date,
            "time": time,
            "services": services,
            "status": status,
            "created_at": "2024-06-01T08:00:00Z",
            "updated_at": "2024-06-01T08:00:00Z"
        })
    }
}
