use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_BOOKING_HORIZON_DAYS: u32 = 14;
pub const DEFAULT_MAX_APPOINTMENTS_PER_SLOT: usize = 5;
pub const DEFAULT_MAX_APPOINTMENTS_PER_DAY: usize = 15;
pub const DEFAULT_SLOT_INTERVAL_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    pub booking_horizon_days: u32,
    pub max_appointments_per_slot: usize,
    pub max_appointments_per_day: usize,
    pub slot_interval_minutes: u32,
    pub enforce_break_times: bool,
    pub snapshot_path: Option<String>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            booking_horizon_days: DEFAULT_BOOKING_HORIZON_DAYS,
            max_appointments_per_slot: DEFAULT_MAX_APPOINTMENTS_PER_SLOT,
            max_appointments_per_day: DEFAULT_MAX_APPOINTMENTS_PER_DAY,
            slot_interval_minutes: DEFAULT_SLOT_INTERVAL_MINUTES,
            enforce_break_times: false,
            snapshot_path: None,
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        let config = Self {
            booking_horizon_days: parse_env_or(
                "CLINIC_BOOKING_HORIZON_DAYS",
                DEFAULT_BOOKING_HORIZON_DAYS,
            ),
            max_appointments_per_slot: parse_env_or(
                "CLINIC_MAX_APPOINTMENTS_PER_SLOT",
                DEFAULT_MAX_APPOINTMENTS_PER_SLOT,
            ),
            max_appointments_per_day: parse_env_or(
                "CLINIC_MAX_APPOINTMENTS_PER_DAY",
                DEFAULT_MAX_APPOINTMENTS_PER_DAY,
            ),
            slot_interval_minutes: parse_env_or(
                "CLINIC_SLOT_INTERVAL_MINUTES",
                DEFAULT_SLOT_INTERVAL_MINUTES,
            ),
            enforce_break_times: parse_env_or("CLINIC_ENFORCE_BREAK_TIMES", false),
            snapshot_path: env::var("CLINIC_SNAPSHOT_PATH").ok().filter(|p| !p.is_empty()),
        };

        if !config.is_configured() {
            warn!("Scheduling not fully configured - CLINIC_SNAPSHOT_PATH is not set");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.snapshot_path.is_some()
    }

    /// Slot interval with zero treated as the default, so slot generation always advances.
    pub fn effective_slot_interval(&self) -> u32 {
        if self.slot_interval_minutes == 0 {
            DEFAULT_SLOT_INTERVAL_MINUTES
        } else {
            self.slot_interval_minutes
        }
    }
}

fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => parse_value_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_value_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!("{} has invalid value {:?}, using default {:?}", key, raw, default);
            default
        }
    }
}
