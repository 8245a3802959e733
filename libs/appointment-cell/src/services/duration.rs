// libs/appointment-cell/src/services/duration.rs
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use shared_models::{DurationValue, Promotion, Service};

use crate::directory::ServiceCatalog;
use crate::models::{Appointment, AppointmentError, ServiceRef};

pub const DEFAULT_DURATION_MINUTES: u32 = 30;
/// One week. Longer catalog values are treated as this.
pub const MAX_DURATION_MINUTES: u32 = 7 * 24 * 60;

static CLOCK_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{1,2})$").unwrap());
static DURATION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(hours?|hrs?|h|minutes?|mins?|m)\b").unwrap()
});
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\d+(?:\.\d+)?|\.\d+)").unwrap());

/// Anything a treatment length can be inferred from.
#[derive(Debug, Clone, Copy)]
pub enum DurationInput<'a> {
    Minutes(f64),
    /// Free text: either a length such as `"1 hour 30 mins"` or a treatment name.
    Text(&'a str),
    Descriptor {
        name: &'a str,
        duration: Option<&'a DurationValue>,
    },
}

impl<'a> From<&'a str> for DurationInput<'a> {
    fn from(text: &'a str) -> Self {
        DurationInput::Text(text)
    }
}

impl<'a> From<&'a Service> for DurationInput<'a> {
    fn from(service: &'a Service) -> Self {
        DurationInput::Descriptor {
            name: &service.name,
            duration: service.duration.as_ref(),
        }
    }
}

/// Minutes for any input. Never fails and never returns zero.
pub fn resolve_duration<'a>(input: impl Into<DurationInput<'a>>) -> u32 {
    match input.into() {
        DurationInput::Minutes(minutes) => round_positive(minutes).unwrap_or(DEFAULT_DURATION_MINUTES),
        DurationInput::Text(text) => parse_duration_text(text)
            .or_else(|| duration_for_name(text))
            .unwrap_or(DEFAULT_DURATION_MINUTES),
        DurationInput::Descriptor { name, duration } => duration
            .and_then(parse_duration_value)
            .or_else(|| duration_for_name(name))
            .unwrap_or(DEFAULT_DURATION_MINUTES),
    }
}

/// Length of a promotion: its explicit override, else inferred from its name.
pub fn promotion_duration(promotion: &Promotion) -> u32 {
    promotion
        .override_minutes()
        .map(cap_minutes)
        .unwrap_or_else(|| resolve_duration(promotion.name.as_str()))
}

pub fn parse_duration_value(value: &DurationValue) -> Option<u32> {
    match value {
        DurationValue::Minutes(minutes) => round_positive(*minutes),
        DurationValue::Text(text) => parse_duration_text(text),
    }
}

/// Parse `HH:MM`, unit phrases like `"1 hr 15 min"` (summed), or a leading number.
pub fn parse_duration_text(raw: &str) -> Option<u32> {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = CLOCK_FORMAT.captures(&text) {
        let hours: u32 = caps[1].parse().ok()?;
        let minutes: u32 = caps[2].parse().ok()?;
        return Some(hours * 60 + minutes).filter(|total| *total > 0);
    }

    let total: f64 = DURATION_TOKEN
        .captures_iter(&text)
        .filter_map(|caps| {
            let value: f64 = caps[1].parse().ok()?;
            if caps[2].starts_with('h') {
                Some(value * 60.0)
            } else {
                Some(value)
            }
        })
        .sum();

    if total > 0.0 {
        return round_positive(total);
    }

    LEADING_NUMBER
        .find(&text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .and_then(round_positive)
}

/// Keyword rules over the lowercased treatment name, most specific first.
pub fn duration_for_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let has = |needle: &str| name.contains(needle);

    let minutes = if has("braces installation") {
        60
    } else if has("adjustment") && has("cleaning") {
        30
    } else if has("adjustment") && has("1 pasta") {
        30
    } else if has("adjustment") && has("2 pasta") {
        45
    } else if has("adjustment") && has("3 pasta") {
        60
    } else if has("adjustment") {
        15
    } else if has("cleaning") || has("op") {
        // Plain substring: any name containing "op" lands here.
        30
    } else if has("pasta (1)") || has("pasta 1") {
        30
    } else if has("pasta (2)") || has("pasta 2") {
        45
    } else if has("bunot") || has("exo") {
        if has("(1)") || has(" 1") {
            30
        } else if has("(2)") || has(" 2") {
            45
        } else {
            30
        }
    } else if has("odontect") || has("oral surgery") || has("wisdom tooth extraction") {
        120
    } else if has("consultation") || has("extraction") {
        30
    } else if has("root canal") {
        90
    } else if has("crown") || has("jacket") {
        45
    } else if has("veneer") {
        90
    } else if has("whitening") {
        60
    } else if has("x-ray") || has("xray") {
        15
    } else if has("denture") || has("braces") {
        60
    } else {
        return None;
    };

    Some(minutes)
}

/// Human-readable length, e.g. `"1 hour 30 minutes"`.
pub fn describe_minutes(minutes: u32) -> String {
    fn plural(count: u32, unit: &str) -> String {
        if count == 1 {
            format!("{} {}", count, unit)
        } else {
            format!("{} {}s", count, unit)
        }
    }

    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        plural(hours, "hour")
    } else {
        format!("{} {}", plural(hours, "hour"), plural(rest, "minute"))
    }
}

fn cap_minutes(minutes: u32) -> u32 {
    minutes.min(MAX_DURATION_MINUTES)
}

fn round_positive(minutes: f64) -> Option<u32> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return None;
    }
    let rounded = minutes.round();
    if rounded < 1.0 {
        return None;
    }
    Some(rounded.min(f64::from(MAX_DURATION_MINUTES)) as u32)
}

// ==============================================================================
// CATALOG-BACKED DURATIONS
// ==============================================================================

pub struct DurationService<'a> {
    catalog: &'a dyn ServiceCatalog,
}

impl<'a> DurationService<'a> {
    pub fn new(catalog: &'a dyn ServiceCatalog) -> Self {
        Self { catalog }
    }

    /// Total length of a new booking. Every reference must exist.
    ///
    /// Regular services add up; a promotion with an explicit length replaces the total.
    pub fn booking_duration(&self, services: &[ServiceRef]) -> Result<u32, AppointmentError> {
        if services.is_empty() {
            return Err(AppointmentError::Validation(
                "At least one service or promotion is required".to_string(),
            ));
        }

        let mut total: u32 = 0;
        let mut override_minutes = None;

        for service_ref in services {
            match service_ref {
                ServiceRef::Service(id) => {
                    let service = self
                        .catalog
                        .service_by_id(id)
                        .ok_or_else(|| AppointmentError::ServiceNotFound(id.clone()))?;
                    total = total.saturating_add(resolve_duration(service));
                }
                ServiceRef::Promotion(id) => {
                    let promotion = self
                        .catalog
                        .promotion_by_id(id)
                        .ok_or_else(|| AppointmentError::PromotionNotFound(id.clone()))?;
                    match promotion.override_minutes() {
                        Some(minutes) if override_minutes.is_none() => {
                            override_minutes = Some(cap_minutes(minutes))
                        }
                        Some(_) => {}
                        None => total = total.saturating_add(promotion_duration(promotion)),
                    }
                }
            }
        }

        let minutes = cap_minutes(override_minutes.unwrap_or(total)).max(1);
        debug!("Booking of {} item(s) lasts {} minutes", services.len(), minutes);
        Ok(minutes)
    }

    /// Length an existing appointment occupies. Never fails.
    ///
    /// References that no longer resolve are skipped; when nothing resolves the
    /// stored `service_name` is used, then the default.
    pub fn appointment_duration(&self, appointment: &Appointment) -> u32 {
        let mut total: u32 = 0;

        for service_ref in &appointment.services {
            match service_ref {
                ServiceRef::Service(id) => match self.catalog.service_by_id(id) {
                    Some(service) => total = total.saturating_add(resolve_duration(service)),
                    None => warn!("Appointment {} references unknown service {}", appointment.id, id),
                },
                ServiceRef::Promotion(id) => match self.catalog.promotion_by_id(id) {
                    Some(promotion) => {
                        if let Some(minutes) = promotion.override_minutes() {
                            return cap_minutes(minutes);
                        }
                        total = total.saturating_add(promotion_duration(promotion));
                    }
                    None => warn!(
                        "Appointment {} references unknown promotion {}",
                        appointment.id, id
                    ),
                },
            }
        }

        if total > 0 {
            return cap_minutes(total);
        }

        appointment
            .service_name
            .as_deref()
            .map(|name| resolve_duration(name))
            .unwrap_or(DEFAULT_DURATION_MINUTES)
    }
}
