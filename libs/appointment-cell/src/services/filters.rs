// libs/appointment-cell/src/services/filters.rs
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::PatientLookup;
use crate::models::{Appointment, AppointmentStatus, PatientRef, ServiceRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePeriod {
    #[default]
    All,
    Today,
    /// Sunday through Saturday of the current week.
    Week,
    Month,
}

/// Dashboard filter state, passed in explicitly by whoever owns the view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilters {
    #[serde(default)]
    pub period: DatePeriod,
    #[serde(default)]
    pub service: Option<ServiceRef>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub doctor_id: Option<String>,
}

impl AppointmentFilters {
    pub fn apply<'a>(
        &self,
        appointments: &'a [Appointment],
        today: NaiveDate,
        patients: &dyn PatientLookup,
    ) -> Vec<&'a Appointment> {
        let range = period_range(self.period, today);
        let search = self
            .patient_name
            .as_deref()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());

        let filtered: Vec<&Appointment> = appointments
            .iter()
            .filter(|a| range.map_or(true, |(start, end)| a.date >= start && a.date <= end))
            .filter(|a| self.service.as_ref().map_or(true, |s| a.services.contains(s)))
            .filter(|a| {
                search
                    .as_deref()
                    .map_or(true, |term| patient_name_matches(&a.patient, term, patients))
            })
            .filter(|a| self.status.map_or(true, |status| a.status == status))
            .filter(|a| self.doctor_id.as_deref().map_or(true, |id| a.doctor_id == id))
            .collect();

        debug!("Filters kept {} of {} appointments", filtered.len(), appointments.len());
        filtered
    }
}

fn patient_name_matches(patient: &PatientRef, term: &str, patients: &dyn PatientLookup) -> bool {
    let name = match patient {
        PatientRef::Registered { id } => patients.patient_by_id(id).map(|p| p.full_name.as_str()),
        other => other.inline_name(),
    };
    name.map_or(false, |name| name.to_lowercase().contains(term))
}

/// Inclusive date bounds for a filter period; `None` for `All`.
pub fn period_range(period: DatePeriod, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match period {
        DatePeriod::All => None,
        DatePeriod::Today => Some((today, today)),
        DatePeriod::Week => {
            let start = week_start(today);
            Some((start, start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX)))
        }
        DatePeriod::Month => {
            let start = today.with_day(1).unwrap_or(today);
            let end = start
                .checked_add_months(chrono::Months::new(1))
                .and_then(|next| next.pred_opt())
                .unwrap_or(NaiveDate::MAX);
            Some((start, end))
        }
    }
}

/// Period-to-date: the week or month so far, ending today.
pub fn appointments_by_period(
    appointments: &[Appointment],
    period: DatePeriod,
    today: NaiveDate,
) -> Vec<&Appointment> {
    match period_range(period, today) {
        None => appointments.iter().collect(),
        Some((start, _)) => filter_by_date_range(appointments, start, today),
    }
}

/// Appointments dated within `[start, end]`, both ends inclusive.
pub fn filter_by_date_range(
    appointments: &[Appointment],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<&Appointment> {
    appointments
        .iter()
        .filter(|a| a.date >= start && a.date <= end)
        .collect()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}
