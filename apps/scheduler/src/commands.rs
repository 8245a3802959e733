use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing::{debug, info};

use appointment_cell::services::duration::describe_minutes;
use appointment_cell::{
    resolve_duration, AppointmentError, AppointmentFilters, AppointmentStatus,
    BookAppointmentRequest, BookingOrigin, BookingRules, ClinicDirectory, ClinicSnapshot,
    ConflictDetectionService, DatePeriod, DoctorAssignmentService, DurationService,
    InMemoryAppointmentStore, PatientRef, SchedulingConsistencyService, ServiceRef, SlotService,
    UpdateAppointmentRequest,
};
use doctor_cell::AvailabilityService;
use shared_config::SchedulingConfig;
use shared_models::AppError;
use shared_utils::{format_date, local_today, normalize_date, ClockTime, TimeInterval};

#[derive(Parser, Debug)]
#[command(name = "clinic-scheduler", version, about = "Dental clinic appointment scheduling")]
pub struct Cli {
    /// Clinic snapshot JSON: doctors, schedules, services, promotions and appointments
    #[arg(long, global = true, env = "CLINIC_SNAPSHOT_PATH")]
    pub snapshot: Option<PathBuf>,

    /// Use this date as today instead of the local calendar date
    #[arg(long, global = true, value_parser = parse_date)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// Service id, or `promo_<id>` for a promotion. Repeat for multi-service bookings.
    #[arg(long = "service", required = true, value_parser = parse_service_ref)]
    pub services: Vec<ServiceRef>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a free-text treatment length to minutes
    Duration { text: String },

    /// Effective bookable window of a doctor on a date
    Window {
        #[arg(long)]
        doctor: String,
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },

    /// Free start times for a treatment
    Slots {
        #[arg(long)]
        doctor: String,
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[command(flatten)]
        services: ServiceArgs,
    },

    /// Report appointments that would overlap a requested slot
    Check {
        #[arg(long)]
        doctor: String,
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        time: ClockTime,
        #[command(flatten)]
        services: ServiceArgs,
        /// Appointment to ignore, e.g. the one being moved
        #[arg(long)]
        exclude: Option<String>,
    },

    /// First doctor free and on shift for a slot
    Assign {
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        time: ClockTime,
        #[command(flatten)]
        services: ServiceArgs,
    },

    /// Validate a new booking and print the stored appointment
    Book(BookArgs),

    /// Move or edit an existing appointment
    Reschedule {
        #[arg(long)]
        id: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        time: Option<ClockTime>,
        #[arg(long)]
        doctor: Option<String>,
        #[arg(long = "service", value_parser = parse_service_ref)]
        services: Vec<ServiceRef>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Move an appointment to a new status
    Transition {
        #[arg(long)]
        id: String,
        #[arg(long)]
        status: AppointmentStatus,
    },

    /// List appointments matching dashboard filters
    List {
        #[arg(long, value_enum, default_value_t = PeriodArg::All)]
        period: PeriodArg,
        #[arg(long)]
        status: Option<AppointmentStatus>,
        #[arg(long)]
        doctor: Option<String>,
        /// Case-insensitive patient name search
        #[arg(long)]
        patient: Option<String>,
        #[arg(long, value_parser = parse_service_ref)]
        service: Option<ServiceRef>,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("who").required(true).args(["patient", "guest"])))]
pub struct BookArgs {
    /// Registered patient id
    #[arg(long)]
    pub patient: Option<String>,
    /// Name of a guest without an account
    #[arg(long)]
    pub guest: Option<String>,
    /// Leave out to assign the first free doctor
    #[arg(long)]
    pub doctor: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,
    #[arg(long)]
    pub time: ClockTime,
    #[command(flatten)]
    pub services: ServiceArgs,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, value_enum, default_value_t = OriginArg::Patient)]
    pub origin: OriginArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OriginArg {
    Patient,
    Staff,
    Admin,
}

impl From<OriginArg> for BookingOrigin {
    fn from(origin: OriginArg) -> Self {
        match origin {
            OriginArg::Patient => BookingOrigin::Patient,
            OriginArg::Staff => BookingOrigin::Staff,
            OriginArg::Admin => BookingOrigin::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    All,
    Today,
    Week,
    Month,
}

impl From<PeriodArg> for DatePeriod {
    fn from(period: PeriodArg) -> Self {
        match period {
            PeriodArg::All => DatePeriod::All,
            PeriodArg::Today => DatePeriod::Today,
            PeriodArg::Week => DatePeriod::Week,
            PeriodArg::Month => DatePeriod::Month,
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    normalize_date(raw).ok_or_else(|| format!("invalid date {:?}: expected YYYY-MM-DD", raw))
}

fn parse_service_ref(raw: &str) -> Result<ServiceRef, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("service id cannot be empty".to_string());
    }
    Ok(ServiceRef::parse(trimmed))
}

fn load_snapshot(cli_path: Option<PathBuf>, config: &SchedulingConfig) -> Result<ClinicSnapshot> {
    let path = cli_path
        .or_else(|| config.snapshot_path.as_ref().map(PathBuf::from))
        .ok_or_else(|| {
            AppError::Config(
                "No clinic snapshot: pass --snapshot or set CLINIC_SNAPSHOT_PATH".to_string(),
            )
        })?;

    debug!("Loading clinic snapshot from {}", path.display());
    let snapshot = ClinicSnapshot::from_path(&path).map_err(AppError::from)?;
    Ok(snapshot)
}

fn consistency_service(
    snapshot: ClinicSnapshot,
    rules: BookingRules,
    today: NaiveDate,
) -> SchedulingConsistencyService<ClinicDirectory> {
    let store = InMemoryAppointmentStore::with_appointments(snapshot.appointments);
    SchedulingConsistencyService::new(Arc::new(snapshot.directory), Arc::new(store), rules)
        .with_today(today)
}

fn booking_duration(directory: &ClinicDirectory, services: &[ServiceRef]) -> Result<u32> {
    let minutes = DurationService::new(directory)
        .booking_duration(services)
        .map_err(AppError::from)?;
    Ok(minutes)
}

/// Execute one command and return its JSON result.
pub async fn run(cli: Cli, config: SchedulingConfig) -> Result<Value> {
    let Cli {
        snapshot: snapshot_path,
        today,
        command,
    } = cli;
    let today = today.unwrap_or_else(local_today);
    let rules = BookingRules::from(&config);

    let load = || load_snapshot(snapshot_path, &config);

    let output = match command {
        Command::Duration { text } => {
            let minutes = resolve_duration(text.as_str());
            json!({
                "input": text,
                "minutes": minutes,
                "label": describe_minutes(minutes),
            })
        }

        Command::Window { doctor, date } => {
            let snapshot = load()?;
            let availability = AvailabilityService::new()
                .doctor_window(&snapshot.directory, &doctor, date)
                .map_err(|e| AppError::from(AppointmentError::from(e)))?;
            json!({
                "doctor_id": doctor,
                "date": format_date(date),
                "availability": availability,
            })
        }

        Command::Slots {
            doctor,
            date,
            services,
        } => {
            let snapshot = load()?;
            let directory = &snapshot.directory;
            let duration = booking_duration(directory, &services.services)?;
            let listing = SlotService::new(directory, &rules)
                .available_slots(directory, &doctor, date, duration, &snapshot.appointments, None)
                .map_err(AppError::from)?;
            json!({
                "doctor_id": doctor,
                "date": format_date(date),
                "listing": listing,
            })
        }

        Command::Check {
            doctor,
            date,
            time,
            services,
            exclude,
        } => {
            let snapshot = load()?;
            let directory = &snapshot.directory;
            let duration = booking_duration(directory, &services.services)?;
            let response = ConflictDetectionService::new(directory).check_conflicts(
                &doctor,
                date,
                TimeInterval::starting_at(time, duration),
                &snapshot.appointments,
                exclude.as_deref(),
            );
            serde_json::to_value(response).context("Failed to render conflict report")?
        }

        Command::Assign {
            date,
            time,
            services,
        } => {
            let snapshot = load()?;
            let directory = &snapshot.directory;
            let duration = booking_duration(directory, &services.services)?;
            let doctor = DoctorAssignmentService::new(directory)
                .find_available_doctor_within_hours(
                    directory,
                    date,
                    time,
                    duration,
                    &snapshot.appointments,
                    None,
                )
                .ok_or(AppointmentError::NoDoctorAvailable { date, time })
                .map_err(AppError::from)?;
            info!("Assigned doctor {} for {} {}", doctor.id, date, time);
            json!({ "doctor": doctor, "duration_minutes": duration })
        }

        Command::Book(args) => {
            let snapshot = load()?;
            let patient = match (args.patient, args.guest) {
                (Some(id), _) => PatientRef::registered(id),
                (None, Some(name)) => PatientRef::Guest {
                    name,
                    age: None,
                    contact: None,
                },
                (None, None) => {
                    return Err(AppError::BadRequest(
                        "Either --patient or --guest is required".to_string(),
                    )
                    .into())
                }
            };
            let request = BookAppointmentRequest {
                patient,
                doctor_id: args.doctor,
                date: args.date,
                time: args.time,
                services: args.services.services,
                notes: args.notes,
                origin: args.origin.into(),
            };

            let appointment = consistency_service(snapshot, rules, today)
                .book(request)
                .await
                .map_err(AppError::from)?;
            serde_json::to_value(appointment).context("Failed to render appointment")?
        }

        Command::Reschedule {
            id,
            date,
            time,
            doctor,
            services,
            notes,
        } => {
            let snapshot = load()?;
            let update = UpdateAppointmentRequest {
                date,
                time,
                doctor_id: doctor,
                services: (!services.is_empty()).then_some(services),
                notes,
            };

            let appointment = consistency_service(snapshot, rules, today)
                .reschedule(&id, update)
                .await
                .map_err(AppError::from)?;
            serde_json::to_value(appointment).context("Failed to render appointment")?
        }

        Command::Transition { id, status } => {
            let snapshot = load()?;
            let appointment = consistency_service(snapshot, rules, today)
                .transition_status(&id, status)
                .await
                .map_err(AppError::from)?;
            serde_json::to_value(appointment).context("Failed to render appointment")?
        }

        Command::List {
            period,
            status,
            doctor,
            patient,
            service,
        } => {
            let snapshot = load()?;
            let filters = AppointmentFilters {
                period: period.into(),
                service,
                patient_name: patient,
                status,
                doctor_id: doctor,
            };
            let matches = filters.apply(&snapshot.appointments, today, &snapshot.directory);
            json!({ "count": matches.len(), "appointments": matches })
        }
    };

    Ok(output)
}
