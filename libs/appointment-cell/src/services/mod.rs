pub mod assignment;
pub mod booking;
pub mod capacity;
pub mod conflict;
pub mod consistency;
pub mod duration;
pub mod filters;
pub mod lifecycle;
pub mod slots;

pub use assignment::DoctorAssignmentService;
pub use booking::BookingService;
pub use capacity::CapacityService;
pub use conflict::ConflictDetectionService;
pub use consistency::SchedulingConsistencyService;
pub use duration::{
    resolve_duration, DurationInput, DurationService, DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES,
};
pub use filters::{AppointmentFilters, DatePeriod};
pub use lifecycle::AppointmentLifecycleService;
pub use slots::SlotService;
