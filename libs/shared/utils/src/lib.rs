pub mod clock;
pub mod dates;
pub mod test_utils;

pub use clock::{add_minutes, generate_slots, ClockError, ClockTime, TimeInterval};
pub use dates::{format_date, local_today, normalize_date};
