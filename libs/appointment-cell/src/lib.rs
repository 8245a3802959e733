pub mod directory;
pub mod models;
pub mod services;
pub mod store;

pub use directory::{ClinicDirectory, ClinicSnapshot, PatientLookup, ServiceCatalog};
pub use models::*;
pub use services::*;
pub use store::{AppointmentStore, InMemoryAppointmentStore};
