pub mod appointment;
pub mod doctor;
pub mod status;
pub mod user;

pub use appointment::{Appointment, CreateAppointment, DEFAULT_KIND, TEMP_ID_PREFIX};
pub use doctor::Doctor;
pub use status::Status;
pub use user::{Role, User};
