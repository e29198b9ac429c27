//! Client core for a patient/doctor appointment-booking front-end.
//!
//! Everything that is not rendering lives here: the typed JSON client for
//! the remote booking API, the status-vocabulary mapper, the booking
//! flow, the doctor-side status board, the patient-side appointment view,
//! the doctor directory, and the durable session store. The remote
//! backend owns the data; this crate owns the lifecycle and
//! reconciliation logic in front of it.

pub mod auth;
pub mod board;
pub mod booking;
pub mod client;
pub mod config;
pub mod directory;
pub mod models;
pub mod patient_view;
pub mod session;
pub mod transport;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a host application. Respects `RUST_LOG`,
/// falling back to the crate default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
