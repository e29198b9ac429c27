//! Appointment status vocabulary.
//!
//! The backend persists Portuguese status words (agendada, confirmada,
//! cancelada, realizada, remarcada). The UI buckets appointments into four
//! lifecycle categories. `Status` is the single internal enumeration; the
//! two vocabularies never live side by side in one structure. Translation
//! happens at the wire boundary through `from_backend` / `to_backend`.

use serde::{Deserialize, Serialize};

/// Initial status the backend assigns at creation.
pub const BACKEND_SCHEDULED: &str = "agendada";
pub const BACKEND_CONFIRMED: &str = "confirmada";
pub const BACKEND_CANCELLED: &str = "cancelada";
pub const BACKEND_COMPLETED: &str = "realizada";
/// Persisted by the backend but never written by this client.
pub const BACKEND_RESCHEDULED: &str = "remarcada";

/// Internal lifecycle category of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl Status {
    /// Inbound adapter. Total: any unrecognized backend value (including
    /// "remarcada") maps to `Pending`.
    pub fn from_backend(status: &str) -> Self {
        match status {
            BACKEND_SCHEDULED => Status::Pending,
            BACKEND_CONFIRMED => Status::Accepted,
            BACKEND_CANCELLED => Status::Rejected,
            BACKEND_COMPLETED => Status::Completed,
            _ => Status::Pending,
        }
    }

    /// Outbound adapter. Total: `Pending` writes back as the backend's
    /// initial value. The round trip through both adapters is lossy for
    /// unrecognized backend values; that asymmetry is accepted.
    pub fn to_backend(self) -> &'static str {
        match self {
            Status::Accepted => BACKEND_CONFIRMED,
            Status::Rejected => BACKEND_CANCELLED,
            Status::Completed => BACKEND_COMPLETED,
            Status::Pending => BACKEND_SCHEDULED,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Accepted => "accepted",
            Status::Rejected => "rejected",
            Status::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
