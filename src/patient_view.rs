//! Patient-side appointment view.
//!
//! Read-only: fetches one patient's appointments and splits them into
//! upcoming and past for display. The membership tests run on the raw
//! wire status and deliberately accept both vocabularies, since the
//! backend has been seen returning either. No status transitions here;
//! cancellation is an explicit delete of the record, not a status write.

use std::sync::Arc;

use crate::client::{self, ApiClient, ApiError};
use crate::models::Appointment;

/// Wire statuses shown under "upcoming".
pub const UPCOMING_STATUSES: &[&str] = &["pending", "confirmed", "agendada"];

/// Wire statuses shown under "past".
pub const PAST_STATUSES: &[&str] = &["completed", "realizada", "cancelled", "cancelada"];

/// Display split. A status in neither membership set lands in neither
/// list; it is logged rather than silently assigned a bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub upcoming: Vec<Appointment>,
    pub past: Vec<Appointment>,
}

pub struct PatientAppointments {
    client: Arc<ApiClient>,
}

impl PatientAppointments {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// The patient's appointment list. Unlike directory browsing this is
    /// critical-path, so failures propagate instead of degrading.
    pub fn fetch(&self, patient_id: &str) -> Result<Vec<Appointment>, ApiError> {
        let path = format!("/api/appointments/patient/{patient_id}");
        let response = self.client.get(&path)?;
        let payload = response.json().ok_or(ApiError::InvalidResponse)?;
        Ok(client::list_under(&payload, &["data.appointments", "appointments", ""])
            .unwrap_or_default())
    }

    /// Split a list for display.
    pub fn partition(appointments: &[Appointment]) -> Partition {
        let mut partition = Partition::default();
        for appointment in appointments {
            let status = appointment.status.as_str();
            if UPCOMING_STATUSES.contains(&status) {
                partition.upcoming.push(appointment.clone());
            } else if PAST_STATUSES.contains(&status) {
                partition.past.push(appointment.clone());
            } else {
                tracing::warn!(
                    id = %appointment.id,
                    status = %appointment.status,
                    "appointment status matches neither upcoming nor past"
                );
            }
        }
        partition
    }

    /// Explicit cancellation: deletes the record.
    pub fn cancel(&self, appointment_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/appointments/{appointment_id}");
        self.client.delete(&path)?;
        tracing::info!(id = appointment_id, "appointment cancelled");
        Ok(())
    }
}
