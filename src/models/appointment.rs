//! Appointment wire model and creation payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::Status;

/// Marks client-synthesized ids for appointments the backend confirmed
/// writing but never echoed back.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Default visit classification.
pub const DEFAULT_KIND: &str = "consulta";

/// One scheduled interaction between a patient and a doctor, as the
/// backend returns it. `status` stays in the backend vocabulary; views
/// translate through [`Status`] when they need the internal category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub doctor_id: String,
    pub pacient_id: String,
    pub date_time: DateTime<Utc>,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub symptoms: String,
    pub status: String,
    pub specialty: String,
    pub doctor_name: String,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    // Populated by the doctor once the visit is completed.
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub doctor_notes: Option<String>,
}

fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

impl Appointment {
    /// Whether this record was synthesized client-side and not yet
    /// confirmed by a server fetch.
    pub fn is_unconfirmed(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }

    /// The internal lifecycle category of the wire status.
    pub fn mapped_status(&self) -> Status {
        Status::from_backend(&self.status)
    }
}

/// Creation payload. Carries the denormalized doctor/patient snapshot,
/// the backend's initial status, and a client-side `created_at` fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAppointment {
    pub doctor_id: String,
    pub pacient_id: String,
    pub date_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub symptoms: String,
    pub specialty: String,
    pub doctor_name: String,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl CreateAppointment {
    /// Synthesize a local record from the submitted payload, with a
    /// temporary id recognizable via [`Appointment::is_unconfirmed`].
    pub fn into_unconfirmed(self) -> Appointment {
        Appointment {
            id: format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4()),
            doctor_id: self.doctor_id,
            pacient_id: self.pacient_id,
            date_time: self.date_time,
            kind: self.kind,
            symptoms: self.symptoms,
            status: self.status,
            specialty: self.specialty,
            doctor_name: self.doctor_name,
            patient_name: self.patient_name,
            patient_email: self.patient_email,
            patient_phone: self.patient_phone,
            notes: self.notes,
            created_at: Some(self.created_at),
            diagnosis: None,
            prescription: None,
            doctor_notes: None,
        }
    }
}
