//! Appointment booking flow.
//!
//! Turns user-entered date, time and reason-for-visit into a validated
//! creation request, and absorbs the backend's unreliable creation
//! contract: a write can succeed without the created record being echoed
//! back. Rather than matching on error-message text, the flow runs an
//! idempotent fetch-after-write reconciliation and, when the record still
//! cannot be located after a 2xx, synthesizes a local stand-in with a
//! temporary id so the UI can proceed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::client::{self, ApiClient, ApiError};
use crate::models::status::BACKEND_SCHEDULED;
use crate::models::{Appointment, CreateAppointment, Doctor, User, DEFAULT_KIND};
use crate::transport::Method;

/// How long the success banner stays up before the consumer
/// auto-dismisses. A UI timing contract, not a correctness one.
pub const SUCCESS_DISMISS: Duration = Duration::from_millis(1500);

/// Earliest bookable day, relative to today.
pub const MIN_DAYS_AHEAD: u64 = 1;
/// Latest bookable day, relative to today.
pub const MAX_DAYS_AHEAD: u64 = 30;

/// The fixed half-hour slots offered by the time control:
/// 08:00 through 18:00 inclusive.
pub fn time_slots() -> Vec<NaiveTime> {
    (0..21u32)
        .map(|i| {
            let hour = 8 + i / 2;
            let minute = if i % 2 == 0 { 0 } else { 30 };
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
        })
        .collect()
}

/// Lower bound for the date control (tomorrow).
pub fn earliest_date(today: NaiveDate) -> NaiveDate {
    today + Days::new(MIN_DAYS_AHEAD)
}

/// Upper bound for the date control.
pub fn latest_date(today: NaiveDate) -> NaiveDate {
    today + Days::new(MAX_DAYS_AHEAD)
}

/// One variant per user-facing validation message. These never reach the
/// network; the form short-circuits on the first failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("no doctor selected")]
    MissingDoctor,
    #[error("not signed in")]
    MissingPatient,
    #[error("date and time not selected")]
    MissingSchedule,
    #[error("a description of the symptoms is required")]
    MissingSymptoms,
    #[error("invalid date or time")]
    InvalidSchedule,
    #[error("appointments cannot be booked in the past")]
    PastSchedule,
}

/// The booking form as the user filled it in. Date and time stay raw
/// strings until validation, like the controls that produce them.
#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    pub doctor: Option<Doctor>,
    pub patient: Option<User>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub symptoms: String,
    pub notes: String,
}

impl BookingForm {
    /// Validate in a fixed order, short-circuiting on the first failure,
    /// and produce the creation payload: denormalized doctor/patient
    /// snapshot, the backend's initial status, a client `created_at`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<CreateAppointment, BookingError> {
        let doctor = self
            .doctor
            .as_ref()
            .filter(|d| !d.id.trim().is_empty())
            .ok_or(BookingError::MissingDoctor)?;

        let patient = self
            .patient
            .as_ref()
            .filter(|u| !u.id.trim().is_empty())
            .ok_or(BookingError::MissingPatient)?;

        if self.date.trim().is_empty() || self.time.trim().is_empty() {
            return Err(BookingError::MissingSchedule);
        }

        let symptoms = self.symptoms.trim();
        if symptoms.is_empty() {
            return Err(BookingError::MissingSymptoms);
        }

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| BookingError::InvalidSchedule)?;
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .map_err(|_| BookingError::InvalidSchedule)?;
        let instant = date.and_time(time).and_utc();

        if instant <= now {
            return Err(BookingError::PastSchedule);
        }

        Ok(CreateAppointment {
            doctor_id: doctor.id.trim().to_string(),
            pacient_id: patient.id.trim().to_string(),
            date_time: instant,
            kind: DEFAULT_KIND.to_string(),
            symptoms: symptoms.to_string(),
            specialty: doctor.specialty.trim().to_string(),
            doctor_name: doctor.name.trim().to_string(),
            patient_name: non_empty(&patient.name),
            patient_email: non_empty(&patient.email),
            patient_phone: patient.phone.as_deref().and_then(non_empty),
            notes: non_empty(&self.notes),
            status: BACKEND_SCHEDULED.to_string(),
            created_at: now,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// What a submission produced.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    /// The backend echoed the created record, or reconciliation located it.
    Created(Appointment),
    /// The write went through but no record could be read back; this is a
    /// local synthesis with a temporary id, corrected by the next fetch.
    Unconfirmed(Appointment),
}

impl BookingOutcome {
    pub fn appointment(&self) -> &Appointment {
        match self {
            BookingOutcome::Created(appointment) => appointment,
            BookingOutcome::Unconfirmed(appointment) => appointment,
        }
    }
}

/// Where the flow currently stands. The three non-idle states are
/// mutually exclusive; a new submission clears the previous outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingPhase {
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] BookingError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct BookingFlow {
    client: Arc<ApiClient>,
    phase: Mutex<BookingPhase>,
}

impl BookingFlow {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            phase: Mutex::new(BookingPhase::Idle),
        }
    }

    pub fn phase(&self) -> BookingPhase {
        self.phase
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(BookingPhase::Idle)
    }

    /// Validate and submit the form. State moves Idle/previous →
    /// InFlight → Succeeded or Failed.
    pub fn submit(&self, form: &BookingForm) -> Result<BookingOutcome, SubmitError> {
        self.set_phase(BookingPhase::InFlight);
        let result = self.submit_at(form, Utc::now());
        match &result {
            Ok(outcome) => {
                tracing::info!(
                    id = %outcome.appointment().id,
                    unconfirmed = outcome.appointment().is_unconfirmed(),
                    "appointment booked"
                );
                self.set_phase(BookingPhase::Succeeded);
            }
            Err(e) => self.set_phase(BookingPhase::Failed(e.to_string())),
        }
        result
    }

    /// Submission with an explicit clock, used by `submit` and by tests.
    fn submit_at(
        &self,
        form: &BookingForm,
        now: DateTime<Utc>,
    ) -> Result<BookingOutcome, SubmitError> {
        let payload = form.validate(now)?;
        let body = serde_json::to_value(&payload).expect("payload serializes");

        let response = self
            .client
            .send(Method::Post, "/api/appointments", &[], Some(&body))?;

        if response.is_success() {
            if let Some(appointment) = response.json().and_then(|value| {
                client::record_under(&value, &["data.appointment", "data", "appointment", ""])
            }) {
                return Ok(BookingOutcome::Created(appointment));
            }
            tracing::warn!("creation succeeded without an appointment in the body, reconciling");
            if let Some(found) = self.reconcile(&payload) {
                return Ok(BookingOutcome::Created(found));
            }
            return Ok(BookingOutcome::Unconfirmed(payload.into_unconfirmed()));
        }

        // A server error can mean the write landed but the read-back
        // failed. Check the patient's list before surfacing the error.
        if response.status >= 500 {
            if let Some(found) = self.reconcile(&payload) {
                tracing::info!(id = %found.id, "write confirmed by reconciliation after server error");
                return Ok(BookingOutcome::Created(found));
            }
        }

        Err(ApiClient::error_for(&response).into())
    }

    /// Idempotent fetch-after-write: look for the just-submitted
    /// appointment in the patient's list.
    fn reconcile(&self, payload: &CreateAppointment) -> Option<Appointment> {
        let path = format!("/api/appointments/patient/{}", payload.pacient_id);
        let response = self.client.get(&path).ok()?;
        let appointments: Vec<Appointment> = response
            .json()
            .and_then(|value| client::list_under(&value, &["data.appointments", "appointments", "data", ""]))?;
        appointments
            .into_iter()
            .find(|a| a.doctor_id == payload.doctor_id && a.date_time == payload.date_time)
    }

    fn set_phase(&self, phase: BookingPhase) {
        if let Ok(mut guard) = self.phase.lock() {
            *guard = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::session::MemorySessionStore;
    use crate::transport::MockTransport;
    use serde_json::json;

    fn doctor() -> Doctor {
        Doctor {
            id: "doc-1".into(),
            name: "Dr. Souza".into(),
            specialty: "Cardiologista".into(),
            crm: "CRM/SP 12345".into(),
            email: "souza@example.com".into(),
            phone: None,
            address: None,
            experience: None,
            education: None,
            bio: None,
        }
    }

    fn patient() -> User {
        let mut user = User::new("pac-1", "Ana Lima", "ana@example.com", Role::Pacient);
        user.phone = Some("+55 11 91234-5678".into());
        user
    }

    // Far-future date: submission tests run against the real clock.
    fn form() -> BookingForm {
        BookingForm {
            doctor: Some(doctor()),
            patient: Some(patient()),
            date: "2099-01-12".into(),
            time: "09:30".into(),
            symptoms: "  persistent headache  ".into(),
            notes: String::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-08-06T12:00:00Z".parse().unwrap()
    }

    fn flow(transport: Arc<MockTransport>) -> BookingFlow {
        let client = Arc::new(ApiClient::new(
            "http://t",
            transport,
            Arc::new(MemorySessionStore::new()),
        ));
        BookingFlow::new(client)
    }

    fn server_appointment() -> serde_json::Value {
        json!({
            "id": "srv-1",
            "doctor_id": "doc-1",
            "pacient_id": "pac-1",
            "date_time": "2099-01-12T09:30:00Z",
            "type": "consulta",
            "symptoms": "persistent headache",
            "status": "agendada",
            "specialty": "Cardiologista",
            "doctor_name": "Dr. Souza",
        })
    }

    // ── Slots and horizon ───────────────────────────────────

    #[test]
    fn twenty_one_half_hour_slots() {
        let slots = time_slots();
        assert_eq!(slots.len(), 21);
        assert_eq!(slots[0], NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(slots[1], NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(slots[20], NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    }

    #[test]
    fn booking_horizon_is_one_to_thirty_days() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(earliest_date(today), NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
        assert_eq!(latest_date(today), NaiveDate::from_ymd_opt(2026, 9, 5).unwrap());
    }

    #[test]
    fn success_dismiss_is_one_and_a_half_seconds() {
        assert_eq!(SUCCESS_DISMISS, Duration::from_millis(1500));
    }

    // ── Validation ──────────────────────────────────────────

    #[test]
    fn validation_failures_short_circuit_in_order() {
        let mut form = form();
        form.doctor = None;
        form.patient = None;
        form.date.clear();
        form.symptoms.clear();
        // All fields broken: the doctor check fires first.
        assert_eq!(form.validate(now()).unwrap_err(), BookingError::MissingDoctor);

        form.doctor = Some(doctor());
        assert_eq!(form.validate(now()).unwrap_err(), BookingError::MissingPatient);

        form.patient = Some(patient());
        assert_eq!(form.validate(now()).unwrap_err(), BookingError::MissingSchedule);

        form.date = "2099-01-12".into();
        form.time = "09:30".into();
        assert_eq!(form.validate(now()).unwrap_err(), BookingError::MissingSymptoms);
    }

    #[test]
    fn whitespace_symptoms_are_rejected() {
        let mut form = form();
        form.symptoms = "   \n".into();
        assert_eq!(form.validate(now()).unwrap_err(), BookingError::MissingSymptoms);
    }

    #[test]
    fn malformed_date_or_time_is_invalid() {
        let mut form = form();
        form.date = "01/09/2026".into();
        assert_eq!(form.validate(now()).unwrap_err(), BookingError::InvalidSchedule);

        let mut form = form_with_time("25:99");
        assert_eq!(form.validate(now()).unwrap_err(), BookingError::InvalidSchedule);
        form.time = "09:30".into();
        assert!(form.validate(now()).is_ok());
    }

    fn form_with_time(time: &str) -> BookingForm {
        let mut form = form();
        form.time = time.into();
        form
    }

    #[test]
    fn past_instants_are_rejected() {
        let mut form = form();
        form.date = "2026-08-05".into();
        assert_eq!(form.validate(now()).unwrap_err(), BookingError::PastSchedule);

        // The boundary is strict: exactly "now" is rejected too.
        form.date = "2026-08-06".into();
        form.time = "12:00".into();
        assert_eq!(form.validate(now()).unwrap_err(), BookingError::PastSchedule);
    }

    #[test]
    fn valid_form_builds_scheduled_payload() {
        let payload = form().validate(now()).unwrap();
        assert_eq!(payload.status, BACKEND_SCHEDULED);
        assert_eq!(payload.date_time, "2099-01-12T09:30:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(payload.symptoms, "persistent headache");
        assert_eq!(payload.kind, DEFAULT_KIND);
        assert_eq!(payload.doctor_name, "Dr. Souza");
        assert_eq!(payload.specialty, "Cardiologista");
        assert_eq!(payload.patient_name.as_deref(), Some("Ana Lima"));
        assert_eq!(payload.notes, None);
        assert_eq!(payload.created_at, now());
    }

    // ── Submission ──────────────────────────────────────────

    #[test]
    fn invalid_form_never_reaches_the_network() {
        let transport = Arc::new(MockTransport::new());
        let flow = flow(transport.clone());

        let mut past = form();
        past.date = "2020-01-01".into();
        assert!(matches!(
            flow.submit(&past).unwrap_err(),
            SubmitError::Invalid(BookingError::PastSchedule)
        ));

        let mut blank = form();
        blank.symptoms = "  ".into();
        assert!(matches!(
            flow.submit(&blank).unwrap_err(),
            SubmitError::Invalid(BookingError::MissingSymptoms)
        ));

        assert!(transport.requests().is_empty());
        assert!(matches!(flow.phase(), BookingPhase::Failed(_)));
    }

    #[test]
    fn echoed_record_becomes_created() {
        let transport = Arc::new(MockTransport::new().respond_json(
            201,
            json!({"data": {"appointment": server_appointment()}}),
        ));
        let flow = flow(transport.clone());

        let outcome = flow.submit(&form()).unwrap();
        match outcome {
            BookingOutcome::Created(appointment) => {
                assert_eq!(appointment.id, "srv-1");
                assert!(!appointment.is_unconfirmed());
            }
            other => panic!("expected Created, got {other:?}"),
        }
        assert_eq!(flow.phase(), BookingPhase::Succeeded);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://t/api/appointments");
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body["status"], "agendada");
        assert_eq!(body["type"], "consulta");
    }

    #[test]
    fn empty_success_body_synthesizes_unconfirmed_record() {
        // 2xx with no body, then a reconciliation fetch that finds nothing.
        let transport = Arc::new(
            MockTransport::new()
                .respond(200, "")
                .respond_json(200, json!({"data": {"appointments": []}})),
        );
        let flow = flow(transport.clone());

        let submitted = form().validate(now()).unwrap();
        let outcome = flow.submit(&form()).unwrap();
        match outcome {
            BookingOutcome::Unconfirmed(appointment) => {
                assert!(appointment.is_unconfirmed());
                assert_eq!(appointment.doctor_id, submitted.doctor_id);
                assert_eq!(appointment.pacient_id, submitted.pacient_id);
                assert_eq!(appointment.date_time, submitted.date_time);
                assert_eq!(appointment.symptoms, submitted.symptoms);
                assert_eq!(appointment.status, BACKEND_SCHEDULED);
            }
            other => panic!("expected Unconfirmed, got {other:?}"),
        }
        assert_eq!(flow.phase(), BookingPhase::Succeeded);
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn empty_success_body_reconciles_to_server_record() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(204, "")
                .respond_json(200, json!({"data": {"appointments": [server_appointment()]}})),
        );
        let flow = flow(transport);

        match flow.submit(&form()).unwrap() {
            BookingOutcome::Created(appointment) => assert_eq!(appointment.id, "srv-1"),
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[test]
    fn server_error_reconciles_to_created_when_write_landed() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(500, r#"{"message": "could not load the created record"}"#)
                .respond_json(200, json!({"data": {"appointments": [server_appointment()]}})),
        );
        let flow = flow(transport);

        match flow.submit(&form()).unwrap() {
            BookingOutcome::Created(appointment) => assert_eq!(appointment.id, "srv-1"),
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[test]
    fn server_error_without_written_record_surfaces() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(500, r#"{"message": "boom"}"#)
                .respond_json(200, json!({"data": {"appointments": []}})),
        );
        let flow = flow(transport);

        assert!(matches!(
            flow.submit(&form()).unwrap_err(),
            SubmitError::Api(ApiError::Server { status: 500, .. })
        ));
        assert!(matches!(flow.phase(), BookingPhase::Failed(_)));
    }

    #[test]
    fn client_errors_surface_without_reconciliation() {
        let transport = Arc::new(MockTransport::new().respond(401, "{}"));
        let flow = flow(transport.clone());

        assert!(matches!(
            flow.submit(&form()).unwrap_err(),
            SubmitError::Api(ApiError::Unauthorized)
        ));
        // Only the creation request; no reconciliation fetch on a 4xx.
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn new_submission_clears_previous_outcome() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(401, "{}")
                .respond_json(201, json!({"data": {"appointment": server_appointment()}})),
        );
        let flow = flow(transport);

        assert!(flow.submit(&form()).is_err());
        assert!(matches!(flow.phase(), BookingPhase::Failed(_)));

        assert!(flow.submit(&form()).is_ok());
        assert_eq!(flow.phase(), BookingPhase::Succeeded);
    }
}
