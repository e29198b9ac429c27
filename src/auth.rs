//! Credential exchange and account management.
//!
//! The backend keeps separate credential endpoints per role, so login
//! tries the patient endpoint first and falls back to the doctor one.
//! A successful exchange persists the token and user snapshot to the
//! durable session store; every later request reads the token from there.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::{self, ApiClient, ApiError};
use crate::models::{Role, User};
use crate::session::{Session, SessionError, SessionStore};
use crate::transport::Method;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no active session")]
    NotSignedIn,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Patient registration payload. 409 on duplicate CPF or email.
#[derive(Debug, Clone, Serialize)]
pub struct PacientRegistration {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub password: String,
}

/// Doctor registration payload. 409 on duplicate CPF, CRM or email.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorRegistration {
    pub name: String,
    pub email: String,
    pub crm: String,
    pub specialty: String,
    pub password: String,
    pub cpf: String,
    pub phone: String,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(address) = &self.address {
            user.address = Some(address.clone());
        }
        if let Some(specialty) = &self.specialty {
            user.specialty = Some(specialty.clone());
        }
        if let Some(experience) = &self.experience {
            user.experience = Some(experience.clone());
        }
        if let Some(education) = &self.education {
            user.education = Some(education.clone());
        }
        if let Some(bio) = &self.bio {
            user.bio = Some(bio.clone());
        }
    }
}

pub struct AuthService {
    client: Arc<ApiClient>,
    store: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>, store: Arc<dyn SessionStore>) -> Self {
        Self { client, store }
    }

    /// Exchange credentials (email or CPF plus password) for a session.
    /// Tries the patient endpoint, then the doctor endpoint; transport
    /// failures abort, refusals fall through to the next role.
    pub fn login(&self, login: &str, password: &str) -> Result<User, AuthError> {
        if login.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation("login and password are required".into()).into());
        }

        let body = json!({ "login": login, "password": password });

        let hit = match self.attempt("/api/pacient/login", Role::Pacient, &body)? {
            Some(hit) => hit,
            None => self
                .attempt("/api/doctor/login", Role::Doctor, &body)?
                .ok_or(AuthError::InvalidCredentials)?,
        };

        let (user, token) = hit;
        self.store.save(&Session {
            token,
            user: user.clone(),
        })?;
        tracing::info!(role = %user.role.as_str(), "signed in");
        Ok(user)
    }

    /// Clear the durable store (token and cached user).
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()?;
        tracing::info!("signed out");
        Ok(())
    }

    pub fn register_pacient(&self, registration: &PacientRegistration) -> Result<(), AuthError> {
        let body = serde_json::to_value(registration).expect("registration serializes");
        self.client.post("/api/pacient/register", &body)?;
        Ok(())
    }

    pub fn register_doctor(&self, registration: &DoctorRegistration) -> Result<(), AuthError> {
        let body = serde_json::to_value(registration).expect("registration serializes");
        self.client.post("/api/doctor/register", &body)?;
        Ok(())
    }

    /// Authenticated profile update for the signed-in role. On success
    /// the stored user snapshot is updated too, keeping the durable
    /// cache consistent with what the server accepted.
    pub fn update_profile(&self, update: &ProfileUpdate) -> Result<User, AuthError> {
        let mut session = self.store.load().ok_or(AuthError::NotSignedIn)?;

        let body = serde_json::to_value(update).expect("profile update serializes");
        self.client.put(session.user.role.profile_path(), &body)?;

        update.apply(&mut session.user);
        self.store.save(&session)?;
        Ok(session.user)
    }

    /// One login attempt against one role's endpoint. `Ok(None)` means
    /// the endpoint refused (or answered unusably); errors are reserved
    /// for transport failures.
    fn attempt(
        &self,
        path: &str,
        role: Role,
        body: &Value,
    ) -> Result<Option<(User, String)>, ApiError> {
        let response = self.client.send(Method::Post, path, &[], Some(body))?;
        if !response.is_success() {
            return Ok(None);
        }
        let Some(payload) = response.json() else {
            return Ok(None);
        };
        // Some deployments answer 200 with success=false for bad credentials.
        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }
        Ok(parse_login(&payload, role))
    }
}

/// Tolerant user shape inside a login response.
#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    token: Option<String>,
    phone: Option<String>,
    cpf: Option<String>,
    #[serde(rename = "CRM")]
    crm: Option<String>,
    specialty: Option<String>,
    address: Option<String>,
    experience: Option<String>,
    education: Option<String>,
    bio: Option<String>,
}

/// Pull (user, token) out of a login payload. The user record sits under
/// `data.pacient` or `data.doctor`; the token under `data.token`, on the
/// record itself, or at the top level (flatter variants tolerated).
fn parse_login(payload: &Value, role: Role) -> Option<(User, String)> {
    let record_path = match role {
        Role::Pacient => "data.pacient",
        Role::Doctor => "data.doctor",
    };
    let wire: WireUser = client::record_under(payload, &[record_path])?;
    if wire.id.is_empty() {
        return None;
    }

    let token = client::at(payload, "data.token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| wire.token.clone())
        .or_else(|| {
            payload
                .get("token")
                .and_then(Value::as_str)
                .map(str::to_string)
        })?;

    let user = User {
        id: wire.id,
        name: wire.name,
        email: wire.email,
        role,
        phone: wire.phone,
        cpf: wire.cpf,
        crm: wire.crm,
        specialty: wire.specialty,
        address: wire.address,
        experience: wire.experience,
        education: wire.education,
        bio: wire.bio,
    };
    Some((user, token))
}
