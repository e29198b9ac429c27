//! Typed JSON client for the booking API.
//!
//! Owns the three cross-cutting concerns of every call:
//! - bearer-token attachment from the durable session store,
//! - mapping HTTP statuses into the small user-facing error taxonomy,
//! - tolerating the backend's inconsistent response envelopes (a payload
//!   may arrive bare, under `data`, or under a handful of named keys).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::session::SessionStore;
use crate::transport::{HttpTransport, Method, RawResponse, TransportError};

/// User-facing error taxonomy. Validation errors never reach this type;
/// they are caught before any request is made.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The body was not the JSON the endpoint promised.
    #[error("invalid server response")]
    InvalidResponse,
    /// 400 with the server's message, or a generic one.
    #[error("{0}")]
    Validation(String),
    /// 401: bad credentials or expired token.
    #[error("not authorized, sign in again")]
    Unauthorized,
    /// 404: record or service absent.
    #[error("service not found")]
    NotFound,
    /// 409: duplicate CPF/CRM/email on registration.
    #[error("already registered: {0}")]
    Duplicate(String),
    /// Any other non-2xx.
    #[error("server error: {message}")]
    Server { status: u16, message: String },
}

pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            store,
        }
    }

    /// Client pointed at the configured base URL.
    pub fn from_env(transport: Arc<dyn HttpTransport>, store: Arc<dyn SessionStore>) -> Self {
        Self::new(&crate::config::api_base_url(), transport, store)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request without interpreting the status. Callers that need
    /// to react to specific non-2xx responses (login fallback, creation
    /// reconciliation) use this directly.
    pub fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<RawResponse, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.store.token();
        let response = self
            .transport
            .execute(method, &url, query, token.as_deref(), body)?;
        tracing::debug!(method = %method, path, status = response.status, "API call");
        Ok(response)
    }

    pub fn get(&self, path: &str) -> Result<RawResponse, ApiError> {
        self.send(Method::Get, path, &[], None).and_then(ensure_success)
    }

    pub fn get_with(&self, path: &str, query: &[(&str, &str)]) -> Result<RawResponse, ApiError> {
        self.send(Method::Get, path, query, None).and_then(ensure_success)
    }

    pub fn post(&self, path: &str, body: &Value) -> Result<RawResponse, ApiError> {
        self.send(Method::Post, path, &[], Some(body)).and_then(ensure_success)
    }

    pub fn put(&self, path: &str, body: &Value) -> Result<RawResponse, ApiError> {
        self.send(Method::Put, path, &[], Some(body)).and_then(ensure_success)
    }

    pub fn delete(&self, path: &str) -> Result<RawResponse, ApiError> {
        self.send(Method::Delete, path, &[], None).and_then(ensure_success)
    }

    /// Map a non-2xx response into the error taxonomy.
    pub fn error_for(response: &RawResponse) -> ApiError {
        let message = response
            .json()
            .as_ref()
            .and_then(server_message)
            .unwrap_or_default();

        match response.status {
            400 => ApiError::Validation(or_default(message, "invalid request data")),
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound,
            409 => ApiError::Duplicate(or_default(message, "duplicate record")),
            status => ApiError::Server {
                status,
                message: or_default(message, &format!("error {status}")),
            },
        }
    }
}

fn ensure_success(response: RawResponse) -> Result<RawResponse, ApiError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiClient::error_for(&response))
    }
}

fn or_default(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// The server's own message, under either of its two conventional keys.
fn server_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

// ─── Envelope extraction ──────────────────────────────────────────────────────

/// Resolve a dot-separated path inside a JSON value. The empty path is
/// the value itself.
pub(crate) fn at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for key in path.split('.') {
        current = current.get(key)?;
    }
    Some(current)
}

/// Decode a list from the first path holding an array. Malformed items
/// are skipped with a trace rather than failing the whole list; no path
/// holding an array yields `None`.
pub(crate) fn list_under<T: DeserializeOwned>(value: &Value, paths: &[&str]) -> Option<Vec<T>> {
    for path in paths {
        let Some(items) = at(value, path).and_then(Value::as_array) else {
            continue;
        };
        let decoded = items
            .iter()
            .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed record in response");
                    None
                }
            })
            .collect();
        return Some(decoded);
    }
    None
}

/// Decode a single record from the first path that deserializes.
pub(crate) fn record_under<T: DeserializeOwned>(value: &Value, paths: &[&str]) -> Option<T> {
    for path in paths {
        let Some(candidate) = at(value, path) else {
            continue;
        };
        if let Ok(record) = serde_json::from_value(candidate.clone()) {
            return Some(record);
        }
    }
    None
}
