//! Doctor directory: search, single-doctor lookup, specialty enumeration.
//!
//! Directory browsing is best-effort, not critical-path. Every fetch
//! failure degrades: search to an empty result set, the specialty list to
//! a fixed fallback, a single-doctor lookup to `None`. Each degradation
//! leaves a trace in the log, and the specialty result carries its
//! provenance so callers can tell a real answer from the fallback.

use std::sync::Arc;

use serde_json::Value;

use crate::client::{self, ApiClient};
use crate::models::Doctor;

/// Shipped specialty list, used whenever the backend enumeration is
/// unavailable so the filter control is never empty.
pub const DEFAULT_SPECIALTIES: &[&str] = &[
    "Cardiologista",
    "Dermatologista",
    "Ortopedista",
    "Pediatra",
    "Ginecologista",
    "Oftalmologista",
    "Neurologista",
    "Psiquiatra",
    "Endocrinologista",
    "Gastroenterologista",
    "Urologista",
    "Otorrinolaringologista",
];

/// Where a specialty list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialtySource {
    /// The backend answered.
    Fetched,
    /// The backend was unavailable; these are the shipped defaults.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialtyList {
    pub source: SpecialtySource,
    pub names: Vec<String>,
}

impl SpecialtyList {
    fn fallback() -> Self {
        Self {
            source: SpecialtySource::Fallback,
            names: DEFAULT_SPECIALTIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct DoctorDirectory {
    client: Arc<ApiClient>,
}

impl DoctorDirectory {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Search doctors by free-text query and/or specialty. Any failure
    /// yields an empty list.
    pub fn search(&self, query: Option<&str>, specialty: Option<&str>) -> Vec<Doctor> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("search", q));
        }
        if let Some(s) = specialty.map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("specialty", s));
        }

        let response = match self.client.get_with("/api/doctor", &params) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "doctor search unavailable, returning no results");
                return Vec::new();
            }
        };

        response
            .json()
            .and_then(|payload| client::list_under(&payload, &["data.doctors", "data", ""]))
            .unwrap_or_else(|| {
                tracing::warn!("doctor search response had no recognizable doctor list");
                Vec::new()
            })
    }

    /// Single doctor by id; `None` on any failure.
    pub fn doctor_by_id(&self, doctor_id: &str) -> Option<Doctor> {
        let path = format!("/api/doctor/{doctor_id}");
        let response = match self.client.get(&path) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(doctor_id, error = %e, "doctor lookup failed");
                return None;
            }
        };
        response
            .json()
            .and_then(|payload| client::record_under(&payload, &["data", ""]))
    }

    /// The specialty enumeration for the filter control. Falls back to
    /// [`DEFAULT_SPECIALTIES`] on any failure, tagged as such.
    pub fn specialties(&self) -> SpecialtyList {
        let response = match self.client.get("/api/doctor/specialties") {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "specialty list unavailable, using shipped defaults");
                return SpecialtyList::fallback();
            }
        };

        let names: Vec<String> = response
            .json()
            .and_then(|payload| {
                for path in ["data", "specialties"] {
                    if let Some(items) = client::at(&payload, path).and_then(Value::as_array) {
                        return Some(
                            items
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect(),
                        );
                    }
                }
                None
            })
            .unwrap_or_default();

        if names.is_empty() {
            tracing::warn!("specialty response had no names, using shipped defaults");
            return SpecialtyList::fallback();
        }

        SpecialtyList {
            source: SpecialtySource::Fetched,
            names,
        }
    }
}
