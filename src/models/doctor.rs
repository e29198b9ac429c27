use serde::{Deserialize, Serialize};

/// A doctor as returned by the directory endpoints. Read-only booking
/// context; never mutated by this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    /// Professional license identifier; opaque here.
    #[serde(rename = "CRM", default)]
    pub crm: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub bio: Option<String>,
}
