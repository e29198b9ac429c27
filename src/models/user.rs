use serde::{Deserialize, Serialize};

/// The two authenticated roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pacient,
    Doctor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Pacient => "pacient",
            Role::Doctor => "doctor",
        }
    }

    /// Profile endpoint for this role.
    pub fn profile_path(self) -> &'static str {
        match self {
            Role::Pacient => "/api/pacient/profile",
            Role::Doctor => "/api/doctor/profile",
        }
    }
}

/// The authenticated actor, as cached in the durable session store.
/// Doctor-only fields stay `None` for patients and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    #[serde(rename = "CRM")]
    pub crm: Option<String>,
    pub specialty: Option<String>,
    pub address: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub bio: Option<String>,
}

impl User {
    /// A user with only the identity fields set.
    pub fn new(id: &str, name: &str, email: &str, role: Role) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            phone: None,
            cpf: None,
            crm: None,
            specialty: None,
            address: None,
            experience: None,
            education: None,
            bio: None,
        }
    }
}
