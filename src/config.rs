use std::env;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedAgenda";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the backend base URL.
pub const API_URL_VAR: &str = "MEDAGENDA_API_URL";

/// Backend used when the environment does not say otherwise.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Per-request timeout for API calls, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Base URL of the booking API, trailing slash stripped.
pub fn api_base_url() -> String {
    let url = env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    url.trim_end_matches('/').to_string()
}

/// Get the application data directory
/// ~/MedAgenda/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("MedAgenda")
}

/// Durable session file, the local-storage analogue for token + cached user.
pub fn session_file() -> PathBuf {
    app_data_dir().join("session.json")
}

pub fn default_log_filter() -> &'static str {
    "medagenda=info"
}
