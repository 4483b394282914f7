//! Environment variable names read by this crate.
//!
//! These are purely helpers; handlers only consult the environment
//! when an option is left unset.

/// Google Cloud project id. Cloud Shell and App Engine set it; elsewhere
/// set it yourself to get trace correlation without configuring
/// `HandlerOptions::project_id`.
pub const GOOGLE_CLOUD_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Read an environment variable, treating an empty value as unset.
pub fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Project id from [`GOOGLE_CLOUD_PROJECT_ENV`], if set.
pub fn project_id_from_env() -> Option<String> {
    env_non_empty(GOOGLE_CLOUD_PROJECT_ENV)
}
