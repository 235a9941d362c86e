//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
pub fn get_var_or(name: &str, default: &str) -> String {
    get_var(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Common environment variable names.
pub mod vars {
    /// Path to the JSON document holding all projects and secrets (file backend).
    pub const KEYSTASH_DATA_FILE: &str = "KEYSTASH_DATA_FILE";

    /// SQLite connection string (relational backend).
    pub const KEYSTASH_DATABASE_URL: &str = "KEYSTASH_DATABASE_URL";

    /// At-rest encryption key; encryption is disabled when unset or blank.
    pub const KEYSTASH_ENC_KEY: &str = "KEYSTASH_ENC_KEY";

    /// Symmetric cipher identifier.
    pub const KEYSTASH_ENC_ALGO: &str = "KEYSTASH_ENC_ALGO";

    /// Key-derivation salt.
    pub const KEYSTASH_ENC_SALT: &str = "KEYSTASH_ENC_SALT";

    /// Keystash log level.
    pub const KEYSTASH_LOG: &str = "KEYSTASH_LOG";
}
