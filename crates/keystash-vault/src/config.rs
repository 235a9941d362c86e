//! Vault configuration.
//!
//! Configuration is an explicitly constructed value passed down to the
//! components that need it. `from_env` is a convenience for binaries; tests
//! and embedders build a [`VaultConfig`] directly.

use std::path::PathBuf;

use keystash_core::env::{self, vars};
use keystash_core::{ConfigError, SecretString};

/// Symmetric cipher identifier for at-rest encryption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CipherAlgorithm {
    /// AES-256-GCM with a fresh random 96-bit IV per encryption.
    #[default]
    Aes256Gcm,
}

impl CipherAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherAlgorithm::Aes256Gcm => "aes-256-gcm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "aes-256-gcm" => Some(CipherAlgorithm::Aes256Gcm),
            _ => None,
        }
    }
}

/// Default key-derivation salt.
///
/// A fixed literal used when `KEYSTASH_ENC_SALT` is unset. Argon2 requires at
/// least 8 salt bytes. A shared literal salt is weak; do not rely on it in
/// production.
pub const DEFAULT_SALT: &str = "keystash-dev-salt";

/// At-rest encryption settings.
#[derive(Debug, Clone, Default)]
pub struct EncryptionConfig {
    /// Encryption key. When `None`, values are stored and returned as
    /// plaintext (pass-through mode, usable for development).
    pub key: Option<SecretString>,

    /// Cipher to use when a key is configured.
    pub algorithm: CipherAlgorithm,

    /// Salt fed into key derivation.
    pub salt: String,
}

impl EncryptionConfig {
    /// Encryption disabled; values pass through unchanged.
    pub fn disabled() -> Self {
        Self {
            key: None,
            algorithm: CipherAlgorithm::default(),
            salt: DEFAULT_SALT.to_string(),
        }
    }

    /// Encryption enabled with the given key and salt.
    pub fn with_key(key: impl Into<SecretString>, salt: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            algorithm: CipherAlgorithm::default(),
            salt: salt.into(),
        }
    }
}

/// Which persistence backend to run against.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Single JSON document at the given path.
    File { path: PathBuf },

    /// Relational store reached via a SQLite connection string.
    Database { url: String },
}

/// Complete vault configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub backend: BackendConfig,
    pub encryption: EncryptionConfig,
}

impl VaultConfig {
    /// Read configuration from `KEYSTASH_*` environment variables.
    ///
    /// Backend selection: `KEYSTASH_DATABASE_URL` wins when set; otherwise
    /// `KEYSTASH_DATA_FILE` is required and selects the file backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match env::get_var(vars::KEYSTASH_DATABASE_URL) {
            Some(url) => BackendConfig::Database { url },
            None => {
                let path = env::get_var(vars::KEYSTASH_DATA_FILE).ok_or_else(|| {
                    ConfigError::Missing(format!(
                        "{} or {}",
                        vars::KEYSTASH_DATABASE_URL,
                        vars::KEYSTASH_DATA_FILE
                    ))
                })?;
                BackendConfig::File {
                    path: PathBuf::from(path),
                }
            }
        };

        let algorithm = match env::get_var(vars::KEYSTASH_ENC_ALGO) {
            None => CipherAlgorithm::default(),
            Some(s) => CipherAlgorithm::parse(&s).ok_or_else(|| ConfigError::Invalid {
                key: vars::KEYSTASH_ENC_ALGO.to_string(),
                reason: format!("unsupported cipher: {s}"),
            })?,
        };

        let encryption = EncryptionConfig {
            key: env::get_var(vars::KEYSTASH_ENC_KEY).map(SecretString::from),
            algorithm,
            salt: env::get_var_or(vars::KEYSTASH_ENC_SALT, DEFAULT_SALT),
        };

        Ok(Self {
            backend,
            encryption,
        })
    }
}
