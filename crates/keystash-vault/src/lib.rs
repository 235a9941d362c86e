//! Encrypted project/secret storage for Keystash.
//!
//! Secrets are grouped into projects, tagged with a deployment environment,
//! encrypted at rest, and redacted by default when listed. Two
//! interchangeable persistence backends sit behind the [`VaultBackend`]
//! trait: a single-JSON-document file store and a SQLite store. The
//! [`VaultRepository`] wraps a backend with transparent encryption, and the
//! [`VaultService`] on top enforces validation, invariants, and the
//! redaction policy.
//!
//! Construction is explicit throughout; [`open`] is the one-call assembly
//! point for a configured vault.

pub mod backend;
pub mod cipher;
pub mod config;
pub mod error;
pub mod repository;
pub mod service;
pub mod types;
pub mod validate;

use std::sync::Arc;

pub use backend::{FileBackend, SqliteBackend, VaultBackend};
pub use cipher::{Cipher, CipherError, DecryptPolicy};
pub use config::{BackendConfig, CipherAlgorithm, EncryptionConfig, VaultConfig};
pub use error::{FieldError, StoreError, VaultError, VaultResult};
pub use repository::VaultRepository;
pub use service::VaultService;
pub use types::{
    default_environments, Environment, NewProject, NewSecret, Project, ProjectChanges, Secret,
    SecretChanges, SecretExport, SecretKind, ENV_DEVELOPMENT, ENV_PRODUCTION, ENV_STAGING,
};

/// Assemble a [`VaultService`] from configuration.
///
/// Picks the backend the configuration names, wires it to a cipher with the
/// default fail-open decrypt policy, and returns the ready service. Intended
/// to be called once per process; the result is cheap to share.
pub async fn open(config: &VaultConfig) -> VaultResult<VaultService> {
    let backend: Arc<dyn VaultBackend> = match &config.backend {
        BackendConfig::File { path } => Arc::new(FileBackend::new(path.clone())),
        BackendConfig::Database { url } => Arc::new(SqliteBackend::open(url).await?),
    };
    let cipher = Cipher::from_config(&config.encryption);
    Ok(VaultService::new(VaultRepository::new(backend, cipher)))
}
