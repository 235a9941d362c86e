//! Persistence backends.
//!
//! Two interchangeable implementations of [`VaultBackend`]: a single-JSON-
//! document file store and a SQLite store. Backends own durability and the
//! storage-level invariants; they never touch cryptography: secret values
//! arrive and leave as whatever is stored at rest.

mod file;
mod sqlite;

pub use file::FileBackend;
pub use sqlite::SqliteBackend;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{
    NewProject, NewSecret, Project, ProjectChanges, Secret, SecretChanges,
};

/// Async trait for vault storage backends.
///
/// Backends generate ids and timestamps themselves. Where the two variants
/// deliberately diverge (missing-target behavior of `delete_project`,
/// `list_secrets`, and `delete_secret`), each method's implementation
/// documents its choice; callers must not assume cross-variant parity there.
#[async_trait]
pub trait VaultBackend: Send + Sync {
    /// List all projects. The SQLite backend orders by name ascending; the
    /// file backend preserves insertion order.
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    /// Fetch a single project, or `None` if the id is unknown.
    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>>;

    /// Create a project. Fails with `UniqueViolation` if the name collides
    /// case-insensitively with an existing project; storage is not mutated
    /// on failure.
    async fn create_project(&self, input: NewProject) -> StoreResult<Project>;

    /// Update a project's name/description/color. Fails with `NotFound` if
    /// the id is unknown.
    async fn update_project(&self, id: &str, changes: ProjectChanges) -> StoreResult<Project>;

    /// Delete a project and, by cascade, every secret under it.
    async fn delete_project(&self, id: &str) -> StoreResult<()>;

    /// Create a secret under a project. Fails with `NotFound` if the project
    /// does not exist.
    async fn create_secret(&self, project_id: &str, input: NewSecret) -> StoreResult<Secret>;

    /// List the secrets of a project, values as stored.
    async fn list_secrets(&self, project_id: &str) -> StoreResult<Vec<Secret>>;

    /// Fetch a single secret's stored value (ciphertext when encryption is
    /// enabled). Fails with `NotFound` if missing.
    async fn get_secret_value(&self, project_id: &str, secret_id: &str) -> StoreResult<String>;

    /// Update a secret's metadata (name/description/kind/environment) and
    /// bump `updated_at`. Never touches the stored value.
    async fn update_secret(
        &self,
        project_id: &str,
        changes: SecretChanges,
    ) -> StoreResult<Secret>;

    /// Replace a secret's stored value and bump `updated_at`. Never touches
    /// metadata.
    async fn update_secret_value(
        &self,
        project_id: &str,
        secret_id: &str,
        value: String,
    ) -> StoreResult<()>;

    /// Delete a single secret.
    async fn delete_secret(&self, project_id: &str, secret_id: &str) -> StoreResult<()>;
}
