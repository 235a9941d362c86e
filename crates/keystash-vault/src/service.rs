//! The service layer: validation, invariants, redaction, error mapping.
//!
//! Every entry point validates its input before touching storage, maps
//! backend failures into the closed [`VaultError`] taxonomy, and scrubs
//! secret values out of its responses. The only way plaintext leaves this
//! layer is [`VaultService::get_secret_value`] (one explicitly identified
//! secret) and [`VaultService::export_secrets`] (an explicit download).

use keystash_core::{SecretString, REDACTED};
use tracing::debug;

use crate::error::VaultResult;
use crate::repository::VaultRepository;
use crate::types::{
    default_environments, Environment, NewProject, NewSecret, Project, ProjectChanges, Secret,
    SecretChanges, SecretExport,
};
use crate::validate;

/// The caller-facing vault API.
pub struct VaultService {
    repo: VaultRepository,
}

/// Replace a secret's value with the redaction sentinel.
fn redact(mut secret: Secret) -> Secret {
    secret.value = REDACTED.to_string();
    secret
}

impl VaultService {
    pub fn new(repo: VaultRepository) -> Self {
        Self { repo }
    }

    /// The fixed environment lookup table.
    pub fn environments(&self) -> Vec<Environment> {
        default_environments()
    }

    // Projects

    pub async fn list_projects(&self) -> VaultResult<Vec<Project>> {
        Ok(self.repo.list_projects().await?)
    }

    /// A point read; absence is `None`, not an error.
    pub async fn get_project(&self, id: &str) -> VaultResult<Option<Project>> {
        Ok(self.repo.get_project(id).await?)
    }

    pub async fn create_project(&self, input: NewProject) -> VaultResult<Project> {
        validate::project_input(&input.name, input.color.as_deref())?;
        Ok(self.repo.create_project(input).await?)
    }

    pub async fn update_project(
        &self,
        id: &str,
        changes: ProjectChanges,
    ) -> VaultResult<Project> {
        validate::project_input(&changes.name, changes.color.as_deref())?;
        Ok(self.repo.update_project(id, changes).await?)
    }

    /// Deletes the project and every secret under it.
    pub async fn delete_project(&self, id: &str) -> VaultResult<()> {
        Ok(self.repo.delete_project(id).await?)
    }

    // Secrets. Responses are redacted; see get_secret_value for plaintext.

    pub async fn create_secret(
        &self,
        project_id: &str,
        input: NewSecret,
    ) -> VaultResult<Secret> {
        validate::secret_metadata(&input.name, input.environment_id)?;
        validate::secret_value(&input.value)?;
        let secret = self.repo.create_secret(project_id, input).await?;
        Ok(redact(secret))
    }

    pub async fn list_secrets(&self, project_id: &str) -> VaultResult<Vec<Secret>> {
        let secrets = self.repo.list_secrets(project_id).await?;
        Ok(secrets.into_iter().map(redact).collect())
    }

    /// Fetch and decrypt one secret's value.
    pub async fn get_secret_value(
        &self,
        project_id: &str,
        secret_id: &str,
    ) -> VaultResult<SecretString> {
        debug!(project_id, secret_id, "revealing secret value");
        Ok(self.repo.get_secret_value(project_id, secret_id).await?)
    }

    pub async fn update_secret(
        &self,
        project_id: &str,
        changes: SecretChanges,
    ) -> VaultResult<Secret> {
        validate::secret_metadata(&changes.name, changes.environment_id)?;
        let secret = self.repo.update_secret(project_id, changes).await?;
        Ok(redact(secret))
    }

    pub async fn update_secret_value(
        &self,
        project_id: &str,
        secret_id: &str,
        value: &str,
    ) -> VaultResult<()> {
        validate::secret_value(value)?;
        Ok(self
            .repo
            .update_secret_value(project_id, secret_id, value)
            .await?)
    }

    pub async fn delete_secret(&self, project_id: &str, secret_id: &str) -> VaultResult<()> {
        Ok(self.repo.delete_secret(project_id, secret_id).await?)
    }

    /// Export decrypted name/value pairs for a project, optionally limited
    /// to a set of secret ids (for .env-style downloads).
    pub async fn export_secrets(
        &self,
        project_id: &str,
        secret_ids: Option<&[String]>,
    ) -> VaultResult<Vec<SecretExport>> {
        let secrets = self.repo.list_secrets(project_id).await?;
        let selected = secrets
            .into_iter()
            .filter(|s| match secret_ids {
                Some(ids) if !ids.is_empty() => ids.contains(&s.id),
                _ => true,
            });

        let mut exports = Vec::new();
        for secret in selected {
            let value = self.repo.get_secret_value(project_id, &secret.id).await?;
            exports.push(SecretExport {
                name: secret.name,
                value: value.expose_secret().to_string(),
            });
        }
        debug!(project_id, count = exports.len(), "exported secrets");
        Ok(exports)
    }
}
