//! The vault repository: persistence plus transparent encryption.
//!
//! This is the only component that calls the cipher, and the only place
//! that decides whether a stored value is decrypted. Values are encrypted
//! on the way into a backend and decrypted only on the explicit
//! single-value fetch; list operations pass stored values through
//! untouched (the service layer redacts them before they reach a caller).

use std::sync::Arc;

use keystash_core::SecretString;

use crate::backend::VaultBackend;
use crate::cipher::Cipher;
use crate::error::{StoreError, StoreResult};
use crate::types::{
    NewProject, NewSecret, Project, ProjectChanges, Secret, SecretChanges,
};

/// Storage backend composed with the cipher.
///
/// Constructed explicitly and passed down; there is no process-wide
/// instance. Tests can hand in any backend and cipher combination.
pub struct VaultRepository {
    backend: Arc<dyn VaultBackend>,
    cipher: Cipher,
}

impl VaultRepository {
    pub fn new(backend: Arc<dyn VaultBackend>, cipher: Cipher) -> Self {
        Self { backend, cipher }
    }

    // Projects: pure pass-through, no cryptography involved.

    pub async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.backend.list_projects().await
    }

    pub async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        self.backend.get_project(id).await
    }

    pub async fn create_project(&self, input: NewProject) -> StoreResult<Project> {
        self.backend.create_project(input).await
    }

    pub async fn update_project(
        &self,
        id: &str,
        changes: ProjectChanges,
    ) -> StoreResult<Project> {
        self.backend.update_project(id, changes).await
    }

    pub async fn delete_project(&self, id: &str) -> StoreResult<()> {
        self.backend.delete_project(id).await
    }

    // Secrets: values are encrypted before they reach a backend and
    // decrypted only in get_secret_value.

    pub async fn create_secret(
        &self,
        project_id: &str,
        mut input: NewSecret,
    ) -> StoreResult<Secret> {
        input.value = self
            .cipher
            .encrypt(&input.value)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;
        self.backend.create_secret(project_id, input).await
    }

    pub async fn list_secrets(&self, project_id: &str) -> StoreResult<Vec<Secret>> {
        // Values stay as stored; no decryption for list views.
        self.backend.list_secrets(project_id).await
    }

    pub async fn get_secret_value(
        &self,
        project_id: &str,
        secret_id: &str,
    ) -> StoreResult<SecretString> {
        let stored = self.backend.get_secret_value(project_id, secret_id).await?;
        let plaintext = self
            .cipher
            .decrypt(&stored)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;
        Ok(SecretString::new(plaintext))
    }

    pub async fn update_secret(
        &self,
        project_id: &str,
        changes: SecretChanges,
    ) -> StoreResult<Secret> {
        self.backend.update_secret(project_id, changes).await
    }

    pub async fn update_secret_value(
        &self,
        project_id: &str,
        secret_id: &str,
        value: &str,
    ) -> StoreResult<()> {
        let encrypted = self
            .cipher
            .encrypt(value)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;
        self.backend
            .update_secret_value(project_id, secret_id, encrypted)
            .await
    }

    pub async fn delete_secret(&self, project_id: &str, secret_id: &str) -> StoreResult<()> {
        self.backend.delete_secret(project_id, secret_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FileBackend;
    use crate::config::EncryptionConfig;
    use crate::types::{SecretKind, ENV_DEVELOPMENT};
    use tempfile::TempDir;

    fn encrypted_repo() -> (VaultRepository, TempDir) {
        let tmp = TempDir::new().unwrap();
        let backend = Arc::new(FileBackend::new(tmp.path().join("vault.json")));
        let cipher = Cipher::from_config(&EncryptionConfig::with_key("k1", "saltysaltysalty"));
        (VaultRepository::new(backend, cipher), tmp)
    }

    fn new_secret(value: &str) -> NewSecret {
        NewSecret {
            name: "CI_TOKEN".to_string(),
            description: String::new(),
            kind: SecretKind::Token,
            value: value.to_string(),
            environment_id: ENV_DEVELOPMENT,
        }
    }

    #[tokio::test]
    async fn test_value_is_encrypted_before_it_reaches_the_backend() {
        let (repo, _tmp) = encrypted_repo();
        let project = repo
            .create_project(NewProject {
                name: "Infra".to_string(),
                description: String::new(),
                color: None,
            })
            .await
            .unwrap();

        let secret = repo
            .create_secret(&project.id, new_secret("abc123"))
            .await
            .unwrap();

        // The repository's own result still carries the ciphertext.
        assert_ne!(secret.value, "abc123");
        assert!(secret.value.contains(':'));

        // And so does a list fetch: no decryption on that path.
        let listed = repo.list_secrets(&project.id).await.unwrap();
        assert_ne!(listed[0].value, "abc123");
    }

    #[tokio::test]
    async fn test_get_secret_value_decrypts() {
        let (repo, _tmp) = encrypted_repo();
        let project = repo
            .create_project(NewProject {
                name: "Infra".to_string(),
                description: String::new(),
                color: None,
            })
            .await
            .unwrap();
        let secret = repo
            .create_secret(&project.id, new_secret("abc123"))
            .await
            .unwrap();

        let value = repo.get_secret_value(&project.id, &secret.id).await.unwrap();
        assert_eq!(value.expose_secret(), "abc123");
    }

    #[tokio::test]
    async fn test_update_secret_value_re_encrypts() {
        let (repo, _tmp) = encrypted_repo();
        let project = repo
            .create_project(NewProject {
                name: "Infra".to_string(),
                description: String::new(),
                color: None,
            })
            .await
            .unwrap();
        let secret = repo
            .create_secret(&project.id, new_secret("abc123"))
            .await
            .unwrap();

        repo.update_secret_value(&project.id, &secret.id, "xyz789")
            .await
            .unwrap();

        let listed = repo.list_secrets(&project.id).await.unwrap();
        assert_ne!(listed[0].value, "xyz789");
        let value = repo.get_secret_value(&project.id, &secret.id).await.unwrap();
        assert_eq!(value.expose_secret(), "xyz789");
    }
}
