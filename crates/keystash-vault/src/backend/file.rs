//! File-backed store: the whole dataset in one JSON document.
//!
//! Every mutation reads the entire file, applies the change in memory, and
//! writes the entire file back. That cycle is serialized in-process by a
//! single-writer lock, and the write itself goes through a temp file plus
//! rename so readers never observe a partial document. Nothing protects the
//! file against a second *process* mutating it concurrently; a known,
//! accepted limitation of this backend at its intended scale (single
//! process, low secret count).

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use keystash_core::id;

use crate::error::{StoreError, StoreResult};
use crate::types::{
    default_environments, Environment, NewProject, NewSecret, Project, ProjectChanges, Secret,
    SecretChanges, SecretKind,
};

use super::VaultBackend;

/// On-disk document: all projects, each embedding its secrets, plus the
/// fixed environment table (written for readers of the raw file, ignored on
/// load).
#[derive(Debug, Default, Serialize, Deserialize)]
struct DataFile {
    projects: Vec<StoredProject>,
    #[serde(default)]
    environments: Vec<Environment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProject {
    id: String,
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    secrets: Vec<StoredSecret>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSecret {
    id: String,
    name: String,
    description: String,
    #[serde(rename = "type")]
    kind: SecretKind,
    value: String,
    environment_id: i32,
    updated_at: DateTime<Utc>,
}

impl StoredProject {
    /// Project metadata without the embedded secrets.
    fn metadata(&self) -> Project {
        Project {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
        }
    }
}

impl StoredSecret {
    fn to_secret(&self, project_id: &str) -> Secret {
        Secret {
            id: self.id.clone(),
            project_id: project_id.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.kind,
            value: self.value.clone(),
            environment_id: self.environment_id,
            updated_at: self.updated_at,
        }
    }
}

/// A store keeping all projects and secrets in one JSON document.
pub struct FileBackend {
    path: PathBuf,
    /// Serializes the read-modify-write cycle within this process.
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Create a store rooted at `path`. The file is created lazily on the
    /// first mutation; a missing file reads as an empty dataset.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> StoreResult<DataFile> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DataFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the document atomically: write a temp file, then rename.
    async fn store(&self, doc: &mut DataFile) -> StoreResult<()> {
        doc.environments = default_environments();
        let data = serde_json::to_string_pretty(doc)?;
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

fn project_mut<'a>(doc: &'a mut DataFile, id: &str) -> Option<&'a mut StoredProject> {
    doc.projects.iter_mut().find(|p| p.id == id)
}

fn project_not_found(id: &str) -> StoreError {
    StoreError::NotFound(format!("Project {id}"))
}

fn secret_not_found(id: &str) -> StoreError {
    StoreError::NotFound(format!("Secret {id}"))
}

#[async_trait]
impl VaultBackend for FileBackend {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        // Insertion order, as the document has it.
        let doc = self.load().await?;
        Ok(doc.projects.iter().map(StoredProject::metadata).collect())
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        let doc = self.load().await?;
        Ok(doc
            .projects
            .iter()
            .find(|p| p.id == id)
            .map(StoredProject::metadata))
    }

    async fn create_project(&self, input: NewProject) -> StoreResult<Project> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;

        let lower_name = input.name.to_lowercase();
        if doc
            .projects
            .iter()
            .any(|p| p.name.to_lowercase() == lower_name)
        {
            return Err(StoreError::UniqueViolation(input.name));
        }

        let stored = StoredProject {
            id: id::uuid(),
            name: input.name,
            description: input.description,
            color: input.color,
            secrets: Vec::new(),
        };
        let project = stored.metadata();
        debug!(project_id = %project.id, "creating project");
        doc.projects.push(stored);
        self.store(&mut doc).await?;
        Ok(project)
    }

    async fn update_project(&self, id: &str, changes: ProjectChanges) -> StoreResult<Project> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;

        // No uniqueness re-check on rename in this backend.
        let stored = project_mut(&mut doc, id).ok_or_else(|| project_not_found(id))?;
        stored.name = changes.name;
        stored.description = changes.description;
        stored.color = changes.color;
        let project = stored.metadata();

        self.store(&mut doc).await?;
        Ok(project)
    }

    async fn delete_project(&self, id: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;

        // Idempotent: deleting an unknown id is a no-op in this backend.
        let Some(index) = doc.projects.iter().position(|p| p.id == id) else {
            return Ok(());
        };
        debug!(project_id = %id, "deleting project and its secrets");
        doc.projects.remove(index);
        self.store(&mut doc).await?;
        Ok(())
    }

    async fn create_secret(&self, project_id: &str, input: NewSecret) -> StoreResult<Secret> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;

        let project =
            project_mut(&mut doc, project_id).ok_or_else(|| project_not_found(project_id))?;

        let stored = StoredSecret {
            id: id::uuid(),
            name: input.name,
            description: input.description,
            kind: input.kind,
            value: input.value,
            environment_id: input.environment_id,
            updated_at: Utc::now(),
        };
        let secret = stored.to_secret(project_id);
        debug!(project_id, secret_id = %secret.id, "creating secret");
        project.secrets.push(stored);

        self.store(&mut doc).await?;
        Ok(secret)
    }

    async fn list_secrets(&self, project_id: &str) -> StoreResult<Vec<Secret>> {
        let doc = self.load().await?;

        // Listing a missing project is an error in this backend.
        let project = doc
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| project_not_found(project_id))?;
        Ok(project
            .secrets
            .iter()
            .map(|s| s.to_secret(project_id))
            .collect())
    }

    async fn get_secret_value(&self, project_id: &str, secret_id: &str) -> StoreResult<String> {
        let doc = self.load().await?;

        let project = doc
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| project_not_found(project_id))?;
        let secret = project
            .secrets
            .iter()
            .find(|s| s.id == secret_id)
            .ok_or_else(|| secret_not_found(secret_id))?;
        Ok(secret.value.clone())
    }

    async fn update_secret(
        &self,
        project_id: &str,
        changes: SecretChanges,
    ) -> StoreResult<Secret> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;

        let project =
            project_mut(&mut doc, project_id).ok_or_else(|| project_not_found(project_id))?;
        let stored = project
            .secrets
            .iter_mut()
            .find(|s| s.id == changes.id)
            .ok_or_else(|| secret_not_found(&changes.id))?;

        stored.name = changes.name;
        stored.description = changes.description;
        stored.kind = changes.kind;
        stored.environment_id = changes.environment_id;
        stored.updated_at = Utc::now();
        let secret = stored.to_secret(project_id);

        self.store(&mut doc).await?;
        Ok(secret)
    }

    async fn update_secret_value(
        &self,
        project_id: &str,
        secret_id: &str,
        value: String,
    ) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;

        let project =
            project_mut(&mut doc, project_id).ok_or_else(|| project_not_found(project_id))?;
        let stored = project
            .secrets
            .iter_mut()
            .find(|s| s.id == secret_id)
            .ok_or_else(|| secret_not_found(secret_id))?;

        stored.value = value;
        stored.updated_at = Utc::now();

        self.store(&mut doc).await?;
        Ok(())
    }

    async fn delete_secret(&self, project_id: &str, secret_id: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;

        // Idempotent: a missing project or secret is a no-op in this backend.
        let Some(project) = project_mut(&mut doc, project_id) else {
            return Ok(());
        };
        let Some(index) = project.secrets.iter().position(|s| s.id == secret_id) else {
            return Ok(());
        };
        debug!(project_id, secret_id, "deleting secret");
        project.secrets.remove(index);

        self.store(&mut doc).await?;
        Ok(())
    }
}
