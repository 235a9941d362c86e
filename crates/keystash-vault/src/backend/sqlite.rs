//! SQLite-backed store.
//!
//! Projects and secrets live in separate tables with a foreign key from
//! secret to project. Storage-level mechanisms carry the invariants: a
//! `COLLATE NOCASE` unique index enforces case-insensitive project-name
//! uniqueness, and `ON DELETE CASCADE` removes a project's secrets with it.
//! One statement per operation; concurrency safety is the database's own
//! per-statement atomicity.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::debug;

use keystash_core::id;

use crate::error::{StoreError, StoreResult};
use crate::types::{
    NewProject, NewSecret, Project, ProjectChanges, Secret, SecretChanges, SecretKind,
};

use super::VaultBackend;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

type SecretRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    i64,
    DateTime<Utc>,
);

/// A store backed by a SQLite database.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (creating if missing) the database at `url` and run migrations.
    pub async fn open(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(StoreError::Database)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

        Ok(Self { pool })
    }

    /// An in-memory database, for tests.
    pub async fn open_in_memory() -> StoreResult<Self> {
        Self::open("sqlite::memory:").await
    }

    async fn fetch_secret(&self, project_id: &str, secret_id: &str) -> StoreResult<Secret> {
        let row = sqlx::query_as::<_, SecretRow>(
            "SELECT id, project_id, name, description, kind, value, environment_id, updated_at
             FROM secrets WHERE id = ? AND project_id = ?",
        )
        .bind(secret_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("Secret {secret_id}")))?;
        row_to_secret(row)
    }
}

fn row_to_secret(row: SecretRow) -> StoreResult<Secret> {
    let (id, project_id, name, description, kind, value, environment_id, updated_at) = row;
    let kind = SecretKind::parse(&kind)
        .ok_or_else(|| StoreError::Malformed(format!("unknown secret kind: {kind}")))?;
    Ok(Secret {
        id,
        project_id,
        name,
        description,
        kind,
        value,
        environment_id: environment_id as i32,
        updated_at,
    })
}

fn row_to_project(row: (String, String, String, Option<String>)) -> Project {
    let (id, name, description, color) = row;
    Project {
        id,
        name,
        description,
        color,
    }
}

/// Map a constraint violation from an insert/update into the typed error.
fn map_name_conflict(e: sqlx::Error, name: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::UniqueViolation(name.to_string());
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl VaultBackend for SqliteBackend {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, (String, String, String, Option<String>)>(
            "SELECT id, name, description, color FROM projects ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_project).collect())
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        let row = sqlx::query_as::<_, (String, String, String, Option<String>)>(
            "SELECT id, name, description, color FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_project))
    }

    async fn create_project(&self, input: NewProject) -> StoreResult<Project> {
        let project = Project {
            id: id::uuid(),
            name: input.name,
            description: input.description,
            color: input.color,
        };
        debug!(project_id = %project.id, "creating project");
        sqlx::query("INSERT INTO projects (id, name, description, color) VALUES (?, ?, ?, ?)")
            .bind(&project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(&project.color)
            .execute(&self.pool)
            .await
            .map_err(|e| map_name_conflict(e, &project.name))?;
        Ok(project)
    }

    async fn update_project(&self, id: &str, changes: ProjectChanges) -> StoreResult<Project> {
        // The unique index also guards renames here, unlike the file backend.
        let result = sqlx::query(
            "UPDATE projects SET name = ?, description = ?, color = ? WHERE id = ?",
        )
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.color)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_name_conflict(e, &changes.name))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Project {id}")));
        }
        Ok(Project {
            id: id.to_string(),
            name: changes.name,
            description: changes.description,
            color: changes.color,
        })
    }

    async fn delete_project(&self, id: &str) -> StoreResult<()> {
        // Secrets go with the project via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            // Deleting an unknown id is an error in this backend.
            return Err(StoreError::NotFound(format!("Project {id}")));
        }
        debug!(project_id = %id, "deleted project");
        Ok(())
    }

    async fn create_secret(&self, project_id: &str, input: NewSecret) -> StoreResult<Secret> {
        let secret = Secret {
            id: id::uuid(),
            project_id: project_id.to_string(),
            name: input.name,
            description: input.description,
            kind: input.kind,
            value: input.value,
            environment_id: input.environment_id,
            updated_at: Utc::now(),
        };
        debug!(project_id, secret_id = %secret.id, "creating secret");
        sqlx::query(
            "INSERT INTO secrets (id, project_id, name, description, kind, value, environment_id, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&secret.id)
        .bind(&secret.project_id)
        .bind(&secret.name)
        .bind(&secret.description)
        .bind(secret.kind.as_str())
        .bind(&secret.value)
        .bind(secret.environment_id)
        .bind(secret.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_foreign_key_violation() {
                    return StoreError::NotFound(format!("Project {project_id}"));
                }
            }
            StoreError::Database(e)
        })?;
        Ok(secret)
    }

    async fn list_secrets(&self, project_id: &str) -> StoreResult<Vec<Secret>> {
        // A missing project simply has no matching rows here: empty list.
        let rows = sqlx::query_as::<_, SecretRow>(
            "SELECT id, project_id, name, description, kind, value, environment_id, updated_at
             FROM secrets WHERE project_id = ? ORDER BY name COLLATE NOCASE",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_secret).collect()
    }

    async fn get_secret_value(&self, project_id: &str, secret_id: &str) -> StoreResult<String> {
        let row = sqlx::query_as::<_, (String,)>(
            "SELECT value FROM secrets WHERE id = ? AND project_id = ?",
        )
        .bind(secret_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("Secret {secret_id}")))?;
        Ok(row.0)
    }

    async fn update_secret(
        &self,
        project_id: &str,
        changes: SecretChanges,
    ) -> StoreResult<Secret> {
        let result = sqlx::query(
            "UPDATE secrets SET name = ?, description = ?, kind = ?, environment_id = ?, updated_at = ?
             WHERE id = ? AND project_id = ?",
        )
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.kind.as_str())
        .bind(changes.environment_id)
        .bind(Utc::now())
        .bind(&changes.id)
        .bind(project_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Secret {}", changes.id)));
        }
        self.fetch_secret(project_id, &changes.id).await
    }

    async fn update_secret_value(
        &self,
        project_id: &str,
        secret_id: &str,
        value: String,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE secrets SET value = ?, updated_at = ? WHERE id = ? AND project_id = ?",
        )
        .bind(&value)
        .bind(Utc::now())
        .bind(secret_id)
        .bind(project_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Secret {secret_id}")));
        }
        Ok(())
    }

    async fn delete_secret(&self, project_id: &str, secret_id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM secrets WHERE id = ? AND project_id = ?")
            .bind(secret_id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            // Deleting an unknown id is an error in this backend.
            return Err(StoreError::NotFound(format!("Secret {secret_id}")));
        }
        debug!(project_id, secret_id, "deleted secret");
        Ok(())
    }
}
