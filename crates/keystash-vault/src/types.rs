//! Core types for the vault data model.
//!
//! Projects group secrets; secrets carry an encrypted value, a closed type
//! tag, and a reference into the fixed environment lookup table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A project grouping a set of secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Opaque unique identifier, generated at creation, immutable.
    pub id: String,

    /// Display name; unique case-insensitively across all projects.
    pub name: String,

    /// Free-form description, may be empty.
    pub description: String,

    /// Optional display color (`#RRGGBB`), not security-relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A named secret belonging to a project.
///
/// The `value` field holds whatever is stored at rest: an `ivHex:cipherHex`
/// envelope when encryption is enabled, raw plaintext when it is not, or the
/// redaction sentinel once the service layer has scrubbed it for a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// Opaque unique identifier, immutable, scoped to the owning project.
    pub id: String,

    /// Owning project's id. A secret cannot exist without its project.
    pub project_id: String,

    /// Display name, non-empty.
    pub name: String,

    /// Free-form description, may be empty.
    pub description: String,

    /// What kind of credential this is.
    #[serde(rename = "type")]
    pub kind: SecretKind,

    /// The sensitive payload. Encrypted at rest.
    pub value: String,

    /// Reference into the fixed environment lookup table.
    pub environment_id: i32,

    /// Set on creation and bumped on every mutation, including value-only
    /// and metadata-only updates.
    pub updated_at: DateTime<Utc>,
}

/// Closed enumeration of secret types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretKind {
    #[serde(rename = "API Key")]
    ApiKey,
    #[serde(rename = "Connection String")]
    ConnectionString,
    #[serde(rename = "Environment Variable")]
    EnvironmentVariable,
    #[serde(rename = "Password")]
    Password,
    #[serde(rename = "Token")]
    Token,
    #[serde(rename = "Other")]
    Other,
}

impl SecretKind {
    /// Canonical display string, also used as the storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretKind::ApiKey => "API Key",
            SecretKind::ConnectionString => "Connection String",
            SecretKind::EnvironmentVariable => "Environment Variable",
            SecretKind::Password => "Password",
            SecretKind::Token => "Token",
            SecretKind::Other => "Other",
        }
    }

    /// Parse the storage representation back into the enum.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "API Key" => Some(SecretKind::ApiKey),
            "Connection String" => Some(SecretKind::ConnectionString),
            "Environment Variable" => Some(SecretKind::EnvironmentVariable),
            "Password" => Some(SecretKind::Password),
            "Token" => Some(SecretKind::Token),
            "Other" => Some(SecretKind::Other),
            _ => None,
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deployment environment a secret is tagged with.
///
/// Environments form a small fixed lookup table; they are not user-creatable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: i32,
    pub name: String,
}

/// Environment id for Development.
pub const ENV_DEVELOPMENT: i32 = 1;
/// Environment id for Staging.
pub const ENV_STAGING: i32 = 2;
/// Environment id for Production.
pub const ENV_PRODUCTION: i32 = 3;

/// The fixed environment lookup table.
pub fn default_environments() -> Vec<Environment> {
    vec![
        Environment {
            id: ENV_DEVELOPMENT,
            name: "Development".to_string(),
        },
        Environment {
            id: ENV_STAGING,
            name: "Staging".to_string(),
        },
        Environment {
            id: ENV_PRODUCTION,
            name: "Production".to_string(),
        },
    ]
}

/// Look up an environment name by id.
pub fn environment_name(id: i32) -> Option<&'static str> {
    match id {
        ENV_DEVELOPMENT => Some("Development"),
        ENV_STAGING => Some("Staging"),
        ENV_PRODUCTION => Some("Production"),
        _ => None,
    }
}

/// Parameters for creating a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub color: Option<String>,
}

/// Mutable project fields for an update. Never touches secrets.
#[derive(Debug, Clone)]
pub struct ProjectChanges {
    pub name: String,
    pub description: String,
    pub color: Option<String>,
}

/// Parameters for creating a secret under a project.
///
/// By the time this reaches a backend, `value` is whatever should land on
/// disk; encryption has already happened in the repository.
#[derive(Debug, Clone)]
pub struct NewSecret {
    pub name: String,
    pub description: String,
    pub kind: SecretKind,
    pub value: String,
    pub environment_id: i32,
}

/// Metadata-only secret changes. Never touches the stored value.
#[derive(Debug, Clone)]
pub struct SecretChanges {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: SecretKind,
    pub environment_id: i32,
}

/// A name/value pair produced by a secrets export.
#[derive(Debug, Clone, Serialize)]
pub struct SecretExport {
    pub name: String,
    pub value: String,
}
