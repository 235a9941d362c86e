//! Input validation for the service layer.
//!
//! Mirrors the validation-schema collaborator at the system boundary:
//! each check either accepts the input or produces field-level errors that
//! the service surfaces as a `Validation` failure, before anything touches
//! storage.

use crate::error::{FieldError, VaultError};
use crate::types::environment_name;

/// Validate project input (create and update share the same shape).
pub fn project_input(name: &str, color: Option<&str>) -> Result<(), VaultError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "Project name cannot be empty."));
    }
    if let Some(color) = color {
        if !is_hex_color(color) {
            errors.push(FieldError::new(
                "color",
                "Color must be a hex string like #1a2b3c.",
            ));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(VaultError::Validation(errors))
    }
}

/// Validate secret input common to create and metadata updates.
pub fn secret_metadata(name: &str, environment_id: i32) -> Result<(), VaultError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "Secret name cannot be empty."));
    }
    if environment_name(environment_id).is_none() {
        errors.push(FieldError::new(
            "environmentId",
            format!("Unknown environment: {environment_id}."),
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(VaultError::Validation(errors))
    }
}

/// Validate a secret value on create and value updates.
pub fn secret_value(value: &str) -> Result<(), VaultError> {
    if value.is_empty() {
        return Err(VaultError::invalid("value", "Secret value cannot be empty."));
    }
    Ok(())
}

fn is_hex_color(s: &str) -> bool {
    let Some(digits) = s.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}
