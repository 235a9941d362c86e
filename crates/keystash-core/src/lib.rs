//! # keystash-core
//!
//! Shared types and utilities for Keystash.
//!
//! This crate provides the small set of building blocks used across the
//! Keystash crates:
//!
//! - **Environment**: typed accessors for `KEYSTASH_*` environment variables
//! - **Identifiers**: opaque ID generation for projects and secrets
//! - **SecretString**: a zero-on-drop string that redacts itself when printed

pub mod env;
pub mod error;
pub mod id;
pub mod secret;

// Re-exports for convenience
pub use error::{ConfigError, Error, Result};
pub use secret::{SecretString, REDACTED};
