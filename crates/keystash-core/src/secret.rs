//! Secure string handling with memory protection.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Placeholder returned instead of a secret's real value in list and
/// metadata contexts.
pub const REDACTED: &str = "[REDACTED]";

/// A string that is zeroed on drop for secure credential handling.
///
/// This type ensures that decrypted secret values are cleared from memory
/// when no longer needed. Debug and Display both emit `[REDACTED]` to
/// prevent accidental logging.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Expose the secret value.
    ///
    /// Use sparingly - only when the actual value is needed.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// Check if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get the length of the secret.
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl Default for SecretString {
    fn default() -> Self {
        Self {
            inner: String::new(),
        }
    }
}

// Never print secrets
impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time comparison to prevent timing attacks
        constant_time_eq(self.inner.as_bytes(), other.inner.as_bytes())
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
