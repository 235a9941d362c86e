//! ID generation utilities.

use uuid::Uuid;

/// Generate a new opaque identifier (UUID v4, string form).
///
/// Used for project and secret ids. Identifiers are generated once at
/// creation and never change afterwards.
pub fn uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Check whether a string parses as a valid identifier.
pub fn is_valid(id: &str) -> bool {
    Uuid::try_parse(id).is_ok()
}
