//! Domain records and write requests for users, posts and comments.
//!
//! # Responsibility
//! - Define row shapes returned by repositories and the DAL.
//! - Define create requests and their required-field validation.
//!
//! # Invariants
//! - Every row is identified by a UUID v4 generated at creation time.
//! - `created_at` is epoch milliseconds assigned by the store.
//! - Nested read models serialize their base row flattened (camelCase keys).

pub mod comment;
pub mod post;
pub mod user;

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Required-field failure raised before any SQL runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field was absent or contained only whitespace.
    MissingField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
        }
    }
}

impl Error for ValidationError {}

/// Parses a caller-supplied id.
///
/// Malformed ids cannot match any row, so callers treat `None` as not found.
pub fn parse_id(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim()).ok()
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_id, require, ValidationError};

    #[test]
    fn parse_id_rejects_non_uuid_text() {
        assert!(parse_id("does-not-exist").is_none());
        assert!(parse_id("").is_none());
    }

    #[test]
    fn parse_id_accepts_padded_uuid() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_id(&format!(" {id} ")), Some(id));
    }

    #[test]
    fn require_rejects_blank_values() {
        assert_eq!(
            require("title", "   "),
            Err(ValidationError::MissingField("title"))
        );
        assert!(require("title", "T").is_ok());
    }

    #[test]
    fn missing_field_message_names_field() {
        assert_eq!(
            ValidationError::MissingField("email").to_string(),
            "email is required"
        );
    }
}
