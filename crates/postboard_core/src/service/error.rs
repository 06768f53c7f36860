//! Error taxonomy returned by every DAL operation.

use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DalResult<T> = Result<T, DalError>;

/// Closed set of failures a DAL caller has to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DalError {
    /// Required input missing or empty.
    Validation(String),
    /// Requested or referenced row does not exist.
    NotFound(String),
    /// Uniqueness violation.
    Conflict(String),
    /// Unclassified store failure. Details were logged, not returned.
    Internal { operation: &'static str },
}

impl DalError {
    pub fn not_found(message: &str) -> Self {
        Self::NotFound(message.to_string())
    }

    /// True for failures caused by the request rather than the store.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal { .. })
    }
}

impl Display for DalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) | Self::NotFound(message) | Self::Conflict(message) => {
                write!(f, "{message}")
            }
            Self::Internal { operation } => write!(f, "{operation} failed"),
        }
    }
}

impl Error for DalError {}

impl From<ValidationError> for DalError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}
