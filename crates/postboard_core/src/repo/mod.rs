//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define per-table data access contracts (users, posts, comments).
//! - Isolate SQL details from DAL orchestration.
//!
//! # Invariants
//! - Write paths validate their request before any SQL mutation.
//! - Collections come back newest-first (`created_at DESC`, then most
//!   recently inserted first).
//! - Unique-index violations surface as `RepoError::Conflict`, never as a
//!   plain `Db` error.

pub mod comment_repo;
pub mod post_repo;
pub mod user_repo;

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub use comment_repo::{CommentRepository, SqliteCommentRepository};
pub use post_repo::{PostRepository, SqlitePostRepository};
pub use user_repo::{SqliteUserRepository, UserRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// A row that must exist (for example an insert read-back) is missing.
    NotFound { entity: &'static str, id: Uuid },
    /// Unique constraint violation, carrying the user-facing message.
    Conflict(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn uuid_column(row: &Row<'_>, table: &str, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

pub(crate) fn count_column(row: &Row<'_>, index: usize) -> RepoResult<u64> {
    let value: i64 = row.get(index)?;
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}
