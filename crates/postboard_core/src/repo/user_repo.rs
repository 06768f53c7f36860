//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Email uniqueness is left to the `users_email_unique` index; violations
//!   are translated to `RepoError::Conflict`.

use super::{count_column, is_unique_violation, uuid_column, RepoError, RepoResult};
use crate::model::user::{CreateUserRequest, User, UserCounts, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT id, email, name, created_at FROM users";

pub const DUPLICATE_EMAIL_MESSAGE: &str = "user with this email already exists";

/// Repository interface for user persistence.
pub trait UserRepository {
    /// Inserts a user and returns the stored row.
    fn create_user(&self, request: &CreateUserRequest) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn user_exists(&self, id: UserId) -> RepoResult<bool>;
    /// All users, newest first.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Number of posts and comments authored by the user.
    fn user_counts(&self, id: UserId) -> RepoResult<UserCounts>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, request: &CreateUserRequest) -> RepoResult<User> {
        request.validate()?;

        let id = Uuid::new_v4();
        let inserted = self.conn.execute(
            "INSERT INTO users (id, email, name) VALUES (?1, ?2, ?3);",
            params![id.to_string(), request.email.as_str(), request.name.as_deref()],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        self.get_user(id)?
            .ok_or(RepoError::NotFound { entity: "user", id })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn user_exists(&self, id: UserId) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1;",
                [id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn user_counts(&self, id: UserId) -> RepoResult<UserCounts> {
        let mut stmt = self.conn.prepare(
            "SELECT
                (SELECT COUNT(*) FROM posts WHERE author_id = ?1),
                (SELECT COUNT(*) FROM comments WHERE author_id = ?1);",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(UserCounts {
                posts: count_column(row, 0)?,
                comments: count_column(row, 1)?,
            }),
            None => Ok(UserCounts::default()),
        }
    }
}

pub(crate) fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: uuid_column(row, "users", "id")?,
        email: row.get("email")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
