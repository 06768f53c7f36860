//! User rows and user-centric read models.

use super::comment::Comment;
use super::post::Post;
use super::{require, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// Persisted user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Unique across all users; never empty.
    pub email: String,
    pub name: Option<String>,
    pub created_at: i64,
}

/// Input for `create_user`.
///
/// Missing JSON fields deserialize to empty values so that validation, not
/// deserialization, reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: Option<String>,
}

impl CreateUserRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("email", &self.email)
    }
}

/// Relation counts attached to user read models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounts {
    pub posts: u64,
    pub comments: u64,
}

/// One row of `list_users`: the user, all of their posts and relation counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<Post>,
    #[serde(rename = "_count")]
    pub counts: UserCounts,
}

/// Result of `get_user`.
///
/// `comments` holds at most the ten most recent comments; `counts.comments`
/// still reports the full total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    #[serde(rename = "_count")]
    pub counts: UserCounts,
}
