//! Post rows and post-centric read models.

use super::comment::CommentWithAuthor;
use super::user::{User, UserId};
use super::{require, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PostId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub author_id: UserId,
    pub created_at: i64,
}

/// Input for `create_post`. `published` defaults to `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: Option<String>,
    /// Raw author id as received from the caller.
    pub author_id: String,
    pub published: bool,
}

impl CreatePostRequest {
    pub fn new(title: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author_id: author_id.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    /// Checks `title` then `author_id`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("authorId", &self.author_id)
    }
}

/// Created post returned together with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: User,
}

/// One row of `list_posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub author: User,
    /// Newest first.
    pub comments: Vec<CommentWithAuthor>,
    pub comment_count: u64,
}
