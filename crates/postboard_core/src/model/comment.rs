//! Comment rows.

use super::post::PostId;
use super::user::{User, UserId};
use super::{require, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CommentId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub post_id: PostId,
    pub author_id: UserId,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: String,
    pub author_id: String,
}

impl CreateCommentRequest {
    pub fn new(
        content: impl Into<String>,
        post_id: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            post_id: post_id.into(),
            author_id: author_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("content", &self.content)?;
        require("postId", &self.post_id)?;
        require("authorId", &self.author_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: User,
}
