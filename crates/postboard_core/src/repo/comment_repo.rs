//! Comment repository contract and SQLite implementation.

use super::{uuid_column, RepoError, RepoResult};
use crate::model::comment::{Comment, CommentId};
use crate::model::post::PostId;
use crate::model::user::UserId;
use crate::model::require;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const COMMENT_SELECT_SQL: &str = "SELECT id, content, post_id, author_id, created_at FROM comments";

/// Repository interface for comment persistence.
pub trait CommentRepository {
    /// Inserts a comment for a post and author the caller has already resolved.
    fn create_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
    ) -> RepoResult<Comment>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    /// Every comment on one post, newest first.
    fn list_comments_for_post(&self, post_id: PostId) -> RepoResult<Vec<Comment>>;
    /// The `limit` most recent comments written by one author.
    fn list_recent_comments_by_author(
        &self,
        author_id: UserId,
        limit: u32,
    ) -> RepoResult<Vec<Comment>>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn collect(&self, sql: &str, bind: &[&dyn rusqlite::ToSql]) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
    ) -> RepoResult<Comment> {
        require("content", content)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO comments (id, content, post_id, author_id) VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                content,
                post_id.to_string(),
                author_id.to_string()
            ],
        )?;

        self.get_comment(id)?
            .ok_or(RepoError::NotFound {
                entity: "comment",
                id,
            })
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut comments = self.collect(
            &format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"),
            &[&id.to_string()],
        )?;
        Ok(comments.pop())
    }

    fn list_comments_for_post(&self, post_id: PostId) -> RepoResult<Vec<Comment>> {
        self.collect(
            &format!(
                "{COMMENT_SELECT_SQL} WHERE post_id = ?1 ORDER BY created_at DESC, rowid DESC;"
            ),
            &[&post_id.to_string()],
        )
    }

    fn list_recent_comments_by_author(
        &self,
        author_id: UserId,
        limit: u32,
    ) -> RepoResult<Vec<Comment>> {
        self.collect(
            &format!(
                "{COMMENT_SELECT_SQL}
                 WHERE author_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2;"
            ),
            &[&author_id.to_string(), &i64::from(limit)],
        )
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    Ok(Comment {
        id: uuid_column(row, "comments", "id")?,
        content: row.get("content")?,
        post_id: uuid_column(row, "comments", "post_id")?,
        author_id: uuid_column(row, "comments", "author_id")?,
        created_at: row.get("created_at")?,
    })
}
