//! Post repository contract and SQLite implementation.

use super::{uuid_column, RepoError, RepoResult};
use crate::model::post::{CreatePostRequest, Post, PostId};
use crate::model::require;
use crate::model::user::UserId;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const POST_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    published,
    author_id,
    created_at
FROM posts";

/// Repository interface for post persistence.
pub trait PostRepository {
    /// Inserts a post for an author the caller has already resolved.
    ///
    /// Author existence is not checked here; a dangling id fails on the
    /// foreign key. `request.author_id` is ignored in favour of `author_id`.
    fn create_post(&self, author_id: UserId, request: &CreatePostRequest) -> RepoResult<Post>;
    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>>;
    fn post_exists(&self, id: PostId) -> RepoResult<bool>;
    /// Up to `limit` posts across all authors, newest first.
    fn list_recent_posts(&self, limit: u32) -> RepoResult<Vec<Post>>;
    /// Every post by one author, newest first.
    fn list_posts_by_author(&self, author_id: UserId) -> RepoResult<Vec<Post>>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn collect(&self, sql: &str, bind: &[&dyn rusqlite::ToSql]) -> RepoResult<Vec<Post>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }
        Ok(posts)
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(&self, author_id: UserId, request: &CreatePostRequest) -> RepoResult<Post> {
        require("title", &request.title)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO posts (id, title, content, published, author_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                request.title.as_str(),
                request.content.as_deref(),
                request.published,
                author_id.to_string(),
            ],
        )?;

        self.get_post(id)?
            .ok_or(RepoError::NotFound { entity: "post", id })
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        let mut posts = self.collect(
            &format!("{POST_SELECT_SQL} WHERE id = ?1;"),
            &[&id.to_string()],
        )?;
        Ok(posts.pop())
    }

    fn post_exists(&self, id: PostId) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM posts WHERE id = ?1;",
                [id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn list_recent_posts(&self, limit: u32) -> RepoResult<Vec<Post>> {
        self.collect(
            &format!("{POST_SELECT_SQL} ORDER BY created_at DESC, rowid DESC LIMIT ?1;"),
            &[&i64::from(limit)],
        )
    }

    fn list_posts_by_author(&self, author_id: UserId) -> RepoResult<Vec<Post>> {
        self.collect(
            &format!(
                "{POST_SELECT_SQL} WHERE author_id = ?1 ORDER BY created_at DESC, rowid DESC;"
            ),
            &[&author_id.to_string()],
        )
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let published = match row.get::<_, i64>("published")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid published value `{other}` in posts.published"
            )));
        }
    };

    Ok(Post {
        id: uuid_column(row, "posts", "id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        published,
        author_id: uuid_column(row, "posts", "author_id")?,
        created_at: row.get("created_at")?,
    })
}
