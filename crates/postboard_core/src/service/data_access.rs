//! Read and create operations for users, posts and comments.
//!
//! # Responsibility
//! - Serve `list_users`, `list_posts` and `get_user` through the cache.
//! - Serve `create_user`, `create_post` and `create_comment` with
//!   pre-checks and post-write signals.
//!
//! # Invariants
//! - Reads only populate the cache; they never signal or invalidate.
//! - A stale hit is answered from the cache without touching the store; its
//!   refresh is queued and runs before the next read.
//! - `create_comment` checks the post before the author.
//! - Absent rows are never cached.

use super::error::{DalError, DalResult};
use crate::cache::{
    user_tag, CacheLookup, CachePolicy, PageRevalidator, QueryCache, POSTS_LIST_TAG, ROOT_PATH,
    USERS_LIST_TAG,
};
use crate::model::comment::{Comment, CommentWithAuthor, CreateCommentRequest};
use crate::model::parse_id;
use crate::model::post::{CreatePostRequest, PostSummary, PostWithAuthor};
use crate::model::user::{CreateUserRequest, User, UserDetail, UserId, UserSummary};
use crate::repo::{
    CommentRepository, PostRepository, RepoError, RepoResult, SqliteCommentRepository,
    SqlitePostRepository, SqliteUserRepository, UserRepository,
};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

/// Number of posts returned by `list_posts` when no limit is given.
pub const DEFAULT_POSTS_LIMIT: u32 = 5;
/// Number of comments embedded in `get_user`.
pub const RECENT_COMMENTS_LIMIT: u32 = 10;

const AUTHOR_NOT_FOUND: &str = "author not found";
const POST_NOT_FOUND: &str = "post not found";
const USER_NOT_FOUND: &str = "user not found";

/// Cached query whose entry was served stale and awaits a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refresh {
    Users,
    Posts { limit: u32 },
    User(UserId),
}

impl Refresh {
    fn operation(self) -> &'static str {
        match self {
            Self::Users => "list_users",
            Self::Posts { .. } => "list_posts",
            Self::User(_) => "get_user",
        }
    }

    fn key(self) -> String {
        match self {
            Self::Users => USERS_LIST_TAG.to_string(),
            Self::Posts { limit } => format!("{POSTS_LIST_TAG}:{limit}"),
            Self::User(id) => format!("user:{id}"),
        }
    }

    fn policy(self) -> CachePolicy {
        match self {
            Self::Users => CachePolicy::new(Duration::from_secs(60), Duration::ZERO)
                .with_tag(USERS_LIST_TAG),
            Self::Posts { .. } => CachePolicy::new(Duration::ZERO, Duration::from_secs(120))
                .with_tag(POSTS_LIST_TAG),
            Self::User(id) => CachePolicy::new(Duration::from_secs(30), Duration::from_secs(60))
                .with_tag(user_tag(id)),
        }
    }
}

/// Data access layer over one store connection, one cache and one page
/// revalidator.
pub struct DataAccess<'conn, C, P> {
    conn: &'conn Connection,
    cache: C,
    pages: P,
    pending: RefCell<Vec<Refresh>>,
}

impl<'conn, C: QueryCache, P: PageRevalidator> DataAccess<'conn, C, P> {
    pub fn new(conn: &'conn Connection, cache: C, pages: P) -> Self {
        Self {
            conn,
            cache,
            pages,
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn pages(&self) -> &P {
        &self.pages
    }

    /// Number of stale entries waiting for a reload.
    pub fn pending_refreshes(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Reloads every entry that was served stale and stores the results.
    ///
    /// Reads call this before consulting the cache. Failed reloads are
    /// logged and dropped; the stale entry keeps aging toward expiry.
    /// Returns how many entries were refreshed.
    pub fn revalidate_pending(&self) -> usize {
        let queued = std::mem::take(&mut *self.pending.borrow_mut());
        let mut refreshed = 0;
        for refresh in queued {
            let operation = refresh.operation();
            let key = refresh.key();
            let stored = match refresh {
                Refresh::Users => self
                    .load_user_summaries()
                    .map(|users| self.put(operation, &key, &users, &refresh.policy())),
                Refresh::Posts { limit } => self
                    .load_post_summaries(limit)
                    .map(|posts| self.put(operation, &key, &posts, &refresh.policy())),
                Refresh::User(id) => self.load_user_detail(id).map(|detail| {
                    if let Some(detail) = detail {
                        self.put(operation, &key, &detail, &refresh.policy());
                    }
                }),
            };
            match stored {
                Ok(()) => refreshed += 1,
                Err(err) => warn!(
                    "event=cache_revalidate module=service op={} status=error key={} error={}",
                    operation, key, err
                ),
            }
        }
        refreshed
    }

    /// Every user with their posts and relation counts, newest first.
    ///
    /// Cached for 60 seconds under `users_list`.
    pub fn list_users(&self) -> DalResult<Vec<UserSummary>> {
        let users = self.cached(Refresh::Users, || self.load_user_summaries().map(Some))?;
        Ok(users.unwrap_or_default())
    }

    /// Up to `limit` posts (default 5) with author, comments and comment
    /// count, newest first.
    ///
    /// Always revalidated, but a value up to 120 seconds old is served
    /// immediately while its refresh waits in the queue. Tagged `posts_list`.
    pub fn list_posts(&self, limit: Option<u32>) -> DalResult<Vec<PostSummary>> {
        let limit = limit.unwrap_or(DEFAULT_POSTS_LIMIT);
        let posts = self.cached(Refresh::Posts { limit }, || {
            self.load_post_summaries(limit).map(Some)
        })?;
        Ok(posts.unwrap_or_default())
    }

    /// One user with posts, the ten most recent comments and counts.
    ///
    /// Fresh for 30 seconds, servable stale for 60 more. Tagged `user_<id>`.
    pub fn get_user(&self, id: &str) -> DalResult<UserDetail> {
        let Some(user_id) = parse_id(id) else {
            return Err(DalError::not_found(USER_NOT_FOUND));
        };

        self.cached(Refresh::User(user_id), || self.load_user_detail(user_id))?
            .ok_or_else(|| DalError::not_found(USER_NOT_FOUND))
    }

    /// Creates a user and signals regeneration of the root page.
    pub fn create_user(&self, request: &CreateUserRequest) -> DalResult<User> {
        request.validate()?;

        let user = match self.users().create_user(request) {
            Ok(user) => user,
            Err(RepoError::Validation(err)) => return Err(err.into()),
            Err(RepoError::Conflict(message)) => return Err(DalError::Conflict(message)),
            Err(err) => return Err(internal("create_user", err)),
        };

        self.pages.revalidate_path(ROOT_PATH);
        info!(
            "event=dal_op module=service op=create_user status=ok user_id={}",
            user.id
        );
        Ok(user)
    }

    /// Creates a post for an existing author and signals regeneration of
    /// the root page.
    ///
    /// The author lookup and the insert are separate statements.
    pub fn create_post(&self, request: &CreatePostRequest) -> DalResult<PostWithAuthor> {
        request.validate()?;

        let author = self.require_author("create_post", &request.author_id)?;

        let post = match self.posts().create_post(author.id, request) {
            Ok(post) => post,
            Err(RepoError::Validation(err)) => return Err(err.into()),
            Err(err) => return Err(internal("create_post", err)),
        };

        self.pages.revalidate_path(ROOT_PATH);
        info!(
            "event=dal_op module=service op=create_post status=ok post_id={} author_id={}",
            post.id, author.id
        );
        Ok(PostWithAuthor { post, author })
    }

    /// Creates a comment on an existing post by an existing author.
    ///
    /// On success signals regeneration of the root page and evicts the
    /// `posts_list` and `user_<author_id>` cache tags.
    pub fn create_comment(&self, request: &CreateCommentRequest) -> DalResult<Comment> {
        request.validate()?;

        let post_id = match parse_id(&request.post_id) {
            Some(post_id) => post_id,
            None => return Err(DalError::not_found(POST_NOT_FOUND)),
        };
        match self.posts().post_exists(post_id) {
            Ok(true) => {}
            Ok(false) => return Err(DalError::not_found(POST_NOT_FOUND)),
            Err(err) => return Err(internal("create_comment", err)),
        }
        let author = self.require_author("create_comment", &request.author_id)?;

        let comment = match self
            .comments()
            .create_comment(post_id, author.id, &request.content)
        {
            Ok(comment) => comment,
            Err(RepoError::Validation(err)) => return Err(err.into()),
            Err(err) => return Err(internal("create_comment", err)),
        };

        self.pages.revalidate_path(ROOT_PATH);
        let tags = [POSTS_LIST_TAG.to_string(), user_tag(author.id)];
        match self.cache.invalidate_tags(&tags) {
            Ok(evicted) => info!(
                "event=cache_invalidate module=service op=create_comment status=ok tags={} evicted={}",
                tags.join(","),
                evicted
            ),
            // The row is committed; stale entries still age out on their own.
            Err(err) => warn!(
                "event=cache_invalidate module=service op=create_comment status=error tags={} error={}",
                tags.join(","),
                err
            ),
        }

        info!(
            "event=dal_op module=service op=create_comment status=ok comment_id={} post_id={} author_id={}",
            comment.id, post_id, author.id
        );
        Ok(comment)
    }

    fn users(&self) -> SqliteUserRepository<'conn> {
        SqliteUserRepository::new(self.conn)
    }

    fn posts(&self) -> SqlitePostRepository<'conn> {
        SqlitePostRepository::new(self.conn)
    }

    fn comments(&self) -> SqliteCommentRepository<'conn> {
        SqliteCommentRepository::new(self.conn)
    }

    fn require_author(&self, operation: &'static str, raw_id: &str) -> DalResult<User> {
        let Some(author_id) = parse_id(raw_id) else {
            return Err(DalError::not_found(AUTHOR_NOT_FOUND));
        };
        match self.users().get_user(author_id) {
            Ok(Some(author)) => Ok(author),
            Ok(None) => Err(DalError::not_found(AUTHOR_NOT_FOUND)),
            Err(err) => Err(internal(operation, err)),
        }
    }

    /// Read-through wrapper for the query behind `load`.
    ///
    /// A stale hit is returned as is and its reload is queued for
    /// `revalidate_pending`. Cache failures degrade to a direct store read.
    fn cached<T, F>(&self, refresh: Refresh, load: F) -> DalResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> RepoResult<Option<T>>,
    {
        self.revalidate_pending();

        let operation = refresh.operation();
        let key = refresh.key();
        let key = key.as_str();
        match self.cache.lookup(key) {
            Ok(CacheLookup::Fresh(value)) => {
                if let Some(hit) = decode::<T>(operation, key, value) {
                    return Ok(Some(hit));
                }
            }
            Ok(CacheLookup::Stale(value)) => {
                if let Some(hit) = decode::<T>(operation, key, value) {
                    self.schedule(refresh);
                    return Ok(Some(hit));
                }
            }
            Ok(CacheLookup::Miss) => {}
            Err(err) => warn!(
                "event=cache_lookup module=service op={} status=error key={} error={}",
                operation, key, err
            ),
        }

        let loaded = load().map_err(|err| internal(operation, err))?;
        if let Some(value) = loaded.as_ref() {
            self.put(operation, key, value, &refresh.policy());
        }
        Ok(loaded)
    }

    fn schedule(&self, refresh: Refresh) {
        let mut pending = self.pending.borrow_mut();
        if !pending.contains(&refresh) {
            pending.push(refresh);
            debug!(
                "event=cache_revalidate module=service op={} status=queued",
                refresh.operation()
            );
        }
    }

    fn put<T: Serialize>(
        &self,
        operation: &'static str,
        key: &str,
        value: &T,
        policy: &CachePolicy,
    ) {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(
                    "event=cache_store module=service op={} status=error key={} error={}",
                    operation, key, err
                );
                return;
            }
        };
        if let Err(err) = self.cache.store(key, encoded, policy) {
            warn!(
                "event=cache_store module=service op={} status=error key={} error={}",
                operation, key, err
            );
        }
    }

    fn load_user_summaries(&self) -> RepoResult<Vec<UserSummary>> {
        let users = self.users();
        let posts = self.posts();
        users
            .list_users()?
            .into_iter()
            .map(|user| -> RepoResult<UserSummary> {
                Ok(UserSummary {
                    posts: posts.list_posts_by_author(user.id)?,
                    counts: users.user_counts(user.id)?,
                    user,
                })
            })
            .collect()
    }

    fn load_post_summaries(&self, limit: u32) -> RepoResult<Vec<PostSummary>> {
        let posts = self.posts();
        let comments = self.comments();
        let mut authors = AuthorLookup::new(self.users());

        let mut summaries = Vec::new();
        for post in posts.list_recent_posts(limit)? {
            let author = authors.get(post.author_id)?;
            let mut thread = Vec::new();
            for comment in comments.list_comments_for_post(post.id)? {
                thread.push(CommentWithAuthor {
                    author: authors.get(comment.author_id)?,
                    comment,
                });
            }
            summaries.push(PostSummary {
                comment_count: thread.len() as u64,
                post,
                author,
                comments: thread,
            });
        }
        Ok(summaries)
    }

    fn load_user_detail(&self, user_id: UserId) -> RepoResult<Option<UserDetail>> {
        let users = self.users();
        let Some(user) = users.get_user(user_id)? else {
            return Ok(None);
        };

        Ok(Some(UserDetail {
            posts: self.posts().list_posts_by_author(user_id)?,
            comments: self
                .comments()
                .list_recent_comments_by_author(user_id, RECENT_COMMENTS_LIMIT)?,
            counts: users.user_counts(user_id)?,
            user,
        }))
    }
}

/// Per-call memo of author rows while assembling post listings.
struct AuthorLookup<'conn> {
    repo: SqliteUserRepository<'conn>,
    seen: HashMap<UserId, User>,
}

impl<'conn> AuthorLookup<'conn> {
    fn new(repo: SqliteUserRepository<'conn>) -> Self {
        Self {
            repo,
            seen: HashMap::new(),
        }
    }

    fn get(&mut self, id: UserId) -> RepoResult<User> {
        if let Some(user) = self.seen.get(&id) {
            return Ok(user.clone());
        }
        let user = self
            .repo
            .get_user(id)?
            .ok_or(RepoError::NotFound { entity: "user", id })?;
        self.seen.insert(id, user.clone());
        Ok(user)
    }
}

fn decode<T: DeserializeOwned>(
    operation: &'static str,
    key: &str,
    value: serde_json::Value,
) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(
                "event=cache_decode module=service op={} status=error key={} error={}",
                operation, key, err
            );
            None
        }
    }
}

fn internal(operation: &'static str, err: RepoError) -> DalError {
    error!(
        "event=dal_op module=service op={} status=error error={}",
        operation, err
    );
    DalError::Internal { operation }
}
