//! Data access layer for users, posts and comments.
//!
//! Reads go through a read-through cache with per-query freshness windows
//! and invalidation tags; writes check referenced rows first and then signal
//! page regeneration.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cache::{
    CacheLookup, CachePolicy, CacheStats, MemoryCache, NoopRevalidator, PageRevalidator,
    QueryCache, RecordingRevalidator,
};
pub use config::PostboardConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::comment::{Comment, CommentWithAuthor, CreateCommentRequest};
pub use model::post::{CreatePostRequest, Post, PostSummary, PostWithAuthor};
pub use model::user::{CreateUserRequest, User, UserCounts, UserDetail, UserSummary};
pub use model::ValidationError;
pub use repo::{RepoError, RepoResult};
pub use service::{DalError, DalResult, DataAccess, DEFAULT_POSTS_LIMIT, RECENT_COMMENTS_LIMIT};
