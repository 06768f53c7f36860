//! Data access layer exposed to page renderers and API handlers.
//!
//! # Responsibility
//! - Turn typed requests into repository calls.
//! - Apply per-query cache policy to reads.
//! - Run referential pre-checks before writes, then fire page regeneration
//!   and tag invalidation.
//!
//! # Invariants
//! - Callers only ever see `DalError`; store details stay in the logs.
//! - Existence checks and inserts are separate statements, not one
//!   transaction.

mod data_access;
mod error;

pub use data_access::{DataAccess, DEFAULT_POSTS_LIMIT, RECENT_COMMENTS_LIMIT};
pub use error::{DalError, DalResult};
