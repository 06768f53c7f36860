//! Read-through cache contract, freshness policy and page revalidation.
//!
//! # Responsibility
//! - Describe the cache service the DAL reads through (`QueryCache`).
//! - Carry per-query freshness windows and invalidation tags (`CachePolicy`).
//! - Describe the page-regeneration signal fired after writes.
//!
//! # Invariants
//! - An entry is fresh while `age < fresh`, stale-but-servable while
//!   `age < fresh + stale`, and expired afterwards.
//! - Invalidating a tag evicts every entry stored with that tag.

mod memory;
mod policy;
mod revalidate;

pub use memory::{CacheStats, Clock, MemoryCache, PURGE_EVERY_STORES};
pub use policy::{user_tag, CachePolicy, Freshness, POSTS_LIST_TAG, USERS_LIST_TAG};
pub use revalidate::{NoopRevalidator, PageRevalidator, RecordingRevalidator, ROOT_PATH};

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type CacheResult<T> = Result<T, CacheError>;

/// Failure reported by a cache service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Internal cache state became unusable (for example a poisoned lock).
    Unavailable(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "cache unavailable: {details}"),
        }
    }
}

impl Error for CacheError {}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(Value),
    /// Servable now, but the caller should refresh it.
    Stale(Value),
    Miss,
}

/// Read-through cache service used by the DAL.
pub trait QueryCache {
    fn lookup(&self, key: &str) -> CacheResult<CacheLookup>;
    /// Stores `value` under `key` with the windows and tags of `policy`,
    /// replacing any previous entry.
    fn store(&self, key: &str, value: Value, policy: &CachePolicy) -> CacheResult<()>;
    /// Evicts every entry carrying any of `tags`; returns how many were evicted.
    fn invalidate_tags(&self, tags: &[String]) -> CacheResult<usize>;
}

impl<C: QueryCache + ?Sized> QueryCache for Arc<C> {
    fn lookup(&self, key: &str) -> CacheResult<CacheLookup> {
        (**self).lookup(key)
    }

    fn store(&self, key: &str, value: Value, policy: &CachePolicy) -> CacheResult<()> {
        (**self).store(key, value, policy)
    }

    fn invalidate_tags(&self, tags: &[String]) -> CacheResult<usize> {
        (**self).invalidate_tags(tags)
    }
}
