//! Per-query cache policy.

use std::time::Duration;

/// Tag carried by the `list_users` entry.
pub const USERS_LIST_TAG: &str = "users_list";
/// Tag carried by every `list_posts` entry, whatever its limit.
pub const POSTS_LIST_TAG: &str = "posts_list";

/// Tag carried by the `get_user` entry of one user.
pub fn user_tag(user_id: impl std::fmt::Display) -> String {
    format!("user_{user_id}")
}

/// Freshness state of a cached value at a given age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Expired,
}

/// Freshness windows plus invalidation tags for one cached query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long a value is served without refreshing.
    pub fresh: Duration,
    /// Extra time after `fresh` during which the old value is still served
    /// while its refresh is pending.
    pub stale: Duration,
    pub tags: Vec<String>,
}

impl CachePolicy {
    pub fn new(fresh: Duration, stale: Duration) -> Self {
        Self {
            fresh,
            stale,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Classifies a value of the given age.
    pub fn freshness(&self, age: Duration) -> Freshness {
        if age < self.fresh {
            Freshness::Fresh
        } else if age < self.fresh.saturating_add(self.stale) {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}
