//! In-process cache service with fresh/stale windows and tag eviction.
//!
//! # Invariants
//! - Each entry remembers the policy it was stored with; later lookups never
//!   reinterpret it with a different policy.
//! - Expired entries are dropped on lookup, by `purge_expired`, and by a
//!   sweep every `PURGE_EVERY_STORES` writes.

use super::policy::{CachePolicy, Freshness};
use super::{CacheError, CacheLookup, CacheResult, QueryCache};
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Writes between two sweeps of expired entries inside `store`.
pub const PURGE_EVERY_STORES: u32 = 64;

/// Source of the current time in epoch milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at_ms: i64,
    policy: CachePolicy,
}

impl CacheEntry {
    fn freshness(&self, now_ms: i64) -> Freshness {
        let age_ms = u64::try_from(now_ms.saturating_sub(self.stored_at_ms)).unwrap_or(0);
        self.policy.freshness(Duration::from_millis(age_ms))
    }
}

/// Counters exposed for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    /// Lookups answered with a stale value.
    pub stale_hits: u64,
    /// Lookups with no servable entry (absent or expired).
    pub misses: u64,
    /// Entries evicted by tag invalidation.
    pub invalidated: u64,
    pub total_entries: usize,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
    stores_since_purge: u32,
}

impl CacheState {
    fn drop_expired(&mut self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.freshness(now_ms) != Freshness::Expired);
        self.stores_since_purge = 0;
        self.stats.total_entries = self.entries.len();
        before - self.entries.len()
    }
}

/// `QueryCache` kept in process memory.
pub struct MemoryCache {
    state: Mutex<CacheState>,
    clock: Clock,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache").finish_non_exhaustive()
    }
}

impl MemoryCache {
    /// Creates an empty cache driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(system_now_ms))
    }

    /// Creates an empty cache driven by a caller-supplied clock.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            clock,
        }
    }

    pub fn stats(&self) -> CacheResult<CacheStats> {
        let state = self.lock()?;
        let mut stats = state.stats.clone();
        stats.total_entries = state.entries.len();
        Ok(stats)
    }

    pub fn contains(&self, key: &str) -> CacheResult<bool> {
        Ok(self.lock()?.entries.contains_key(key))
    }

    /// Drops every entry past its stale window; returns how many were dropped.
    pub fn purge_expired(&self) -> CacheResult<usize> {
        let now_ms = (self.clock)();
        let removed = self.lock()?.drop_expired(now_ms);
        Ok(removed)
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, CacheState>> {
        self.state
            .lock()
            .map_err(|_| CacheError::Unavailable("cache state lock poisoned".to_string()))
    }
}

impl QueryCache for MemoryCache {
    fn lookup(&self, key: &str) -> CacheResult<CacheLookup> {
        let now_ms = (self.clock)();
        let mut state = self.lock()?;

        let Some(freshness) = state.entries.get(key).map(|entry| entry.freshness(now_ms)) else {
            state.stats.misses += 1;
            return Ok(CacheLookup::Miss);
        };

        match freshness {
            Freshness::Expired => {
                state.entries.remove(key);
                state.stats.misses += 1;
                debug!("event=cache_lookup module=cache status=expired key={key}");
                Ok(CacheLookup::Miss)
            }
            Freshness::Fresh => {
                state.stats.hits += 1;
                let value = state.entries[key].value.clone();
                Ok(CacheLookup::Fresh(value))
            }
            Freshness::Stale => {
                state.stats.stale_hits += 1;
                let value = state.entries[key].value.clone();
                Ok(CacheLookup::Stale(value))
            }
        }
    }

    fn store(&self, key: &str, value: Value, policy: &CachePolicy) -> CacheResult<()> {
        let stored_at_ms = (self.clock)();
        let mut state = self.lock()?;
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at_ms,
                policy: policy.clone(),
            },
        );
        state.stats.total_entries = state.entries.len();

        state.stores_since_purge += 1;
        if state.stores_since_purge >= PURGE_EVERY_STORES {
            let removed = state.drop_expired(stored_at_ms);
            debug!("event=cache_purge module=cache status=ok removed={removed}");
        }
        Ok(())
    }

    fn invalidate_tags(&self, tags: &[String]) -> CacheResult<usize> {
        let mut state = self.lock()?;
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| !entry.policy.tags.iter().any(|tag| tags.contains(tag)));
        let removed = before - state.entries.len();
        state.stats.invalidated += removed as u64;
        state.stats.total_entries = state.entries.len();
        Ok(removed)
    }
}

fn system_now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
