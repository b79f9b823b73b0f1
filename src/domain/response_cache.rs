//! Query response cache with all-or-nothing invalidation.
//!
//! [`ResponseCache`] wraps a bounded [`moka::sync::Cache`]. Every entry
//! remembers the invalidation generation that was live when its query
//! started; [`ResponseCache::invalidate_all`] bumps the shared generation so
//! that every older entry reads as a miss, whatever its TTL says.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use moka::sync::Cache;

/// Snapshot of the shared invalidation token.
///
/// Taken before a query runs and stored with its result. A result whose
/// generation is no longer the live one is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheGeneration(u64);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    generation: CacheGeneration,
}

/// Shared, thread-safe response cache keyed by query cache keys.
///
/// Cloning is cheap: clones share the same entries and the same
/// invalidation generation.
#[derive(Debug, Clone)]
pub struct ResponseCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    entries: Cache<String, CacheEntry<V>>,
    generation: Arc<AtomicU64>,
}

impl<V> ResponseCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_capacity).build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the live invalidation generation.
    #[must_use]
    pub fn generation(&self) -> CacheGeneration {
        CacheGeneration(self.generation.load(Ordering::Acquire))
    }

    /// Looks up `key`, treating expired and pre-invalidation entries as misses.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.generation != self.generation() || entry.expires_at <= Instant::now() {
            self.entries.invalidate(key);
            return None;
        }
        Some(entry.value)
    }

    /// Stores `value` under `key` for `ttl`, tagged with the live generation.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let generation = self.generation();
        self.set_at(key, value, ttl, generation);
    }

    /// Stores `value` tagged with a generation captured earlier.
    ///
    /// If an invalidation happened since `generation` was taken, the value
    /// is dropped instead of stored.
    pub fn set_at(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: Duration,
        generation: CacheGeneration,
    ) {
        if generation != self.generation() {
            tracing::debug!("skipping cache store for result computed before invalidation");
            return;
        }
        let expires_at = Instant::now()
            .checked_add(ttl)
            .unwrap_or_else(Instant::now);
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at,
                generation,
            },
        );
    }

    /// Voids every entry created before this call.
    ///
    /// The generation bump is a single atomic increment, so concurrent
    /// invalidations are never lost and readers never see a partial update.
    pub fn invalidate_all(&self) {
        let previous = self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.invalidate_all();
        tracing::info!(generation = previous.saturating_add(1), "response cache invalidated");
    }
}
