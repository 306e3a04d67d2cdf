// Copyright 2025 Cowboy AI, LLC.

//! Read-through cache for match lookups
//!
//! Wraps any [`MatchRepository`] with a bounded LRU map keyed by match code.
//! Entries older than the configured TTL are treated as misses. Updates
//! invalidate the cached entry so readers never see a snapshot older than
//! their own write. Every update also bumps an invalidation counter; a load
//! that overlapped an update is returned but not cached.

use super::repository::{MatchCode, MatchRepository, MatchSubscription, RepositoryError};
use crate::cricket_match::Match;
use crate::entity::MatchId;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Cache sizing and expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Most matches held at once
    pub capacity: usize,
    /// How long a cached match stays fresh
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            ttl: Duration::from_secs(30),
        }
    }
}

struct CachedMatch {
    game: Match,
    fetched_at: Instant,
}

struct CacheState {
    entries: LruCache<MatchCode, CachedMatch>,
    invalidations: u64,
}

/// A repository with a TTL cache in front of `get_by_code`
pub struct CachedMatchRepository<R> {
    inner: R,
    cache: Arc<Mutex<CacheState>>,
    ttl: Duration,
}

impl<R: MatchRepository> CachedMatchRepository<R> {
    /// Put a cache in front of `inner`
    pub fn new(inner: R, config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Arc::new(Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                invalidations: 0,
            })),
            ttl: config.ttl,
        }
    }

    /// The wrapped repository
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Cached entries, fresh or not
    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.entries.len()
    }

    /// A fresh cached match, or the invalidation count to load against
    async fn cached(&self, code: &MatchCode) -> Result<Match, u64> {
        let mut cache = self.cache.lock().await;
        let seen = cache.invalidations;
        let Some(entry) = cache.entries.get(code) else {
            return Err(seen);
        };
        if entry.fetched_at.elapsed() < self.ttl {
            debug!(%code, "match cache hit");
            return Ok(entry.game.clone());
        }
        debug!(%code, "match cache entry expired");
        cache.entries.pop(code);
        Err(seen)
    }
}

#[async_trait]
impl<R: MatchRepository> MatchRepository for CachedMatchRepository<R> {
    async fn create(&self, game: &Match) -> Result<MatchCode, RepositoryError> {
        self.inner.create(game).await
    }

    async fn update(&self, id: MatchId, game: &Match) -> Result<(), RepositoryError> {
        let result = self.inner.update(id, game).await;
        let mut cache = self.cache.lock().await;
        cache.invalidations += 1;
        if let Some(code) = game.code() {
            cache.entries.pop(code);
        }
        result
    }

    async fn get_by_code(&self, code: &MatchCode) -> Result<Option<Match>, RepositoryError> {
        let seen = match self.cached(code).await {
            Ok(game) => return Ok(Some(game)),
            Err(seen) => seen,
        };

        let loaded = self.inner.get_by_code(code).await?;
        if let Some(game) = &loaded {
            let mut cache = self.cache.lock().await;
            if cache.invalidations == seen {
                cache.entries.put(
                    code.clone(),
                    CachedMatch {
                        game: game.clone(),
                        fetched_at: Instant::now(),
                    },
                );
            } else {
                debug!(%code, "update raced the load; not caching");
            }
        }
        Ok(loaded)
    }

    async fn subscribe(&self, id: MatchId) -> Result<MatchSubscription, RepositoryError> {
        self.inner.subscribe(id).await
    }
}
