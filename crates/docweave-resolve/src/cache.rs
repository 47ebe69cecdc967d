//! Fingerprint-keyed link resolution cache.
//!
//! Avoids re-extracting relations from documents whose content has not
//! changed. The key embeds the content fingerprint, so an edit simply
//! produces a new key and the old entry ages out through TTL or capacity
//! eviction. Default: 1000 entries, 1-hour TTL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use docweave_core::{Relation, Result};
use serde::Serialize;
use tracing::debug;

/// Cached extraction output for one `(document id, fingerprint)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedLinks {
    pub relations: Vec<Relation>,
    /// Whether each target existed when the entry was written. Targets can
    /// appear or disappear without the source changing, so this is a
    /// diagnostic snapshot rather than an authority.
    pub existence: HashMap<String, bool>,
    pub created_at: DateTime<Utc>,
}

/// Cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Link cache contract. Errors are treated by callers as misses.
pub trait LinkCache: Send + Sync {
    /// Exact-fingerprint lookup.
    fn get(&self, id: &str, fingerprint: &str) -> Result<Option<CachedLinks>>;

    fn put(
        &self,
        id: &str,
        fingerprint: &str,
        relations: Vec<Relation>,
        existence: HashMap<String, bool>,
    ) -> Result<()>;

    /// Advisory hint that `id` changed. Correctness never depends on it.
    fn invalidate(&self, _id: &str) {}

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

struct Entry {
    links: CachedLinks,
    inserted_at: Instant,
    last_access: Instant,
}

/// Thread-safe bounded cache with absolute TTL, optional idle (sliding)
/// expiry and least-recently-used eviction at capacity.
pub struct LinkResolutionCache {
    entries: DashMap<(String, String), Entry>,
    max_entries: usize,
    ttl: Duration,
    idle_ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl LinkResolutionCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::with_capacity(max_entries.min(4096)),
            max_entries,
            ttl,
            idle_ttl: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Create a cache with default settings (1000 entries, 1hr TTL).
    pub fn default_cache() -> Self {
        Self::new(1000, Duration::from_secs(3600))
    }

    /// Also expire entries not read for `idle`; every hit restarts the clock.
    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle_ttl = Some(idle);
        self
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.inserted_at.elapsed() >= self.ttl
            || self
                .idle_ttl
                .is_some_and(|idle| entry.last_access.elapsed() >= idle)
    }

    /// Drop all expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
            debug!("Purged {} expired link cache entries", removed);
        }
        removed
    }

    /// Remove the least recently used entry.
    fn evict_lru(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().last_access)
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            if self.entries.remove(&key).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl LinkCache for LinkResolutionCache {
    fn get(&self, id: &str, fingerprint: &str) -> Result<Option<CachedLinks>> {
        let key = (id.to_string(), fingerprint.to_string());
        let hit = match self.entries.get_mut(&key) {
            Some(mut entry) if !self.is_expired(&entry) => {
                entry.last_access = Instant::now();
                Some(entry.links.clone())
            }
            Some(_) => None,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        };
        match hit {
            Some(links) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(links))
            }
            None => {
                // re-checked under the shard lock: a fresh put since the
                // guard above was released must survive
                if self
                    .entries
                    .remove_if(&key, |_, entry| self.is_expired(entry))
                    .is_some()
                {
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    fn put(
        &self,
        id: &str,
        fingerprint: &str,
        relations: Vec<Relation>,
        existence: HashMap<String, bool>,
    ) -> Result<()> {
        if self.max_entries == 0 {
            return Ok(());
        }
        let key = (id.to_string(), fingerprint.to_string());
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.purge_expired();
            while self.entries.len() >= self.max_entries {
                let before = self.entries.len();
                self.evict_lru();
                if self.entries.len() >= before {
                    break;
                }
            }
        }
        let now = Instant::now();
        self.entries.insert(
            key,
            Entry {
                links: CachedLinks {
                    relations,
                    existence,
                    created_at: Utc::now(),
                },
                inserted_at: now,
                last_access: now,
            },
        );
        Ok(())
    }

    fn invalidate(&self, id: &str) {
        self.entries.retain(|(entry_id, _), _| entry_id != id);
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Cache that never stores anything; every lookup is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLinkCache;

impl LinkCache for NoopLinkCache {
    fn get(&self, _id: &str, _fingerprint: &str) -> Result<Option<CachedLinks>> {
        Ok(None)
    }

    fn put(
        &self,
        _id: &str,
        _fingerprint: &str,
        _relations: Vec<Relation>,
        _existence: HashMap<String, bool>,
    ) -> Result<()> {
        Ok(())
    }
}
