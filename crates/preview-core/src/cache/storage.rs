//! Cache backend implementations

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::fmt;
use std::time::Duration;

use super::types::CacheEntry;
use crate::error::PreviewResult;

/// A single cache tier.
///
/// `PreviewCache` composes an in-process tier with an optional distributed
/// one; errors returned here never reach the cache's callers.
#[async_trait]
pub trait CacheBackend: Send + Sync + fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Get a cache entry, expired or not
    async fn get(&self, key: &str) -> PreviewResult<Option<CacheEntry>>;

    /// Store an entry; backends with native expiry should apply `ttl`
    async fn set(&self, key: &str, entry: &CacheEntry, ttl: Duration) -> PreviewResult<()>;

    /// Remove an entry; absent keys are not an error
    async fn remove(&self, key: &str) -> PreviewResult<()>;
}

/// In-process tier backed by a sharded concurrent map
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a live entry, dropping it if it has expired
    pub fn get_live(&self, key: &str) -> Option<CacheEntry> {
        let now = Utc::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired_at(now) {
                return Some(entry.value().clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| entry.is_expired_at(now));
        None
    }

    pub fn insert(&self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn remove_key(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove stale entries, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before.saturating_sub(self.entries.len())
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

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> PreviewResult<Option<CacheEntry>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, entry: &CacheEntry, _ttl: Duration) -> PreviewResult<()> {
        self.insert(key, entry.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PreviewResult<()> {
        self.remove_key(key);
        Ok(())
    }
}
