//! Two-tier cache for rendered preview pages
//!
//! Lookups go to the distributed tier first and fall back to the in-process
//! map; writes go to both. The distributed tier is optional and every call to
//! it is bounded by a timeout, so an outage degrades the cache to
//! per-process caching instead of failing the caller.

pub mod keys;
pub mod remote;
pub mod storage;
pub mod types;


pub use remote::RestCacheBackend;
pub use storage::{CacheBackend, MemoryBackend};
pub use types::{CacheConfig, CacheEntry, CacheStatistics, RemoteCacheConfig};

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{PreviewError, PreviewResult};

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    backend_errors: AtomicU64,
}

/// Cache manager that coordinates the in-process and distributed tiers
#[derive(Debug)]
pub struct PreviewCache {
    /// Always populated; the correctness fallback
    memory: MemoryBackend,
    /// Shared tier, if configured
    distributed: Option<Arc<dyn CacheBackend>>,
    config: CacheConfig,
    counters: Counters,
}

impl PreviewCache {
    /// Build the cache described by `config`.
    ///
    /// Remote credentials switch on the distributed tier; without them the
    /// cache runs memory-only with the same public behaviour.
    pub fn new(config: CacheConfig) -> PreviewResult<Self> {
        let distributed: Option<Arc<dyn CacheBackend>> = match &config.remote {
            Some(remote) => Some(Arc::new(RestCacheBackend::new(
                remote,
                config.backend_timeout,
            )?)),
            None => None,
        };

        Ok(Self::assemble(config, distributed))
    }

    /// Memory-only cache
    pub fn memory_only(config: CacheConfig) -> Self {
        Self::assemble(config, None)
    }

    /// Cache with a caller-supplied distributed tier
    pub fn with_backend(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self::assemble(config, Some(backend))
    }

    fn assemble(config: CacheConfig, distributed: Option<Arc<dyn CacheBackend>>) -> Self {
        if let Some(backend) = &distributed {
            info!(backend = backend.name(), "Preview cache running two-tier");
        } else {
            debug!("Preview cache running memory-only");
        }

        Self {
            memory: MemoryBackend::new(),
            distributed,
            config,
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_distributed(&self) -> bool {
        self.distributed.is_some()
    }

    /// Look up a live entry.
    ///
    /// Expired entries are removed from the tier that served them and
    /// reported as a miss.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        if let Some(backend) = &self.distributed {
            let lookup = self
                .guarded(backend.as_ref(), "get", key, backend.get(key))
                .await;
            if let Some(Some(entry)) = lookup {
                if !entry.is_expired_at(Utc::now()) {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, tier = backend.name(), "Preview cache hit");
                    return Some(entry);
                }

                self.guarded(backend.as_ref(), "remove", key, backend.remove(key))
                    .await;
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, tier = backend.name(), "Dropped expired preview cache entry");
                return None;
            }
        }

        match self.memory.get_live(key) {
            Some(entry) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, tier = "memory", "Preview cache hit");
                Some(entry)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Preview cache miss");
                None
            }
        }
    }

    /// Store an entry in both tiers, returning it with `expires_at` stamped
    pub async fn set(&self, key: &str, entry: CacheEntry) -> CacheEntry {
        let stamped = entry.stamped(Utc::now(), self.config.ttl);

        self.memory.insert(key, stamped.clone());
        if let Some(backend) = &self.distributed {
            self.guarded(
                backend.as_ref(),
                "set",
                key,
                backend.set(key, &stamped, self.config.ttl),
            )
            .await;
        }

        stamped
    }

    /// Remove `key` from both tiers; absent keys are fine
    pub async fn invalidate(&self, key: &str) {
        self.memory.remove_key(key);
        if let Some(backend) = &self.distributed {
            self.guarded(backend.as_ref(), "remove", key, backend.remove(key))
                .await;
        }
        debug!(key = %key, "Invalidated preview cache entry");
    }

    /// Sweep the in-process tier; the distributed tier expires natively
    pub fn cleanup_expired(&self) -> usize {
        let removed = self.memory.cleanup_expired();
        if removed > 0 {
            info!(removed, "Cleaned up expired preview cache entries");
        }
        removed
    }

    /// Drop every in-process entry
    pub fn clear_memory(&self) {
        self.memory.clear();
    }

    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            entry_count: self.memory.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            backend_errors: self.counters.backend_errors.load(Ordering::Relaxed),
            distributed: self.is_distributed(),
        }
    }

    /// Sweep the in-process tier on a fixed interval until `token` is cancelled
    pub fn spawn_cleanup(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = self.config.cleanup_interval.max(Duration::from_millis(10));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Preview cache cleanup task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        cache.cleanup_expired();
                    }
                }
            }
        })
    }

    /// Run a distributed-tier call under the configured timeout.
    ///
    /// Failures and timeouts are logged and counted, never returned.
    async fn guarded<T, F>(
        &self,
        backend: &dyn CacheBackend,
        operation: &str,
        key: &str,
        call: F,
    ) -> Option<T>
    where
        F: Future<Output = PreviewResult<T>>,
    {
        let error = match tokio::time::timeout(self.config.backend_timeout, call).await {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(error)) => error,
            Err(_) => PreviewError::backend_unavailable(
                backend.name(),
                format!("{} timed out after {:?}", operation, self.config.backend_timeout),
            ),
        };

        self.counters.backend_errors.fetch_add(1, Ordering::Relaxed);
        warn!(
            backend = backend.name(),
            operation,
            key = %key,
            error = %error,
            "Distributed cache call failed, using in-process tier"
        );
        None
    }
}
