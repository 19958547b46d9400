//! Cache types and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rendered artifact stored in the preview cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Rendered page markup
    pub html: String,
    /// Component identifiers used to render the page
    pub components: Vec<String>,
    /// When the artifact was produced
    pub generated_at: DateTime<Utc>,
    /// Stamped by the cache on `set`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Create a new cache entry generated now
    pub fn new(html: impl Into<String>, components: Vec<String>) -> Self {
        Self {
            html: html.into(),
            components,
            generated_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Copy of this entry expiring `ttl` after `now`, saturating at the
    /// latest representable instant
    pub fn stamped(&self, now: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            expires_at: Some(expires_at),
            ..self.clone()
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// An entry is stale once `expires_at <= now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Equality ignoring the cache-assigned expiry
    pub fn same_artifact(&self, other: &CacheEntry) -> bool {
        self.html == other.html
            && self.components == other.components
            && self.generated_at == other.generated_at
    }
}

/// Connection settings for the distributed tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCacheConfig {
    /// Base URL of the Redis-over-HTTP endpoint
    pub url: String,
    /// Bearer token
    pub token: String,
    /// Prefix applied to every key written by this process
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl RemoteCacheConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_key_prefix() -> String {
    "preview:".to_string()
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached artifact
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Upper bound on any distributed-tier call
    #[serde(with = "humantime_serde")]
    pub backend_timeout: Duration,
    /// Interval for the optional background sweep of the in-process tier
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
    /// Distributed tier; `None` runs memory-only
    pub remote: Option<RemoteCacheConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            backend_timeout: Duration::from_millis(500),
            cleanup_interval: Duration::from_secs(5 * 60),
            remote: None,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatistics {
    /// Entries currently held in memory, expired ones included until swept
    pub entry_count: usize,
    pub hits: u64,
    pub misses: u64,
    /// Distributed-tier failures and timeouts absorbed by the cache
    pub backend_errors: u64,
    /// Whether a distributed tier is configured
    pub distributed: bool,
}

impl CacheStatistics {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total_requests = self.hits + self.misses;
        if total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / total_requests as f64
        }
    }
}
