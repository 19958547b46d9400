//! Environment variable-based configuration loading

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use super::PreviewConfig;
use crate::cache::RemoteCacheConfig;
use crate::error::{PreviewError, PreviewResult};

const SESSION_TTL_SECS: &str = "PREVIEW_SESSION_TTL_SECS";
const CACHE_TTL_SECS: &str = "PREVIEW_CACHE_TTL_SECS";
const CACHE_TIMEOUT_MS: &str = "PREVIEW_CACHE_TIMEOUT_MS";
const CACHE_REST_URL: [&str; 2] = ["PREVIEW_CACHE_REST_URL", "UPSTASH_REDIS_REST_URL"];
const CACHE_REST_TOKEN: [&str; 2] = ["PREVIEW_CACHE_REST_TOKEN", "UPSTASH_REDIS_REST_TOKEN"];

/// Load configuration from environment variables on top of the defaults
pub fn load_from_env() -> PreviewResult<PreviewConfig> {
    let mut config = PreviewConfig::default();
    apply_env(&mut config)?;
    Ok(config)
}

/// Apply `PREVIEW_*` overrides to an existing configuration.
///
/// The distributed cache is switched on only when both a URL and a token are
/// present.
pub fn apply_env(config: &mut PreviewConfig) -> PreviewResult<()> {
    apply_vars(config, |name| env::var(name).ok())
}

pub(crate) fn apply_vars<F>(config: &mut PreviewConfig, lookup: F) -> PreviewResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(secs) = parse_var::<u64>(SESSION_TTL_SECS, read(SESSION_TTL_SECS))? {
        config.session.ttl = Duration::from_secs(secs);
    }
    if let Some(secs) = parse_var::<u64>(CACHE_TTL_SECS, read(CACHE_TTL_SECS))? {
        config.cache.ttl = Duration::from_secs(secs);
    }
    if let Some(ms) = parse_var::<u64>(CACHE_TIMEOUT_MS, read(CACHE_TIMEOUT_MS))? {
        config.cache.backend_timeout = Duration::from_millis(ms);
    }

    let url = CACHE_REST_URL.iter().find_map(|name| read(name));
    let token = CACHE_REST_TOKEN.iter().find_map(|name| read(name));
    match (url, token) {
        (Some(url), Some(token)) => {
            let key_prefix = config
                .cache
                .remote
                .as_ref()
                .map(|remote| remote.key_prefix.clone());
            let mut remote = RemoteCacheConfig::new(url.trim(), token.trim());
            if let Some(prefix) = key_prefix {
                remote.key_prefix = prefix;
            }
            debug!(url = %remote.url, "Distributed cache configured from environment");
            config.cache.remote = Some(remote);
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("Distributed cache needs both a REST URL and a token; staying memory-only");
        }
        (None, None) => {}
    }

    Ok(())
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>) -> PreviewResult<Option<T>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| PreviewError::config(format!("Invalid {} value: {}", name, raw)))
        })
        .transpose()
}
