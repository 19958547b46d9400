//! Distributed cache tier over a Redis-compatible HTTP endpoint
//!
//! Commands are posted as JSON arrays (`["SET", key, value, "PX", ms]`) with a
//! bearer token, and replies come back as `{"result": ...}` or
//! `{"error": "..."}`. Expiry is delegated to the server via `PX`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::storage::CacheBackend;
use super::types::{CacheEntry, RemoteCacheConfig};
use crate::error::{PreviewError, PreviewResult};

const BACKEND_NAME: &str = "rest";

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

/// Distributed tier speaking the Redis REST command protocol
#[derive(Debug, Clone)]
pub struct RestCacheBackend {
    client: reqwest::Client,
    url: String,
    token: String,
    key_prefix: String,
}

impl RestCacheBackend {
    /// Create a backend; `request_timeout` bounds every HTTP round trip
    pub fn new(config: &RemoteCacheConfig, request_timeout: Duration) -> PreviewResult<Self> {
        if config.url.trim().is_empty() || config.token.trim().is_empty() {
            return Err(PreviewError::config(
                "Distributed cache requires both a URL and a token",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PreviewError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn command(&self, args: &[&str]) -> PreviewResult<serde_json::Value> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PreviewError::backend_unavailable(
                BACKEND_NAME,
                format!("{} returned HTTP {}", args[0], status.as_u16()),
            ));
        }

        let reply: CommandReply = response.json().await?;
        match reply.error {
            Some(error) => Err(PreviewError::backend_unavailable(BACKEND_NAME, error)),
            None => Ok(reply.result),
        }
    }
}

#[async_trait]
impl CacheBackend for RestCacheBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn get(&self, key: &str) -> PreviewResult<Option<CacheEntry>> {
        let key = self.prefixed(key);
        match self.command(&["GET", &key]).await? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            other => Err(PreviewError::backend_unavailable(
                BACKEND_NAME,
                format!("Unexpected GET reply: {}", other),
            )),
        }
    }

    async fn set(&self, key: &str, entry: &CacheEntry, ttl: Duration) -> PreviewResult<()> {
        let key = self.prefixed(key);
        let payload = serde_json::to_string(entry)?;
        let millis = ttl.as_millis().max(1).to_string();

        self.command(&["SET", &key, &payload, "PX", &millis]).await?;
        debug!(key = %key, ttl_ms = %millis, "Stored entry in distributed cache");
        Ok(())
    }

    async fn remove(&self, key: &str) -> PreviewResult<()> {
        let key = self.prefixed(key);
        self.command(&["DEL", &key]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, PreviewCache};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn backend_for(server: &MockServer) -> RestCacheBackend {
        let config = RemoteCacheConfig::new(server.uri(), "test-token");
        RestCacheBackend::new(&config, Duration::from_secs(2)).unwrap()
    }

    fn sample_entry() -> CacheEntry {
        CacheEntry::new("<h1>Pricing</h1>", vec!["PricingTable".to_string()])
    }

    /// Minimal in-memory command server for SET/GET/DEL
    #[derive(Clone, Default)]
    struct CommandStore {
        values: Arc<Mutex<HashMap<String, String>>>,
    }

    impl Respond for CommandStore {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let args: Vec<String> = match serde_json::from_slice(&request.body) {
                Ok(args) => args,
                Err(_) => return ResponseTemplate::new(400),
            };
            let mut values = self.values.lock().unwrap();
            let result = match args.first().map(String::as_str) {
                Some("SET") => {
                    values.insert(args[1].clone(), args[2].clone());
                    json!("OK")
                }
                Some("GET") => values.get(&args[1]).map_or(json!(null), |v| json!(v)),
                Some("DEL") => json!(values.remove(&args[1]).map_or(0, |_| 1)),
                _ => {
                    return ResponseTemplate::new(200)
                        .set_body_json(json!({"error": "ERR unknown command"}));
                }
            };
            ResponseTemplate::new(200).set_body_json(json!({ "result": result }))
        }
    }

    #[test]
    fn test_requires_credentials() {
        let config = RemoteCacheConfig::new("https://cache.example.com", "");
        let err = RestCacheBackend::new(&config, Duration::from_millis(100)).unwrap_err();
        assert_eq!(err.error_code(), "PREVIEW_CONFIG");
    }

    #[test]
    fn test_keys_are_prefixed() {
        let config = RemoteCacheConfig::new("https://cache.example.com/", "token");
        let backend = RestCacheBackend::new(&config, Duration::from_millis(100)).unwrap();
        assert_eq!(backend.prefixed("page:abc:/"), "preview:page:abc:/");
        assert_eq!(backend.url, "https://cache.example.com");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_backend_unavailable() {
        // Port 9 on loopback is the discard port; nothing listens there in CI
        let config = RemoteCacheConfig::new("http://127.0.0.1:9", "token");
        let backend = RestCacheBackend::new(&config, Duration::from_millis(200)).unwrap();

        let err = backend.get("missing").await.unwrap_err();
        assert_eq!(err.error_code(), "PREVIEW_BACKEND_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_set_sends_px_command_with_bearer_token() {
        let server = MockServer::start().await;
        let entry = sample_entry();
        let payload = serde_json::to_string(&entry).unwrap();

        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!(["SET", "preview:k", payload, "PX", "60000"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "OK"})))
            .expect(1)
            .mount(&server)
            .await;

        backend_for(&server)
            .set("k", &entry, Duration::from_secs(60))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_decodes_stored_entry() {
        let server = MockServer::start().await;
        let entry = sample_entry();

        Mock::given(method("POST"))
            .and(body_json(json!(["GET", "preview:k"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": serde_json::to_string(&entry).unwrap()
            })))
            .mount(&server)
            .await;

        let cached = backend_for(&server).get("k").await.unwrap();
        assert_eq!(cached, Some(entry));
    }

    #[tokio::test]
    async fn test_get_null_result_is_miss() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!(["GET", "preview:absent"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": null})))
            .mount(&server)
            .await;

        assert_eq!(backend_for(&server).get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_del_sends_prefixed_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!(["DEL", "preview:k"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": 1})))
            .expect(1)
            .mount(&server)
            .await;

        backend_for(&server).remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_error_reply_is_backend_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": "WRONGPASS invalid token"})),
            )
            .mount(&server)
            .await;

        let err = backend_for(&server).get("k").await.unwrap_err();
        assert_eq!(err.error_code(), "PREVIEW_BACKEND_UNAVAILABLE");
        assert!(err.to_string().contains("WRONGPASS"));
    }

    #[tokio::test]
    async fn test_http_error_status_is_backend_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .set("k", &sample_entry(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "PREVIEW_BACKEND_UNAVAILABLE");
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_two_tier_roundtrip_through_rest_tier() {
        let server = MockServer::start().await;
        let store = CommandStore::default();
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(store.clone())
            .mount(&server)
            .await;

        let cache = PreviewCache::new(CacheConfig {
            backend_timeout: Duration::from_secs(2),
            remote: Some(RemoteCacheConfig::new(server.uri(), "test-token")),
            ..Default::default()
        })
        .unwrap();
        let entry = sample_entry();

        let stamped = cache.set("page:s1:/pricing", entry.clone()).await;
        assert!(store.values.lock().unwrap().contains_key("preview:page:s1:/pricing"));

        // Served by the REST tier alone
        cache.clear_memory();
        let cached = cache.get("page:s1:/pricing").await.unwrap();
        assert!(cached.same_artifact(&entry));
        assert_eq!(cached.expires_at, stamped.expires_at);

        cache.invalidate("page:s1:/pricing").await;
        assert!(store.values.lock().unwrap().is_empty());
        assert!(cache.get("page:s1:/pricing").await.is_none());
        assert_eq!(cache.statistics().backend_errors, 0);
    }
}
