//! Cache key helpers
//!
//! Keys are opaque to the cache; these helpers only keep callers consistent.

use sha2::{Digest, Sha256};

use crate::state::normalize_path;

/// Key for a page rendered inside a session
pub fn page(session_id: &str, path: &str) -> String {
    format!("page:{}:{}", session_id, normalize_path(path))
}

/// Key derived from arbitrary content, e.g. a serialized page definition
pub fn content(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    format!("content:{:x}", hasher.finalize())
}
