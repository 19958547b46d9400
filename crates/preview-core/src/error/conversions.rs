//! From trait implementations for PreviewError conversions

use super::types::PreviewError;

impl From<serde_json::Error> for PreviewError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<reqwest::Error> for PreviewError {
    fn from(error: reqwest::Error) -> Self {
        let message = match error.status() {
            Some(status) => format!("HTTP {}: {}", status.as_u16(), error),
            None => error.to_string(),
        };
        Self::backend_unavailable("rest", message)
    }
}
