//! File-based configuration loading

use std::fs;
use std::path::Path;

use super::PreviewConfig;
use crate::error::{PreviewError, PreviewResult};

/// Load configuration from a JSON file.
///
/// Returns the defaults if the file doesn't exist.
pub fn load_from_file(path: &Path) -> PreviewResult<PreviewConfig> {
    if !path.exists() {
        return Ok(PreviewConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        PreviewError::config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        PreviewError::config(format!(
            "Failed to parse config file '{}': {}",
            path.display(),
            e
        ))
    })
}
