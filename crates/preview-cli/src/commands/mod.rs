//! Command implementations

pub mod create;
pub mod score;

use anyhow::Context;
use preview_core::config::PreviewConfig;
use preview_core::session::CreateSessionInput;
use std::fs;
use std::path::Path;

/// Load the file (if any) and apply environment overrides
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PreviewConfig> {
    PreviewConfig::load(path).context("Failed to load preview configuration")
}

/// Read a session request from a JSON file
pub fn read_request(path: &Path) -> anyhow::Result<CreateSessionInput> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid session request in '{}'", path.display()))
}

/// Print the effective configuration with the cache token masked
pub fn show_config(config: &PreviewConfig) -> anyhow::Result<()> {
    let mut shown = config.clone();
    if let Some(remote) = shown.cache.remote.as_mut() {
        remote.token = "***".to_string();
    }
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}
