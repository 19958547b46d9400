//! Configuration for the preview subsystem
//!
//! Settings come from an optional JSON file followed by environment
//! overrides. Every section falls back to its defaults when omitted.

mod env_loader;
mod file_loader;

pub use env_loader::{apply_env, load_from_env};
pub use file_loader::load_from_file;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cache::CacheConfig;
use crate::error::PreviewResult;
use crate::fidelity::FidelityConfig;
use crate::session::SessionConfig;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub session: SessionConfig,
    pub cache: CacheConfig,
    pub fidelity: FidelityConfig,
}

impl PreviewConfig {
    /// Load `path` if given, then apply environment overrides
    pub fn load(path: Option<&Path>) -> PreviewResult<Self> {
        let mut config = match path {
            Some(path) => load_from_file(path)?,
            None => Self::default(),
        };
        apply_env(&mut config)?;
        Ok(config)
    }
}
