//! Error types for the preview core
//!
//! Session operations return typed failures the caller branches on:
//! - `Validation`: missing creation fields, unknown navigation targets, malformed updates
//! - `NotFound`: unknown or expired sessions
//! - `BackendUnavailable`: distributed cache failures (absorbed inside `PreviewCache`)

mod constructors;
mod conversions;
mod types;

pub use types::{PreviewError, PreviewResult};
