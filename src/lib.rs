//! Scaffold Preview
//!
//! Umbrella crate re-exporting [`preview_core`] for hosts that embed preview
//! sessions.

pub use preview_core::*;
