//! Scaffold Preview Core Library
//!
//! This crate provides ephemeral preview sessions for generated web-project
//! scaffolds, including simulated navigation state, fidelity scoring and a
//! two-tier cache for rendered pages.

pub mod cache;
pub mod config;
pub mod error;
pub mod fidelity;
pub mod service;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use cache::{CacheBackend, CacheConfig, CacheEntry, CacheStatistics, PreviewCache};
pub use config::PreviewConfig;
pub use error::{PreviewError, PreviewResult};
pub use fidelity::{
    FidelityDetail, FidelityFactor, FidelityReport, FidelityScorer, calculate_fidelity_score,
    get_fidelity_details,
};
pub use service::{PageRenderer, PreviewService, RenderedPage};
pub use session::{
    CreateSessionInput, PreviewSession, SessionConfig, SessionStore, SessionSummary,
    SessionUpdate,
};
pub use state::{AuthState, Breadcrumb, StateSimulation, create_default_state_simulation};
