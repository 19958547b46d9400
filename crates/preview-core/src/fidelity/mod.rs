//! Fidelity scoring for preview sessions
//!
//! Rates how representative a session's context is of the exported project.
//! Four equally weighted factors (branding, navigation, integrations,
//! planning) each contribute at most 25 points, so the total is always 0-100.

mod scorer;
mod types;

pub use scorer::{FidelityScorer, calculate_fidelity_score, get_fidelity_details};
pub use types::{FidelityConfig, FidelityDetail, FidelityFactor, FidelityReport, FACTOR_WEIGHT};
