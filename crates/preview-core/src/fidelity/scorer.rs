//! Fidelity scorer implementation

use std::collections::{BTreeSet, HashSet};

use super::types::{FACTOR_WEIGHT, FidelityConfig, FidelityDetail, FidelityFactor, FidelityReport};
use crate::session::types::PreviewSession;

/// Customizable branding fields: five colour slots plus the font pair
const BRANDING_FIELDS: usize = 6;

/// Computes fidelity scores from session snapshots.
///
/// Scoring is pure: the same snapshot always yields the same report, and the
/// score always equals the sum of the per-factor `achieved` values.
#[derive(Debug, Clone, Default)]
pub struct FidelityScorer {
    config: FidelityConfig,
}

impl FidelityScorer {
    pub fn new(config: FidelityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FidelityConfig {
        &self.config
    }

    /// Total score, 0-100
    pub fn calculate_fidelity_score(&self, session: &PreviewSession) -> u8 {
        total(&self.get_fidelity_details(session))
    }

    /// Per-factor breakdown in a fixed order
    pub fn get_fidelity_details(&self, session: &PreviewSession) -> Vec<FidelityDetail> {
        vec![
            self.branding(session),
            self.navigation(session),
            self.integrations(session),
            self.planning(session),
        ]
    }

    pub fn report(&self, session: &PreviewSession) -> FidelityReport {
        let details = self.get_fidelity_details(session);
        FidelityReport {
            score: total(&details),
            details,
        }
    }

    fn branding(&self, session: &PreviewSession) -> FidelityDetail {
        let colors = session.branding.colors.customized_count();
        let fonts = session.branding.fonts.is_customized();
        let customized = colors + usize::from(fonts);

        let explanation = format!(
            "{} of 5 colors customized, {} font pair",
            colors,
            if fonts { "custom" } else { "default" }
        );

        FidelityDetail {
            factor: FidelityFactor::Branding,
            weight: FACTOR_WEIGHT,
            achieved: scaled_round(customized, BRANDING_FIELDS),
            explanation,
        }
    }

    fn navigation(&self, session: &PreviewSession) -> FidelityDetail {
        let target = self.config.navigation_target;
        let mut seen = HashSet::new();
        let described = session
            .navigation
            .pages
            .iter()
            .map(|page| page.description.trim().to_lowercase())
            .filter(|description| !description.is_empty())
            .filter(|description| seen.insert(description.clone()))
            .count();

        let (achieved, explanation) = if target == 0 {
            (FACTOR_WEIGHT, format!("{} pages described", described))
        } else {
            (
                scaled_floor(described.min(target), target),
                format!(
                    "{} of {} target pages with distinct descriptions",
                    described.min(target),
                    target
                ),
            )
        };

        FidelityDetail {
            factor: FidelityFactor::Navigation,
            weight: FACTOR_WEIGHT,
            achieved,
            explanation,
        }
    }

    fn integrations(&self, session: &PreviewSession) -> FidelityDetail {
        let expected: BTreeSet<&str> = self
            .config
            .expected_areas(&session.template)
            .iter()
            .map(|area| canonical_area(area))
            .collect();

        if expected.is_empty() {
            return FidelityDetail {
                factor: FidelityFactor::Integrations,
                weight: FACTOR_WEIGHT,
                achieved: FACTOR_WEIGHT,
                explanation: format!("No integrations expected for template '{}'", session.template),
            };
        }

        let configured: HashSet<&str> = session
            .integrations
            .iter()
            .filter(|(_, provider)| !provider.trim().is_empty())
            .map(|(category, _)| canonical_area(category))
            .collect();

        let missing: Vec<&str> = expected
            .iter()
            .copied()
            .filter(|area| !configured.contains(area))
            .collect();
        let matched = expected.len() - missing.len();

        let mut explanation = format!(
            "{} of {} expected areas configured",
            matched,
            expected.len()
        );
        if !missing.is_empty() {
            explanation.push_str(&format!(" (missing: {})", missing.join(", ")));
        }

        FidelityDetail {
            factor: FidelityFactor::Integrations,
            weight: FACTOR_WEIGHT,
            achieved: scaled_floor(matched, expected.len()),
            explanation,
        }
    }

    fn planning(&self, session: &PreviewSession) -> FidelityDetail {
        let vision = has_content(session.vision.as_ref());
        let research = has_content(session.research.as_ref());

        let (achieved, explanation) = match (vision, research) {
            (true, true) => (FACTOR_WEIGHT, "Vision and research provided".to_string()),
            (true, false) => (FACTOR_WEIGHT / 2, "Vision provided, research missing".to_string()),
            (false, true) => (FACTOR_WEIGHT / 2, "Research provided, vision missing".to_string()),
            (false, false) => (0, "No vision or research provided".to_string()),
        };

        FidelityDetail {
            factor: FidelityFactor::Planning,
            weight: FACTOR_WEIGHT,
            achieved,
            explanation,
        }
    }
}

/// Score a session with the default thresholds
pub fn calculate_fidelity_score(session: &PreviewSession) -> u8 {
    FidelityScorer::default().calculate_fidelity_score(session)
}

/// Break down a session's score with the default thresholds
pub fn get_fidelity_details(session: &PreviewSession) -> Vec<FidelityDetail> {
    FidelityScorer::default().get_fidelity_details(session)
}

fn total(details: &[FidelityDetail]) -> u8 {
    let sum: u32 = details
        .iter()
        .map(|detail| u32::from(detail.achieved.min(detail.weight)))
        .sum();
    sum.min(100) as u8
}

/// `FACTOR_WEIGHT * part / whole`, rounded down and capped at the weight
fn scaled_floor(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return FACTOR_WEIGHT;
    }
    let part = part.min(whole);
    (usize::from(FACTOR_WEIGHT) * part / whole) as u8
}

/// `FACTOR_WEIGHT * part / whole`, rounded half up and capped at the weight
fn scaled_round(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return FACTOR_WEIGHT;
    }
    let part = part.min(whole);
    let doubled = 2 * usize::from(FACTOR_WEIGHT) * part + whole;
    (doubled / (2 * whole)).min(usize::from(FACTOR_WEIGHT)) as u8
}

/// Fold common category spellings onto the functional areas templates expect
fn canonical_area(category: &str) -> &str {
    match category.trim().to_ascii_lowercase().as_str() {
        "auth" | "authentication" | "identity" => "auth",
        "data" | "database" | "db" | "storage" => "data",
        "billing" | "payments" | "payment" | "stripe" => "billing",
        _ => category.trim(),
    }
}

fn has_content(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
        Some(serde_json::Value::Array(items)) => !items.is_empty(),
        Some(serde_json::Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}
