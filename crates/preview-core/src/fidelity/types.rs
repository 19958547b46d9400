//! Fidelity types and configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Points available per factor
pub const FACTOR_WEIGHT: u8 = 25;

/// Scored aspects of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FidelityFactor {
    Branding,
    Navigation,
    Integrations,
    Planning,
}

impl fmt::Display for FidelityFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FidelityFactor::Branding => "Branding",
            FidelityFactor::Navigation => "Navigation",
            FidelityFactor::Integrations => "Integrations",
            FidelityFactor::Planning => "Planning",
        };
        f.write_str(label)
    }
}

/// One line of the fidelity checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FidelityDetail {
    pub factor: FidelityFactor,
    pub weight: u8,
    pub achieved: u8,
    pub explanation: String,
}

impl FidelityDetail {
    pub fn is_complete(&self) -> bool {
        self.achieved >= self.weight
    }

    /// Checklist line, e.g. `Branding: 17/25 - 4 of 5 colors customized, default font pair`
    pub fn summary_line(&self) -> String {
        format!(
            "{}: {}/{} - {}",
            self.factor, self.achieved, self.weight, self.explanation
        )
    }
}

/// Score together with its breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FidelityReport {
    pub score: u8,
    pub details: Vec<FidelityDetail>,
}

impl FidelityReport {
    pub fn summary_lines(&self) -> Vec<String> {
        self.details.iter().map(FidelityDetail::summary_line).collect()
    }

    /// Factors that still have points to gain
    pub fn missing(&self) -> impl Iterator<Item = &FidelityDetail> {
        self.details.iter().filter(|detail| !detail.is_complete())
    }
}

/// Tunable thresholds for the scorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FidelityConfig {
    /// Page count that earns full navigation credit
    pub navigation_target: usize,
    /// Functional areas every template is expected to integrate
    pub expected_integrations: Vec<String>,
    /// Per-template overrides of `expected_integrations`
    pub template_integrations: HashMap<String, Vec<String>>,
}

impl Default for FidelityConfig {
    fn default() -> Self {
        Self {
            navigation_target: 3,
            expected_integrations: vec![
                "auth".to_string(),
                "data".to_string(),
                "billing".to_string(),
            ],
            template_integrations: HashMap::new(),
        }
    }
}

impl FidelityConfig {
    /// Expected functional areas for `template`
    pub fn expected_areas(&self, template: &str) -> &[String] {
        self.template_integrations
            .get(template)
            .unwrap_or(&self.expected_integrations)
    }
}
