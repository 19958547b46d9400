//! Simulated application state for preview sessions
//!
//! A preview has no backend, so "who is logged in" and "which page is open"
//! are plain values. Every function here is value-in/value-out: transitions
//! return a new [`StateSimulation`] and never touch shared state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PreviewError, PreviewResult};
use crate::session::types::NavPage;

/// Root path every preview falls back to
pub const ROOT_PATH: &str = "/";

/// Simulated authentication mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum AuthState {
    /// Anonymous visitor
    #[default]
    LoggedOut,
    /// Regular signed-in user
    LoggedIn,
    /// Signed-in user on a trial plan
    Trial,
    /// Administrator
    Admin,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::LoggedOut => "logged-out",
            AuthState::LoggedIn => "logged-in",
            AuthState::Trial => "trial",
            AuthState::Admin => "admin",
        }
    }

    /// Whether pages should render the authenticated variant
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthState::LoggedOut)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthState {
    type Err = PreviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "logged-out" | "loggedout" | "anonymous" => Ok(AuthState::LoggedOut),
            "logged-in" | "loggedin" | "user" => Ok(AuthState::LoggedIn),
            "trial" => Ok(AuthState::Trial),
            "admin" => Ok(AuthState::Admin),
            other => Err(PreviewError::validation_field(
                format!("Unknown auth state: {}", other),
                "authState",
            )),
        }
    }
}

/// One step of the breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub path: String,
}

impl Breadcrumb {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// Where the simulated visitor currently is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSimulation {
    pub auth_state: AuthState,
    pub current_path: String,
    /// Derived from `current_path`, never set directly
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// Build the initial state for a new preview.
///
/// Unrecognized or missing auth states fall back to `logged-out`.
pub fn create_default_state_simulation(initial_auth_state: Option<&str>) -> StateSimulation {
    let auth_state = initial_auth_state
        .and_then(|raw| raw.parse::<AuthState>().ok())
        .unwrap_or_default();

    StateSimulation {
        auth_state,
        current_path: ROOT_PATH.to_string(),
        breadcrumbs: vec![Breadcrumb::new("Home", ROOT_PATH)],
    }
}

impl StateSimulation {
    /// Move to `path`, which must already be registered in `pages`.
    pub fn navigate(&self, pages: &[NavPage], path: &str) -> PreviewResult<StateSimulation> {
        let path = normalize_path(path);
        if !pages.iter().any(|page| page.path == path) {
            return Err(PreviewError::validation_field(
                format!("Unknown navigation target: {}", path),
                "currentPath",
            ));
        }

        Ok(StateSimulation {
            auth_state: self.auth_state,
            breadcrumbs: build_breadcrumbs(pages, &path),
            current_path: path,
        })
    }

    /// Switch the simulated auth mode, keeping the current location
    pub fn with_auth_state(&self, auth_state: AuthState) -> StateSimulation {
        StateSimulation {
            auth_state,
            ..self.clone()
        }
    }
}

/// Derive the breadcrumb trail for `path`.
///
/// Hierarchical paths walk their ancestry from Home
/// (`/dashboard/settings` -> Home > Dashboard > Settings). Flat paths and the
/// root produce a single crumb. Registered page titles win over labels derived
/// from path segments.
pub fn build_breadcrumbs(pages: &[NavPage], path: &str) -> Vec<Breadcrumb> {
    let path = normalize_path(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let label_for = |crumb_path: &str, segment: &str| -> String {
        pages
            .iter()
            .find(|page| page.path == crumb_path && !page.title.trim().is_empty())
            .map(|page| page.title.clone())
            .unwrap_or_else(|| title_from_segment(segment))
    };

    if segments.len() <= 1 {
        let segment = segments.first().copied().unwrap_or("");
        return vec![Breadcrumb::new(label_for(&path, segment), path.clone())];
    }

    let mut crumbs = vec![Breadcrumb::new(label_for(ROOT_PATH, ""), ROOT_PATH)];
    let mut prefix = String::new();
    for segment in segments {
        prefix.push('/');
        prefix.push_str(segment);
        crumbs.push(Breadcrumb::new(label_for(&prefix, segment), prefix.clone()));
    }
    crumbs
}

/// Normalize a page path: leading slash, no trailing slash except for root
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        ROOT_PATH.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Human label for a path segment (`billing-history` -> `Billing History`)
pub fn title_from_segment(segment: &str) -> String {
    if segment.is_empty() {
        return "Home".to_string();
    }

    segment
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(paths: &[&str]) -> Vec<NavPage> {
        paths
            .iter()
            .map(|path| NavPage::new(*path, title_from_segment(path.rsplit('/').next().unwrap_or(""))))
            .collect()
    }

    #[test]
    fn test_default_state_is_logged_out() {
        let state = create_default_state_simulation(None);
        assert_eq!(state.auth_state, AuthState::LoggedOut);
        assert_eq!(state.current_path, "/");
        assert_eq!(state.breadcrumbs, vec![Breadcrumb::new("Home", "/")]);
    }

    #[test]
    fn test_default_state_honours_known_auth_state() {
        assert_eq!(
            create_default_state_simulation(Some("admin")).auth_state,
            AuthState::Admin
        );
        assert_eq!(
            create_default_state_simulation(Some("logged_in")).auth_state,
            AuthState::LoggedIn
        );
        assert_eq!(
            create_default_state_simulation(Some("superuser")).auth_state,
            AuthState::LoggedOut
        );
    }

    #[test]
    fn test_navigate_rejects_unknown_path() {
        let state = create_default_state_simulation(None);
        let err = state.navigate(&pages(&["/", "/pricing"]), "/missing").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("currentPath"));
    }

    #[test]
    fn test_navigate_hierarchical_breadcrumbs() {
        let pages = pages(&["/", "/dashboard", "/dashboard/settings"]);
        let state = create_default_state_simulation(Some("logged-in"))
            .navigate(&pages, "/dashboard/settings/")
            .unwrap();

        assert_eq!(state.current_path, "/dashboard/settings");
        assert_eq!(state.auth_state, AuthState::LoggedIn);
        let labels: Vec<_> = state.breadcrumbs.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Home", "Dashboard", "Settings"]);
        assert_eq!(state.breadcrumbs[1].path, "/dashboard");
    }

    #[test]
    fn test_flat_path_single_breadcrumb() {
        let crumbs = build_breadcrumbs(&pages(&["/", "/pricing"]), "/pricing");
        assert_eq!(crumbs, vec![Breadcrumb::new("Pricing", "/pricing")]);
    }

    #[test]
    fn test_breadcrumbs_prefer_registered_titles() {
        let pages = vec![
            NavPage::new("/", "Start"),
            NavPage::new("/account/billing-history", "Invoices"),
        ];
        let crumbs = build_breadcrumbs(&pages, "/account/billing-history");
        let labels: Vec<_> = crumbs.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Start", "Account", "Invoices"]);
    }

    #[test]
    fn test_with_auth_state_keeps_location() {
        let state = create_default_state_simulation(None)
            .navigate(&pages(&["/", "/pricing"]), "/pricing")
            .unwrap()
            .with_auth_state(AuthState::Trial);
        assert_eq!(state.current_path, "/pricing");
        assert_eq!(state.auth_state, AuthState::Trial);
        assert!(state.auth_state.is_authenticated());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("pricing/"), "/pricing");
        assert_eq!(title_from_segment("billing-history"), "Billing History");
    }

    #[test]
    fn test_auth_state_serde() {
        let json = serde_json::to_string(&AuthState::LoggedIn).unwrap();
        assert_eq!(json, "\"logged-in\"");
        let parsed: AuthState = serde_json::from_str("\"trial\"").unwrap();
        assert_eq!(parsed, AuthState::Trial);
    }
}
