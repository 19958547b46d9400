//! Preview session data structures
//!
//! Defines the session record and the request shapes that create and
//! update it:
//! - PreviewSession: the full ephemeral session
//! - Branding / NavigationState: scored context carried by a session
//! - CreateSessionInput / SessionUpdate: caller-facing request payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::fidelity::FidelityDetail;
use crate::state::{Breadcrumb, StateSimulation, normalize_path, title_from_segment};

/// Opaque session identifier
pub type SessionId = String;

/// Default palette applied to any colour slot the caller leaves empty
pub mod default_colors {
    pub const PRIMARY: &str = "#3b82f6";
    pub const SECONDARY: &str = "#64748b";
    pub const ACCENT: &str = "#f59e0b";
    pub const BACKGROUND: &str = "#ffffff";
    pub const FOREGROUND: &str = "#0f172a";
}

/// Default font pair
pub mod default_fonts {
    pub const HEADING: &str = "Inter";
    pub const BODY: &str = "Inter";
}

/// Five-slot colour palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub foreground: String,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            primary: default_colors::PRIMARY.to_string(),
            secondary: default_colors::SECONDARY.to_string(),
            accent: default_colors::ACCENT.to_string(),
            background: default_colors::BACKGROUND.to_string(),
            foreground: default_colors::FOREGROUND.to_string(),
        }
    }
}

impl ColorPalette {
    /// Slots in a fixed order, paired with their defaults
    pub fn slots(&self) -> [(&'static str, &str, &'static str); 5] {
        [
            ("primary", self.primary.as_str(), default_colors::PRIMARY),
            ("secondary", self.secondary.as_str(), default_colors::SECONDARY),
            ("accent", self.accent.as_str(), default_colors::ACCENT),
            ("background", self.background.as_str(), default_colors::BACKGROUND),
            ("foreground", self.foreground.as_str(), default_colors::FOREGROUND),
        ]
    }

    /// Number of slots that differ from the default palette
    pub fn customized_count(&self) -> usize {
        self.slots()
            .iter()
            .filter(|(_, value, default)| !same_token(value, default))
            .count()
    }

    fn apply(&mut self, input: &ColorPaletteInput) {
        let pairs = [
            (&mut self.primary, &input.primary),
            (&mut self.secondary, &input.secondary),
            (&mut self.accent, &input.accent),
            (&mut self.background, &input.background),
            (&mut self.foreground, &input.foreground),
        ];
        for (slot, value) in pairs {
            if let Some(value) = non_empty(value.as_deref()) {
                *slot = value.to_string();
            }
        }
    }
}

/// Heading/body font pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontPair {
    pub heading: String,
    pub body: String,
}

impl Default for FontPair {
    fn default() -> Self {
        Self {
            heading: default_fonts::HEADING.to_string(),
            body: default_fonts::BODY.to_string(),
        }
    }
}

impl FontPair {
    pub fn is_customized(&self) -> bool {
        !same_token(&self.heading, default_fonts::HEADING)
            || !same_token(&self.body, default_fonts::BODY)
    }
}

/// Visual identity of the previewed project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub project_name: String,
    pub colors: ColorPalette,
    pub fonts: FontPair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Branding {
    /// Branding with every slot at its default
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            colors: ColorPalette::default(),
            fonts: FontPair::default(),
            logo: None,
        }
    }

    /// Merge a partial branding payload; empty values keep the current slot
    pub fn apply(&mut self, input: &BrandingInput) {
        if let Some(colors) = &input.colors {
            self.colors.apply(colors);
        }
        if let Some(fonts) = &input.fonts {
            if let Some(heading) = non_empty(fonts.heading.as_deref()) {
                self.fonts.heading = heading.to_string();
            }
            if let Some(body) = non_empty(fonts.body.as_deref()) {
                self.fonts.body = body.to_string();
            }
        }
        if let Some(logo) = non_empty(input.logo.as_deref()) {
            self.logo = Some(logo.to_string());
        }
    }
}

/// A page registered in the preview navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavPage {
    pub path: String,
    pub title: String,
    pub description: String,
    pub is_current_page: bool,
}

impl NavPage {
    pub fn new(path: impl AsRef<str>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            path: normalize_path(path.as_ref()),
            description: default_description(&title),
            title,
            is_current_page: false,
        }
    }

    /// Build a page from caller input, filling title/description defaults
    pub fn from_input(input: &PageInput) -> Self {
        let path = normalize_path(&input.path);
        let title = non_empty(input.title.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| title_from_segment(path.rsplit('/').next().unwrap_or("")));
        let description = non_empty(input.description.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| default_description(&title));

        Self {
            path,
            title,
            description,
            is_current_page: false,
        }
    }
}

fn default_description(title: &str) -> String {
    format!("{} page", title)
}

/// Ordered page list plus the current location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub pages: Vec<NavPage>,
    pub current_path: String,
    pub breadcrumbs: Vec<Breadcrumb>,
}

impl NavigationState {
    pub fn contains(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.pages.iter().any(|page| page.path == path)
    }

    pub fn current_page(&self) -> Option<&NavPage> {
        self.pages.iter().find(|page| page.is_current_page)
    }

    /// Mirror the simulated location onto the page list.
    ///
    /// Leaves exactly one page flagged as current.
    pub fn sync_with(&mut self, state: &StateSimulation) {
        self.current_path = state.current_path.clone();
        self.breadcrumbs = state.breadcrumbs.clone();
        for page in &mut self.pages {
            page.is_current_page = page.path == state.current_path;
        }
    }
}

/// Rendered page stored on the session itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPage {
    pub html: String,
    pub cached_at: DateTime<Utc>,
}

/// An ephemeral preview of a generated project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSession {
    pub id: SessionId,
    pub project_id: String,
    pub template: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub branding: Branding,
    /// Integration category -> provider name, passed through untouched
    pub integrations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision: Option<serde_json::Value>,
    pub navigation: NavigationState,
    pub state_simulation: StateSimulation,
    pub page_cache: HashMap<String, SessionPage>,
    pub fidelity_score: u8,
    pub fidelity_details: Vec<FidelityDetail>,
}

impl PreviewSession {
    /// Check expiry against the current time
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Sessions are live strictly before `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            project_id: self.project_id.clone(),
            project_name: self.branding.project_name.clone(),
            current_path: self.navigation.current_path.clone(),
            fidelity_score: self.fidelity_score,
            expires_at: self.expires_at,
        }
    }
}

/// Lightweight view for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub project_id: String,
    pub project_name: String,
    pub current_path: String,
    pub fidelity_score: u8,
    pub expires_at: DateTime<Utc>,
}

/// Page as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInput {
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PageInput {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial colour palette
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorPaletteInput {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
    pub background: Option<String>,
    pub foreground: Option<String>,
}

/// Partial font pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontPairInput {
    pub heading: Option<String>,
    pub body: Option<String>,
}

/// Partial branding, used both at creation and as an update delta
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingInput {
    pub colors: Option<ColorPaletteInput>,
    pub fonts: Option<FontPairInput>,
    pub logo: Option<String>,
}

impl BrandingInput {
    pub fn is_empty(&self) -> bool {
        self == &BrandingInput::default()
    }
}

/// Request payload for creating a session
///
/// Required fields are optional here so that missing values surface as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSessionInput {
    pub project_id: Option<String>,
    pub template: Option<String>,
    pub project_name: Option<String>,
    pub branding: Option<BrandingInput>,
    pub integrations: Option<BTreeMap<String, String>>,
    pub research: Option<serde_json::Value>,
    pub vision: Option<serde_json::Value>,
    pub pages: Option<Vec<PageInput>>,
    pub initial_auth_state: Option<String>,
}

impl CreateSessionInput {
    pub fn new(
        project_id: impl Into<String>,
        template: impl Into<String>,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            project_id: Some(project_id.into()),
            template: Some(template.into()),
            project_name: Some(project_name.into()),
            ..Default::default()
        }
    }

    pub fn with_pages(mut self, pages: Vec<PageInput>) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_branding(mut self, branding: BrandingInput) -> Self {
        self.branding = Some(branding);
        self
    }

    pub fn with_integration(
        mut self,
        category: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        self.integrations
            .get_or_insert_with(BTreeMap::new)
            .insert(category.into(), provider.into());
        self
    }

    pub fn with_research(mut self, research: serde_json::Value) -> Self {
        self.research = Some(research);
        self
    }

    pub fn with_vision(mut self, vision: serde_json::Value) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_auth_state(mut self, auth_state: impl Into<String>) -> Self {
        self.initial_auth_state = Some(auth_state.into());
        self
    }
}

/// Partial update applied through `SessionStore::update`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionUpdate {
    /// Navigation target; must be registered (possibly by `add_pages`)
    pub current_path: Option<String>,
    pub auth_state: Option<String>,
    /// Pages registered before the navigation target is checked
    pub add_pages: Vec<PageInput>,
    /// Integration deltas; `None` removes the category
    pub integrations: BTreeMap<String, Option<String>>,
    pub branding: Option<BrandingInput>,
    pub research: Option<serde_json::Value>,
    pub vision: Option<serde_json::Value>,
}

impl SessionUpdate {
    pub fn navigate(path: impl Into<String>) -> Self {
        Self {
            current_path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn auth(auth_state: impl Into<String>) -> Self {
        Self {
            auth_state: Some(auth_state.into()),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: PageInput) -> Self {
        self.add_pages.push(page);
        self
    }

    pub fn with_integration(mut self, category: impl Into<String>, provider: Option<String>) -> Self {
        self.integrations.insert(category.into(), provider);
        self
    }

    pub fn with_branding(mut self, branding: BrandingInput) -> Self {
        self.branding = Some(branding);
        self
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn same_token(value: &str, default: &str) -> bool {
    value.trim().eq_ignore_ascii_case(default)
}
