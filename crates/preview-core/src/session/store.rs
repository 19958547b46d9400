//! Session store owning the live preview sessions
//!
//! The store is the single authority for session existence. Sessions live in
//! a sharded concurrent map, so unrelated sessions never contend on one lock,
//! and every mutation of a session happens under that session's entry guard.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{
    Branding, CreateSessionInput, NavPage, NavigationState, PreviewSession, SessionId,
    SessionPage, SessionSummary, SessionUpdate, non_empty,
};
use crate::error::{PreviewError, PreviewResult};
use crate::fidelity::FidelityScorer;
use crate::state::{AuthState, ROOT_PATH, create_default_state_simulation, normalize_path};

/// Session lifecycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime of a session from creation; reads do not extend it
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Sweep expired sessions after every create
    pub cleanup_on_create: bool,
    /// Interval for the optional background sweep
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            cleanup_on_create: true,
            cleanup_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Result of [`SessionStore::update_tracked`]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub session: PreviewSession,
    /// Branding or auth mode changed, so rendered pages no longer apply
    pub pages_stale: bool,
}

/// Concurrent store of preview sessions
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<SessionId, PreviewSession>,
    scorer: FidelityScorer,
    config: SessionConfig,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default(), FidelityScorer::default())
    }
}

impl SessionStore {
    pub fn new(config: SessionConfig, scorer: FidelityScorer) -> Self {
        Self {
            sessions: DashMap::new(),
            scorer,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scorer(&self) -> &FidelityScorer {
        &self.scorer
    }

    /// Create and register a new session.
    ///
    /// Nothing is stored unless every required field is present and the page
    /// list is valid.
    pub fn create(&self, input: CreateSessionInput) -> PreviewResult<PreviewSession> {
        let (project_id, template, project_name) = validate_required(&input)?;

        let pages = build_pages(&input)?;
        let start_path = if pages.iter().any(|page| page.path == ROOT_PATH) {
            ROOT_PATH.to_string()
        } else {
            pages[0].path.clone()
        };

        let state = create_default_state_simulation(input.initial_auth_state.as_deref())
            .navigate(&pages, &start_path)?;

        let mut navigation = NavigationState {
            pages,
            current_path: String::new(),
            breadcrumbs: Vec::new(),
        };
        navigation.sync_with(&state);

        let mut branding = Branding::new(project_name);
        if let Some(delta) = &input.branding {
            branding.apply(delta);
        }

        let created_at = Utc::now();
        let mut session = PreviewSession {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            template: template.to_string(),
            created_at,
            expires_at: expiry_after(created_at, self.config.ttl),
            branding,
            integrations: input.integrations.clone().unwrap_or_default(),
            research: input.research.clone(),
            vision: input.vision.clone(),
            navigation,
            state_simulation: state,
            page_cache: Default::default(),
            fidelity_score: 0,
            fidelity_details: Vec::new(),
        };
        self.rescore(&mut session);

        self.sessions.insert(session.id.clone(), session.clone());
        info!(
            session_id = %session.id,
            project_id = %session.project_id,
            fidelity = session.fidelity_score,
            "Created preview session"
        );

        if self.config.cleanup_on_create {
            self.cleanup_expired();
        }

        Ok(session)
    }

    /// Fetch a live session.
    ///
    /// An expired entry is reported as not found even if no sweep has run yet.
    pub fn get(&self, id: &str) -> PreviewResult<PreviewSession> {
        let now = Utc::now();
        {
            let entry = self
                .sessions
                .get(id)
                .ok_or_else(|| PreviewError::session_not_found(id))?;
            if !entry.is_expired_at(now) {
                return Ok(entry.value().clone());
            }
        }

        self.evict_expired(id, now);
        Err(PreviewError::session_not_found(id))
    }

    /// Apply a partial update atomically.
    ///
    /// The update is computed on a copy; the stored session is replaced only
    /// if every part of it is valid.
    pub fn update(&self, id: &str, update: SessionUpdate) -> PreviewResult<PreviewSession> {
        self.update_tracked(id, update).map(|outcome| outcome.session)
    }

    /// Like [`SessionStore::update`], also reporting whether previously
    /// rendered pages went stale. Both are decided under the entry guard.
    pub fn update_tracked(&self, id: &str, update: SessionUpdate) -> PreviewResult<UpdateOutcome> {
        let now = Utc::now();
        {
            let mut entry = self
                .sessions
                .get_mut(id)
                .ok_or_else(|| PreviewError::session_not_found(id))?;

            if !entry.is_expired_at(now) {
                let next = self.apply_update(&entry, &update)?;
                let pages_stale = renders_differently(&entry, &next);
                *entry = next.clone();
                debug!(
                    session_id = %id,
                    current_path = %next.navigation.current_path,
                    auth_state = %next.state_simulation.auth_state,
                    fidelity = next.fidelity_score,
                    pages_stale,
                    "Updated preview session"
                );
                return Ok(UpdateOutcome {
                    session: next,
                    pages_stale,
                });
            }
        }

        self.evict_expired(id, now);
        Err(PreviewError::session_not_found(id))
    }

    /// Drop a session explicitly. Returns whether it existed.
    pub fn invalidate(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!(session_id = %id, "Invalidated preview session");
        }
        removed
    }

    /// Remove every session whose expiry has passed; returns how many went
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let keep = !session.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            info!(removed, "Cleaned up expired preview sessions");
        }
        removed
    }

    /// Summaries of live sessions, soonest-expiring first
    pub fn list_active(&self) -> Vec<SessionSummary> {
        let now = Utc::now();
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.summary())
            .collect();
        summaries.sort_by(|a, b| a.expires_at.cmp(&b.expires_at));
        summaries
    }

    /// Number of stored sessions, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remember rendered markup for one of the session's pages
    pub fn cache_page(&self, id: &str, path: &str, html: impl Into<String>) -> PreviewResult<()> {
        let now = Utc::now();
        let path = normalize_path(path);
        {
            let mut entry = self
                .sessions
                .get_mut(id)
                .ok_or_else(|| PreviewError::session_not_found(id))?;

            if !entry.is_expired_at(now) {
                if !entry.navigation.contains(&path) {
                    return Err(PreviewError::validation_field(
                        format!("Page is not registered: {}", path),
                        "path",
                    ));
                }
                entry.page_cache.insert(
                    path,
                    SessionPage {
                        html: html.into(),
                        cached_at: now,
                    },
                );
                return Ok(());
            }
        }

        self.evict_expired(id, now);
        Err(PreviewError::session_not_found(id))
    }

    /// Previously cached markup for one of the session's pages
    pub fn cached_page(&self, id: &str, path: &str) -> PreviewResult<Option<SessionPage>> {
        let session = self.get(id)?;
        Ok(session.page_cache.get(&normalize_path(path)).cloned())
    }

    /// Sweep expired sessions on a fixed interval until `token` is cancelled
    pub fn spawn_cleanup(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let period = self.config.cleanup_interval.max(Duration::from_millis(10));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Session cleanup task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        store.cleanup_expired();
                    }
                }
            }
        })
    }

    fn apply_update(
        &self,
        current: &PreviewSession,
        update: &SessionUpdate,
    ) -> PreviewResult<PreviewSession> {
        let mut session = current.clone();

        for input in &update.add_pages {
            let page = NavPage::from_input(input);
            if session.navigation.contains(&page.path) {
                return Err(PreviewError::validation_field(
                    format!("Duplicate page path: {}", page.path),
                    "addPages",
                ));
            }
            session.navigation.pages.push(page);
        }

        let auth_state = update
            .auth_state
            .as_deref()
            .map(str::parse::<AuthState>)
            .transpose()?;

        for (category, provider) in &update.integrations {
            match non_empty(provider.as_deref()) {
                Some(provider) => {
                    session
                        .integrations
                        .insert(category.clone(), provider.to_string());
                }
                None => {
                    session.integrations.remove(category);
                }
            }
        }

        if let Some(delta) = &update.branding {
            session.branding.apply(delta);
        }

        if let Some(research) = &update.research {
            session.research = Some(research.clone());
        }
        if let Some(vision) = &update.vision {
            session.vision = Some(vision.clone());
        }

        let target = update
            .current_path
            .as_deref()
            .unwrap_or(session.state_simulation.current_path.as_str())
            .to_string();
        let mut state = session
            .state_simulation
            .navigate(&session.navigation.pages, &target)?;
        if let Some(auth_state) = auth_state {
            state = state.with_auth_state(auth_state);
        }

        session.navigation.sync_with(&state);
        session.state_simulation = state;
        if renders_differently(current, &session) {
            // Cached markup was rendered with the old branding or auth mode
            session.page_cache.clear();
        }
        self.rescore(&mut session);

        Ok(session)
    }

    fn rescore(&self, session: &mut PreviewSession) {
        let report = self.scorer.report(session);
        session.fidelity_score = report.score;
        session.fidelity_details = report.details;
    }

    fn evict_expired(&self, id: &str, now: DateTime<Utc>) {
        if self
            .sessions
            .remove_if(id, |_, session| session.is_expired_at(now))
            .is_some()
        {
            debug!(session_id = %id, "Evicted expired preview session on access");
        }
    }
}

fn validate_required(input: &CreateSessionInput) -> PreviewResult<(&str, &str, &str)> {
    let project_id = non_empty(input.project_id.as_deref());
    let template = non_empty(input.template.as_deref());
    let project_name = non_empty(input.project_name.as_deref());

    match (project_id, template, project_name) {
        (Some(project_id), Some(template), Some(project_name)) => {
            Ok((project_id, template, project_name))
        }
        _ => {
            let missing: Vec<&str> = [
                ("projectId", project_id.is_none()),
                ("template", template.is_none()),
                ("projectName", project_name.is_none()),
            ]
            .into_iter()
            .filter(|(_, missing)| *missing)
            .map(|(field, _)| field)
            .collect();

            Err(PreviewError::validation_field(
                format!("Missing required fields: {}", missing.join(", ")),
                missing[0],
            ))
        }
    }
}

fn build_pages(input: &CreateSessionInput) -> PreviewResult<Vec<NavPage>> {
    let pages: Vec<NavPage> = match input.pages.as_deref() {
        Some(inputs) if !inputs.is_empty() => inputs.iter().map(NavPage::from_input).collect(),
        _ => vec![NavPage::new(ROOT_PATH, "Home")],
    };

    let mut seen = HashSet::new();
    for page in &pages {
        if !seen.insert(page.path.as_str()) {
            return Err(PreviewError::validation_field(
                format!("Duplicate page path: {}", page.path),
                "pages",
            ));
        }
    }

    Ok(pages)
}

/// Branding and auth mode are the session inputs page markup depends on
fn renders_differently(before: &PreviewSession, after: &PreviewSession) -> bool {
    before.branding != after.branding
        || before.state_simulation.auth_state != after.state_simulation.auth_state
}

/// `start + ttl`, saturating at the latest representable instant
fn expiry_after(start: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| start.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
