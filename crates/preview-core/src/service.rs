//! Preview service composing the session store with the page cache
//!
//! Page rendering itself lives outside this crate behind [`PageRenderer`].
//! The service decides when a render is needed and keeps both caches in step
//! with the session lifecycle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::{CacheEntry, PreviewCache, keys};
use crate::config::PreviewConfig;
use crate::error::{PreviewError, PreviewResult};
use crate::fidelity::{FidelityReport, FidelityScorer};
use crate::session::{CreateSessionInput, NavPage, PreviewSession, SessionStore, SessionUpdate};
use crate::state::normalize_path;

/// Output of a page render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    pub html: String,
    pub components: Vec<String>,
}

impl RenderedPage {
    pub fn new(html: impl Into<String>, components: Vec<String>) -> Self {
        Self {
            html: html.into(),
            components,
        }
    }
}

/// Produces markup for one page of a session
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, session: &PreviewSession, page: &NavPage) -> PreviewResult<RenderedPage>;
}

/// Entry point for hosts of the preview subsystem
#[derive(Debug, Clone)]
pub struct PreviewService {
    sessions: Arc<SessionStore>,
    cache: Arc<PreviewCache>,
}

impl PreviewService {
    pub fn new(sessions: Arc<SessionStore>, cache: Arc<PreviewCache>) -> Self {
        Self { sessions, cache }
    }

    /// Build the store, scorer and cache described by `config`
    pub fn from_config(config: &PreviewConfig) -> PreviewResult<Self> {
        let scorer = FidelityScorer::new(config.fidelity.clone());
        let sessions = SessionStore::new(config.session.clone(), scorer);
        let cache = PreviewCache::new(config.cache.clone())?;
        Ok(Self::new(Arc::new(sessions), Arc::new(cache)))
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn cache(&self) -> &Arc<PreviewCache> {
        &self.cache
    }

    pub fn create_session(&self, input: CreateSessionInput) -> PreviewResult<PreviewSession> {
        self.sessions.create(input)
    }

    pub fn get_session(&self, id: &str) -> PreviewResult<PreviewSession> {
        self.sessions.get(id)
    }

    /// Apply `update`; a branding or auth change also drops the session's
    /// cached pages
    pub async fn update_session(
        &self,
        id: &str,
        update: SessionUpdate,
    ) -> PreviewResult<PreviewSession> {
        let outcome = self.sessions.update_tracked(id, update)?;
        if outcome.pages_stale {
            self.invalidate_pages(id, &outcome.session).await;
        }
        Ok(outcome.session)
    }

    /// Drop a session and every page cached for it
    pub async fn invalidate_session(&self, id: &str) -> bool {
        if let Ok(session) = self.sessions.get(id) {
            self.invalidate_pages(id, &session).await;
        }

        self.sessions.invalidate(id)
    }

    /// Fidelity checklist for a live session
    pub fn report(&self, id: &str) -> PreviewResult<FidelityReport> {
        let session = self.sessions.get(id)?;
        Ok(self.sessions.scorer().report(&session))
    }

    /// Render `path` for session `id`, serving from cache when possible
    pub async fn render_page<R>(&self, id: &str, path: &str, renderer: &R) -> PreviewResult<CacheEntry>
    where
        R: PageRenderer + ?Sized,
    {
        let session = self.sessions.get(id)?;
        let path = normalize_path(path);
        let page = session
            .navigation
            .pages
            .iter()
            .find(|page| page.path == path)
            .cloned()
            .ok_or_else(|| {
                PreviewError::validation_field(format!("Page is not registered: {}", path), "path")
            })?;

        let key = keys::page(id, &path);
        if let Some(entry) = self.cache.get(&key).await {
            return Ok(entry);
        }

        let rendered = renderer.render(&session, &page).await?;
        debug!(session_id = %id, path = %path, "Rendered preview page");

        let entry = self
            .cache
            .set(&key, CacheEntry::new(rendered.html.clone(), rendered.components))
            .await;
        self.sessions.cache_page(id, &path, rendered.html)?;

        Ok(entry)
    }

    /// Start background sweeps for both the sessions and the cache
    pub fn spawn_cleanup(&self, token: CancellationToken) -> Vec<JoinHandle<()>> {
        vec![
            self.sessions.spawn_cleanup(token.clone()),
            self.cache.spawn_cleanup(token),
        ]
    }

    async fn invalidate_pages(&self, id: &str, session: &PreviewSession) {
        for page in &session.navigation.pages {
            self.cache.invalidate(&keys::page(id, &page.path)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::session::{BrandingInput, ColorPaletteInput, PageInput};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageRenderer for CountingRenderer {
        async fn render(
            &self,
            session: &PreviewSession,
            page: &NavPage,
        ) -> PreviewResult<RenderedPage> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(RenderedPage::new(
                format!(
                    "<h1 style=\"color:{}\">{}</h1><!-- {} -->",
                    session.branding.colors.primary, page.title, call
                ),
                vec!["Navbar".to_string()],
            ))
        }
    }

    /// Markup varies with the simulated auth mode
    struct AuthAwareRenderer;

    #[async_trait]
    impl PageRenderer for AuthAwareRenderer {
        async fn render(&self, session: &PreviewSession, page: &NavPage) -> PreviewResult<RenderedPage> {
            Ok(RenderedPage::new(
                format!("{}:{}", page.path, session.state_simulation.auth_state),
                Vec::new(),
            ))
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl PageRenderer for FailingRenderer {
        async fn render(&self, _: &PreviewSession, _: &NavPage) -> PreviewResult<RenderedPage> {
            Err(PreviewError::render("template missing"))
        }
    }

    fn service() -> PreviewService {
        PreviewService::new(
            Arc::new(SessionStore::default()),
            Arc::new(PreviewCache::memory_only(CacheConfig::default())),
        )
    }

    fn input() -> CreateSessionInput {
        CreateSessionInput::new("proj-1", "saas", "Acme").with_pages(vec![
            PageInput::new("/"),
            PageInput::new("/pricing"),
        ])
    }

    #[tokio::test]
    async fn test_render_page_caches_result() {
        let service = service();
        let renderer = CountingRenderer::default();
        let session = service.create_session(input()).unwrap();

        let first = service.render_page(&session.id, "/pricing", &renderer).await.unwrap();
        let second = service.render_page(&session.id, "pricing/", &renderer).await.unwrap();

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(first.html.contains("Pricing"));

        let page = service.sessions().cached_page(&session.id, "/pricing").unwrap();
        assert_eq!(page.unwrap().html, first.html);
    }

    #[tokio::test]
    async fn test_render_unknown_page_is_validation_error() {
        let service = service();
        let session = service.create_session(input()).unwrap();

        let err = service
            .render_page(&session.id, "/missing", &CountingRenderer::default())
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("path"));
    }

    #[tokio::test]
    async fn test_render_unknown_session_is_not_found() {
        let err = service()
            .render_page("nope", "/", &CountingRenderer::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_renderer_failure_is_propagated_and_not_cached() {
        let service = service();
        let session = service.create_session(input()).unwrap();

        let err = service.render_page(&session.id, "/", &FailingRenderer).await.unwrap_err();
        assert_eq!(err.error_code(), "PREVIEW_RENDER");
        assert_eq!(service.cache().statistics().entry_count, 0);
    }

    #[tokio::test]
    async fn test_branding_change_forces_rerender() {
        let service = service();
        let renderer = CountingRenderer::default();
        let session = service.create_session(input()).unwrap();
        service.render_page(&session.id, "/", &renderer).await.unwrap();

        let update = SessionUpdate::default().with_branding(BrandingInput {
            colors: Some(ColorPaletteInput {
                primary: Some("#ff0000".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        service.update_session(&session.id, update).await.unwrap();

        let entry = service.render_page(&session.id, "/", &renderer).await.unwrap();
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        assert!(entry.html.contains("#ff0000"));
    }

    #[tokio::test]
    async fn test_auth_change_forces_rerender() {
        let service = service();
        let session = service.create_session(input()).unwrap();

        let guest = service.render_page(&session.id, "/", &AuthAwareRenderer).await.unwrap();
        assert_eq!(guest.html, "/:logged-out");

        service
            .update_session(&session.id, SessionUpdate::auth("admin"))
            .await
            .unwrap();

        let admin = service.render_page(&session.id, "/", &AuthAwareRenderer).await.unwrap();
        assert_eq!(admin.html, "/:admin");
        let page = service.sessions().cached_page(&session.id, "/").unwrap();
        assert_eq!(page.unwrap().html, "/:admin");
    }

    #[tokio::test]
    async fn test_navigation_update_keeps_cached_pages() {
        let service = service();
        let renderer = CountingRenderer::default();
        let session = service.create_session(input()).unwrap();
        service.render_page(&session.id, "/", &renderer).await.unwrap();

        service
            .update_session(&session.id, SessionUpdate::navigate("/pricing"))
            .await
            .unwrap();
        service.render_page(&session.id, "/", &renderer).await.unwrap();

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_session_drops_cached_pages() {
        let service = service();
        let renderer = CountingRenderer::default();
        let session = service.create_session(input()).unwrap();
        service.render_page(&session.id, "/", &renderer).await.unwrap();
        service.render_page(&session.id, "/pricing", &renderer).await.unwrap();

        assert!(service.invalidate_session(&session.id).await);
        assert!(!service.invalidate_session(&session.id).await);
        assert!(service.get_session(&session.id).unwrap_err().is_not_found());
        assert!(service.cache().get(&keys::page(&session.id, "/")).await.is_none());
        assert!(service.cache().get(&keys::page(&session.id, "/pricing")).await.is_none());
    }

    #[tokio::test]
    async fn test_report_matches_session_score() {
        let service = service();
        let session = service.create_session(input()).unwrap();

        let report = service.report(&session.id).unwrap();
        assert_eq!(report.score, session.fidelity_score);
        assert_eq!(report.details, session.fidelity_details);
    }

    #[tokio::test]
    async fn test_from_config_defaults_to_memory_only() {
        let service = PreviewService::from_config(&PreviewConfig::default()).unwrap();
        assert!(!service.cache().is_distributed());
        assert!(service.sessions().is_empty());
    }
}
