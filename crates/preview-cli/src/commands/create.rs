//! `create` command

use preview_core::config::PreviewConfig;
use preview_core::service::PreviewService;
use preview_core::session::SessionUpdate;
use std::path::Path;
use tracing::info;

use super::read_request;

/// Create a session, replay navigation, and print the final session JSON
pub async fn execute(
    config: &PreviewConfig,
    request: &Path,
    navigate: &[String],
    auth: Option<&str>,
) -> anyhow::Result<()> {
    let input = read_request(request)?;
    let service = PreviewService::from_config(config)?;

    let mut session = service.create_session(input)?;
    info!(session_id = %session.id, "Created preview session");

    for path in navigate {
        session = service
            .update_session(&session.id, SessionUpdate::navigate(path.as_str()))
            .await?;
    }
    if let Some(auth) = auth {
        session = service
            .update_session(&session.id, SessionUpdate::auth(auth))
            .await?;
    }

    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}
