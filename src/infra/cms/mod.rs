//! Content repository adapters.

mod client;
mod fixtures;
pub mod groq;

use std::sync::Arc;

use tracing::info;

pub use client::SanityRepository;
pub use fixtures::{FixtureData, FixturePost, FixtureRepository};

use crate::application::repos::ContentRepository;
use crate::config::CmsSettings;
use crate::infra::error::InfraError;

/// Build the configured repository: the CMS when a project id is set,
/// otherwise the fixture file.
pub async fn build_repository(
    settings: &CmsSettings,
) -> Result<Arc<dyn ContentRepository>, InfraError> {
    if let Some(project_id) = settings.project_id.as_deref() {
        let repo = SanityRepository::new(settings, project_id)?;
        info!(endpoint = %repo.endpoint(), "using cms content repository");
        return Ok(Arc::new(repo));
    }

    if let Some(path) = settings.fixtures.as_deref() {
        let repo = FixtureRepository::load(path)
            .await
            .map_err(|err| InfraError::configuration(err.to_string()))?;
        info!(
            path = %path.display(),
            posts = repo.post_count(),
            "using fixture content repository"
        );
        return Ok(Arc::new(repo));
    }

    Err(InfraError::configuration(
        "either cms.project_id or cms.fixtures must be set",
    ))
}
