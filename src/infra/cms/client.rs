//! HTTP client for the content repository's query API.

use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use reqwest::{Client, Url, header::AUTHORIZATION};
use serde::{Deserialize, de::DeserializeOwned};
use sitewire_api_types::{Category, ContentSummary};
use tracing::{debug, instrument};

use crate::application::repos::{ContentQuery, ContentRepository, RepoError};
use crate::config::CmsSettings;
use crate::infra::error::InfraError;
use crate::infra::telemetry::METRIC_CMS_QUERY_MS;

use super::groq;

const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Deserialize)]
struct QueryEnvelope<T> {
    result: T,
}

/// Repository backed by the CMS query endpoint
/// `{base}/v{api_version}/data/query/{dataset}`.
#[derive(Clone, Debug)]
pub struct SanityRepository {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl SanityRepository {
    pub fn new(settings: &CmsSettings, project_id: &str) -> Result<Self, InfraError> {
        let base = match settings.api_host.as_deref() {
            Some(host) => host.trim_end_matches('/').to_string(),
            None if settings.use_cdn => format!("https://{project_id}.apicdn.sanity.io"),
            None => format!("https://{project_id}.api.sanity.io"),
        };
        let endpoint = Url::parse(&format!(
            "{base}/v{}/data/query/{}",
            settings.api_version, settings.dataset
        ))
        .map_err(|err| InfraError::configuration(format!("invalid cms endpoint: {err}")))?;

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token: settings.token.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("sitewire/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        document: &str,
        params: &[(&str, String)],
    ) -> Result<T, RepoError> {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", document);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        let mut request = self.client.get(url);
        if let Some(token) = self.token.as_deref() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let started = Instant::now();
        let response = request.send().await.map_err(RepoError::unavailable)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(RepoError::unavailable)?;
        histogram!(METRIC_CMS_QUERY_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            let message: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(RepoError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: QueryEnvelope<T> =
            serde_json::from_slice(&bytes).map_err(RepoError::decode)?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl ContentRepository for SanityRepository {
    #[instrument(skip_all, fields(ordering = ?query.ordering))]
    async fn query_posts(&self, query: &ContentQuery) -> Result<Vec<ContentSummary>, RepoError> {
        let posts: Vec<ContentSummary> = self
            .fetch(groq::posts_document(query.ordering), &groq::posts_params(query))
            .await?;
        debug!(count = posts.len(), "posts fetched from cms");
        Ok(posts)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        self.fetch(groq::CATEGORIES, &[]).await
    }
}
