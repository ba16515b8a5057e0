//! Client side of the query API.
//!
//! [`FilterSync`] keeps the filter triple in URL query-string form and
//! re-runs the query through a [`QueryClient`] whenever it changes.

mod debounce;
mod http;
mod sync;

use async_trait::async_trait;
use sitewire_api_types::{Category, ContentSummary, FilterState};
use thiserror::Error;

pub use debounce::{DEFAULT_QUIESCENCE, DebouncePolicy, Schedule};
pub use http::HttpQueryClient;
pub use sync::{FilterSync, GENERIC_FAILURE, ResultsView};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {status}: {error}")]
    Server { status: u16, error: String },
    #[error("failed to parse body: {0}")]
    Decode(String),
}

/// Executes the blog query for a filter state.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn fetch_posts(&self, filter: &FilterState) -> Result<Vec<ContentSummary>, ClientError>;

    async fn fetch_categories(&self) -> Result<Vec<Category>, ClientError>;
}
