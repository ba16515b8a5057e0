//! Repository and cache-store traits describing the external collaborators.

use async_trait::async_trait;
use sitewire_api_types::{Category, ContentSummary, FilterState, SortOrder};
use thiserror::Error;

use crate::domain::tags::CacheTag;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("content repository unreachable: {0}")]
    Unavailable(String),
    #[error("content repository responded with status {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("failed to decode content repository response: {0}")]
    Decode(String),
    #[error("fixture error: {0}")]
    Fixture(String),
}

impl RepoError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Ordering pushed down to the repository. Chosen before execution; results
/// are never re-sorted in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostOrdering {
    NewestFirst,
    OldestFirst,
}

impl From<SortOrder> for PostOrdering {
    fn from(sort: SortOrder) -> Self {
        match sort {
            SortOrder::Asc => PostOrdering::OldestFirst,
            SortOrder::Desc => PostOrdering::NewestFirst,
        }
    }
}

/// Normalized post query: blank search and the `all` category collapse to
/// `None`, so equivalent filters share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub ordering: PostOrdering,
}

impl ContentQuery {
    pub fn from_filter(filter: &FilterState) -> Self {
        Self {
            search: filter.search_term().map(str::to_string),
            category: filter.category_filter().map(str::to_string),
            ordering: filter.sort.into(),
        }
    }
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self::from_filter(&FilterState::default())
    }
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Posts matching the query, ordered as requested by the repository itself.
    async fn query_posts(&self, query: &ContentQuery) -> Result<Vec<ContentSummary>, RepoError>;

    /// Post categories ordered by title.
    async fn list_categories(&self) -> Result<Vec<Category>, RepoError>;
}

#[derive(Debug, Error)]
pub enum InvalidationError {
    #[error("cache store rejected invalidation of `{tag}`: {message}")]
    Store { tag: String, message: String },
}

/// Tag-based cache store owned by the serving runtime.
///
/// Invalidation expires entries immediately and must be idempotent.
#[async_trait]
pub trait TagInvalidator: Send + Sync {
    /// Drop every entry carrying `tag`, returning how many were removed.
    async fn invalidate_tag(&self, tag: &CacheTag) -> Result<usize, InvalidationError>;
}
