//! Blog query service: filter state in, ordered summaries out.

use std::sync::Arc;

use sitewire_api_types::{Category, ContentSummary, FilterState};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::application::repos::{ContentQuery, ContentRepository, RepoError};
use crate::cache::{CachedEntry, Epoch, QueryCache, QueryKey};
use crate::domain::tags::CacheTag;

/// Tags every post listing is cached under.
pub const POSTS_TAGS: [&str; 2] = ["posts", "postCategory"];
/// Tags the category list is cached under.
pub const CATEGORIES_TAGS: [&str; 1] = ["postCategory"];

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct ContentQueryService {
    repo: Arc<dyn ContentRepository>,
    cache: Option<Arc<QueryCache>>,
}

impl ContentQueryService {
    pub fn new(repo: Arc<dyn ContentRepository>, cache: Option<Arc<QueryCache>>) -> Self {
        Self { repo, cache }
    }

    /// Run the post query for `filter`.
    ///
    /// The ordering variant is chosen before the repository is called. An
    /// empty result is a valid outcome.
    #[instrument(
        skip_all,
        fields(search = %filter.search, category = %filter.category, sort = %filter.sort)
    )]
    pub async fn query(
        &self,
        filter: &FilterState,
    ) -> Result<Arc<Vec<ContentSummary>>, QueryError> {
        let query = ContentQuery::from_filter(filter);
        let key = QueryKey::Posts(query.clone());

        if let Some(CachedEntry::Posts(posts)) = self.cached(&key) {
            debug!(count = posts.len(), "post query served from cache");
            return Ok(posts);
        }

        let epoch = self.cache.as_ref().map(|cache| cache.epoch());
        let posts = Arc::new(self.repo.query_posts(&query).await?);
        self.store(key, CachedEntry::Posts(posts.clone()), &POSTS_TAGS, epoch);
        Ok(posts)
    }

    /// Categories ordered by title, for the category filter control.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, QueryError> {
        let key = QueryKey::Categories;

        if let Some(CachedEntry::Categories(categories)) = self.cached(&key) {
            return Ok(categories);
        }

        let epoch = self.cache.as_ref().map(|cache| cache.epoch());
        let categories = Arc::new(self.repo.list_categories().await?);
        self.store(
            key,
            CachedEntry::Categories(categories.clone()),
            &CATEGORIES_TAGS,
            epoch,
        );
        Ok(categories)
    }

    fn cached(&self, key: &QueryKey) -> Option<CachedEntry> {
        self.cache.as_ref().and_then(|cache| cache.get(key))
    }

    fn store(
        &self,
        key: QueryKey,
        entry: CachedEntry,
        tags: &[&'static str],
        epoch: Option<Epoch>,
    ) {
        let (Some(cache), Some(epoch)) = (self.cache.as_ref(), epoch) else {
            return;
        };
        let tags: Vec<CacheTag> = tags.iter().copied().map(CacheTag::from_static).collect();
        cache.insert(key, entry, &tags, epoch);
    }
}
