//! In-process content repository backed by a JSON fixture file.
//!
//! Used for local development without CMS credentials and by the test suite.
//! Filtering and ordering mirror the GROQ documents: the title alone or the
//! body alone must contain every search term as a word, with only the last
//! term matched as a prefix. The category matches on the referenced category
//! id.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use sitewire_api_types::{Category, ContentSummary};

use crate::application::repos::{ContentQuery, ContentRepository, PostOrdering, RepoError};
use crate::cache::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::cms::fixtures";

/// One post as stored in the fixture file: the listing projection plus the
/// plain-text body searched by the query.
#[derive(Debug, Clone, Deserialize)]
pub struct FixturePost {
    #[serde(flatten)]
    pub summary: ContentSummary,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureData {
    pub categories: Vec<Category>,
    pub posts: Vec<FixturePost>,
}

#[derive(Debug, Default)]
pub struct FixtureRepository {
    data: RwLock<FixtureData>,
}

impl FixtureRepository {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RepoError> {
        let data: FixtureData =
            serde_json::from_str(json).map_err(|err| RepoError::Fixture(err.to_string()))?;
        Ok(Self::new(data))
    }

    pub async fn load(path: &Path) -> Result<Self, RepoError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| RepoError::Fixture(format!("{}: {err}", path.display())))?;
        Self::from_json(&json)
    }

    /// Insert or replace a post by id, as an editor publishing a change would.
    pub fn upsert_post(&self, post: FixturePost) {
        let mut data = rw_write(&self.data, SOURCE, "upsert_post");
        match data
            .posts
            .iter_mut()
            .find(|existing| existing.summary.id == post.summary.id)
        {
            Some(existing) => *existing = post,
            None => data.posts.push(post),
        }
    }

    pub fn post_count(&self) -> usize {
        rw_read(&self.data, SOURCE, "post_count").posts.len()
    }
}

#[async_trait]
impl ContentRepository for FixtureRepository {
    async fn query_posts(&self, query: &ContentQuery) -> Result<Vec<ContentSummary>, RepoError> {
        let terms: Vec<String> = query
            .search
            .as_deref()
            .map(|search| words(search).map(str::to_lowercase).collect())
            .unwrap_or_default();

        let data = rw_read(&self.data, SOURCE, "query_posts");
        let mut posts: Vec<ContentSummary> = data
            .posts
            .iter()
            .filter(|post| match query.category.as_deref() {
                Some(category) => post.summary.category_id() == Some(category),
                None => true,
            })
            .filter(|post| {
                terms.is_empty()
                    || matches_text(&post.summary.title, &terms)
                    || matches_text(&post.body, &terms)
            })
            .map(|post| post.summary.clone())
            .collect();

        posts.sort_by(|a, b| compare(a, b, query.ordering));
        Ok(posts)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let mut categories = rw_read(&self.data, SOURCE, "list_categories")
            .categories
            .clone();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

/// `text match ($search + "*")`: earlier terms are whole words, the last one
/// is a prefix.
fn matches_text(text: &str, terms: &[String]) -> bool {
    let tokens: Vec<String> = words(text).map(str::to_lowercase).collect();
    let Some((last, rest)) = terms.split_last() else {
        return true;
    };
    rest.iter().all(|term| tokens.contains(term))
        && tokens.iter().any(|token| token.starts_with(last.as_str()))
}

fn compare(a: &ContentSummary, b: &ContentSummary, ordering: PostOrdering) -> Ordering {
    let by_date = a.published_at.cmp(&b.published_at).then_with(|| a.id.cmp(&b.id));
    match ordering {
        PostOrdering::OldestFirst => by_date,
        PostOrdering::NewestFirst => by_date.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use sitewire_api_types::{FilterState, SortOrder};

    use super::*;

    const FIXTURE: &str = r#"{
        "categories": [
            { "id": "cat-ops", "title": "Operations", "slug": "operations" },
            { "id": "cat-eng", "title": "Engineering", "slug": "engineering" }
        ],
        "posts": [
            {
                "id": "p1",
                "title": "Wind farm commissioning",
                "slug": "wind-farm-commissioning",
                "publishedAt": "2024-01-10T09:00:00Z",
                "updatedAt": "2024-01-10T09:00:00Z",
                "category": { "id": "cat-eng", "title": "Engineering" },
                "body": "Notes from the first turbine energisation."
            },
            {
                "id": "p2",
                "title": "Maintenance windows",
                "slug": "maintenance-windows",
                "publishedAt": "2024-02-10T09:00:00Z",
                "updatedAt": "2024-02-10T09:00:00Z",
                "category": { "id": "cat-ops", "title": "Operations" },
                "body": "Scheduling crews around weather."
            }
        ]
    }"#;

    fn query(filter: FilterState) -> ContentQuery {
        ContentQuery::from_filter(&filter)
    }

    fn ids(posts: &[ContentSummary]) -> Vec<&str> {
        posts.iter().map(|post| post.id.as_str()).collect()
    }

    #[tokio::test]
    async fn search_prefix_matches_only_the_last_term() {
        let repo = FixtureRepository::from_json(FIXTURE).expect("fixture");

        let posts = repo
            .query_posts(&query(FilterState::default().with_search("WIND")))
            .await
            .expect("posts");
        assert_eq!(ids(&posts), vec!["p2", "p1"]);

        let posts = repo
            .query_posts(&query(FilterState::default().with_search("turb")))
            .await
            .expect("posts");
        assert_eq!(ids(&posts), vec!["p1"]);

        let posts = repo
            .query_posts(&query(FilterState::default().with_search("wind far")))
            .await
            .expect("posts");
        assert_eq!(ids(&posts), vec!["p1"]);

        let posts = repo
            .query_posts(&query(FilterState::default().with_search("win farm")))
            .await
            .expect("posts");
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn all_terms_must_match_in_one_field() {
        let repo = FixtureRepository::from_json(FIXTURE).expect("fixture");

        let posts = repo
            .query_posts(&query(FilterState::default().with_search("crews around")))
            .await
            .expect("posts");
        assert_eq!(ids(&posts), vec!["p2"]);

        let posts = repo
            .query_posts(&query(FilterState::default().with_search("maintenance crews")))
            .await
            .expect("posts");
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn ordering_and_category() {
        let repo = FixtureRepository::from_json(FIXTURE).expect("fixture");

        let posts = repo
            .query_posts(&query(FilterState::default().with_sort(SortOrder::Asc)))
            .await
            .expect("posts");
        assert_eq!(ids(&posts), vec!["p1", "p2"]);

        let posts = repo
            .query_posts(&query(FilterState::default().with_category("cat-ops")))
            .await
            .expect("posts");
        assert_eq!(ids(&posts), vec!["p2"]);
    }

    #[tokio::test]
    async fn categories_sorted_by_title() {
        let repo = FixtureRepository::from_json(FIXTURE).expect("fixture");
        let categories = repo.list_categories().await.expect("categories");
        let titles: Vec<_> = categories.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Engineering", "Operations"]);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let repo = FixtureRepository::from_json(FIXTURE).expect("fixture");
        let mut post = repo
            .query_posts(&ContentQuery::default())
            .await
            .expect("posts")
            .into_iter()
            .find(|post| post.id == "p1")
            .expect("p1");
        post.title = "Wind farm energised".to_string();

        repo.upsert_post(FixturePost {
            summary: post,
            body: String::new(),
        });

        assert_eq!(repo.post_count(), 2);
        let posts = repo
            .query_posts(&query(FilterState::default().with_search("energised")))
            .await
            .expect("posts");
        assert_eq!(ids(&posts), vec!["p1"]);
    }

    #[test]
    fn invalid_fixture_is_reported() {
        let err = FixtureRepository::from_json("{ \"posts\": 3 }").expect_err("invalid");
        assert!(matches!(err, RepoError::Fixture(_)));
    }
}
