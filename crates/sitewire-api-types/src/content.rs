//! Content projections returned by the query API.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Listing projection of a blog post.
///
/// Snapshots are immutable: a re-run query replaces the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_media: Option<MediaRef>,
}

impl ContentSummary {
    /// Identifier of the referenced category, if any.
    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(|category| category.id.as_str())
    }
}

/// Dereferenced category embedded in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Reference to an image asset held by the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub asset_ref: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Category document used to populate the category filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
}
