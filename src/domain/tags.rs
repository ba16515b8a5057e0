//! Cache tags: opaque labels grouping cached query results.

use std::fmt;

use serde::Serialize;

use super::error::DomainError;

/// Identifies one cached artifact group, e.g. every variant of the post listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheTag(String);

impl CacheTag {
    /// Build a tag, rejecting blank labels.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation("cache tag must not be blank"));
        }
        Ok(Self(value))
    }

    /// Tag for a static label from the rule table.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_string())
    }

    /// Slug-scoped tag such as `post-hello-world`.
    pub fn scoped(prefix: &str, slug: &str) -> Self {
        Self(format!("{prefix}-{slug}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tags_are_rejected() {
        assert!(CacheTag::new("  ").is_err());
        assert_eq!(CacheTag::new("posts").expect("tag").as_str(), "posts");
    }

    #[test]
    fn scoped_tag_joins_prefix_and_slug() {
        assert_eq!(
            CacheTag::scoped("caseStudy", "offshore-grid").to_string(),
            "caseStudy-offshore-grid"
        );
    }
}
