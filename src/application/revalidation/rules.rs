//! Content type → cache tag table.
//!
//! Document types embedded in several page aggregates (team members on the
//! home and about pages, for instance) list every aggregate they appear in.
//! Types missing from the table need no invalidation.

use crate::domain::{notification::ChangeNotification, tags::CacheTag};

/// Pure mapping from a change notification to the tags it makes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationRule {
    tags: &'static [&'static str],
    slug_prefix: Option<&'static str>,
}

impl InvalidationRule {
    const fn fixed(tags: &'static [&'static str]) -> Self {
        Self {
            tags,
            slug_prefix: None,
        }
    }

    /// Fixed tags plus `<prefix>-<slug>` when the notification carries a slug.
    const fn with_slug(tags: &'static [&'static str], prefix: &'static str) -> Self {
        Self {
            tags,
            slug_prefix: Some(prefix),
        }
    }

    pub fn apply(&self, notification: &ChangeNotification) -> Vec<CacheTag> {
        let mut tags: Vec<CacheTag> = self
            .tags
            .iter()
            .copied()
            .map(CacheTag::from_static)
            .collect();
        if let (Some(prefix), Some(slug)) = (self.slug_prefix, notification.slug()) {
            tags.push(CacheTag::scoped(prefix, slug));
        }
        tags
    }
}

static RULES: &[(&str, InvalidationRule)] = &[
    (
        "post",
        InvalidationRule::with_slug(&["post", "posts", "latestPosts"], "post"),
    ),
    ("postCategory", InvalidationRule::fixed(&["postCategory"])),
    ("homePage", InvalidationRule::fixed(&["home-page-data"])),
    ("generalInfo", InvalidationRule::fixed(&["generalInfo"])),
    (
        "service",
        InvalidationRule::with_slug(&["services", "service"], "service"),
    ),
    (
        "caseStudy",
        InvalidationRule::with_slug(&["caseStudies", "caseStudy"], "caseStudy"),
    ),
    ("aboutPage", InvalidationRule::fixed(&["aboutPage"])),
    ("contactPage", InvalidationRule::fixed(&["contactPage"])),
    ("careersPage", InvalidationRule::fixed(&["careersPage"])),
    ("privacyPolicy", InvalidationRule::fixed(&["privacyPolicy"])),
    ("cookiePolicy", InvalidationRule::fixed(&["cookiePolicy"])),
    ("termsOfUse", InvalidationRule::fixed(&["termsOfUse"])),
    (
        "teamMember",
        InvalidationRule::fixed(&["home-page-data", "aboutPage"]),
    ),
    ("openPosition", InvalidationRule::fixed(&["careersPage"])),
    ("approachSection", InvalidationRule::fixed(&["aboutPage"])),
    ("visionSection", InvalidationRule::fixed(&["aboutPage"])),
];

/// Rule registered for `content_type`, if any. Matching is case-sensitive.
pub fn rule_for(content_type: &str) -> Option<&'static InvalidationRule> {
    RULES
        .iter()
        .find(|(name, _)| *name == content_type)
        .map(|(_, rule)| rule)
}

pub fn mapped_content_types() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|(name, _)| *name)
}
