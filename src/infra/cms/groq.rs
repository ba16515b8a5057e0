//! GROQ documents sent to the content repository.
//!
//! The post query comes in two fixed variants, one per ordering, sharing the
//! same filter and projection. `$search` and `$category` are always bound
//! (to `null` when unused), so the document text never depends on input.

use crate::application::repos::{ContentQuery, PostOrdering};

macro_rules! posts_query {
    ($direction:literal) => {
        concat!(
            r#"*[_type == "post" && defined(slug.current) && defined(publishedAt)"#,
            r#" && ($search == null || title match ($search + "*") || pt::text(body) match ($search + "*"))"#,
            r#" && ($category == null || category._ref == $category)]"#,
            " | order(publishedAt ",
            $direction,
            ")",
            r#" { "id": _id, title, "slug": slug.current, publishedAt, "updatedAt": _updatedAt,"#,
            r#" "category": category->{ "id": _id, title, "slug": slug.current }, excerpt,"#,
            r#" "featuredMedia": mainImage{ "assetRef": asset._ref, alt } }"#,
        )
    };
}

pub const POSTS_NEWEST_FIRST: &str = posts_query!("desc");
pub const POSTS_OLDEST_FIRST: &str = posts_query!("asc");

pub const CATEGORIES: &str =
    r#"*[_type == "postCategory"] | order(title asc) { "id": _id, title, "slug": slug.current }"#;

pub fn posts_document(ordering: PostOrdering) -> &'static str {
    match ordering {
        PostOrdering::NewestFirst => POSTS_NEWEST_FIRST,
        PostOrdering::OldestFirst => POSTS_OLDEST_FIRST,
    }
}

/// Query parameters as the HTTP API expects them: `$name` keys with
/// JSON-encoded values.
pub fn posts_params(query: &ContentQuery) -> [(&'static str, String); 2] {
    [
        ("$search", json_param(query.search.as_deref())),
        ("$category", json_param(query.category.as_deref())),
    ]
}

fn json_param(value: Option<&str>) -> String {
    match value {
        Some(value) => serde_json::Value::String(value.to_string()).to_string(),
        None => serde_json::Value::Null.to_string(),
    }
}
