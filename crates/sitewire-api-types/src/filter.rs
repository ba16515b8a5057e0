//! Filter state for the blog listing and its URL query-string form.
//!
//! The query string is the canonical representation: only parameters that
//! differ from their defaults are emitted, so the default state maps to an
//! empty string and every URL a viewer can share is minimal.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Sentinel category meaning "no category filter".
pub const CATEGORY_ALL: &str = "all";

pub const PARAM_SEARCH: &str = "search";
pub const PARAM_CATEGORY: &str = "category";
pub const PARAM_SORT: &str = "sort";

/// Ordering over the publication date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Parse a query parameter value. Unknown values yield `None`.
    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (search, category, sort) triple driving the content query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterState {
    pub search: String,
    pub category: String,
    pub sort: SortOrder,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: CATEGORY_ALL.to_string(),
            sort: SortOrder::Desc,
        }
    }
}

impl FilterState {
    pub fn new(search: impl Into<String>, category: impl Into<String>, sort: SortOrder) -> Self {
        Self {
            search: search.into(),
            category: normalize_category(category.into()),
            sort,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = normalize_category(category.into());
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Search term to push down to the repository; blank input means no filter.
    pub fn search_term(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Category to filter on; `all` and blank values mean no filter.
    pub fn category_filter(&self) -> Option<&str> {
        let trimmed = self.category.trim();
        (!trimmed.is_empty() && trimmed != CATEGORY_ALL).then_some(trimmed)
    }

    /// Serialize to a minimal query string (without a leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            serializer.append_pair(PARAM_SEARCH, &self.search);
        }
        if self.category != CATEGORY_ALL {
            serializer.append_pair(PARAM_CATEGORY, &self.category);
        }
        if self.sort != SortOrder::default() {
            serializer.append_pair(PARAM_SORT, self.sort.as_str());
        }
        serializer.finish()
    }

    /// Restore state from a query string. Unknown keys are ignored and
    /// unparseable values fall back to their defaults; the first occurrence
    /// of a repeated key wins.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = FilterParams::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                PARAM_SEARCH => &mut params.search,
                PARAM_CATEGORY => &mut params.category,
                PARAM_SORT => &mut params.sort,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params.into()
    }
}

fn normalize_category(category: String) -> String {
    if category.is_empty() {
        CATEGORY_ALL.to_string()
    } else {
        category
    }
}

/// Raw query parameters as received by the query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

impl From<FilterParams> for FilterState {
    fn from(params: FilterParams) -> Self {
        let sort = params
            .sort
            .as_deref()
            .and_then(SortOrder::from_param)
            .unwrap_or_default();
        FilterState::new(
            params.search.unwrap_or_default(),
            params.category.unwrap_or_default(),
            sort,
        )
    }
}
