//! Cache key definitions.

use crate::application::repos::ContentQuery;

/// Identifies one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Post listing for a normalized search/category/ordering triple.
    Posts(ContentQuery),
    /// Category list used by the filter controls.
    Categories,
}
