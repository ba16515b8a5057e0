//! Cache configuration.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_QUERY_LIMIT: usize = 256;

/// Query cache configuration from the `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve repeated queries from memory.
    pub enabled: bool,
    /// Maximum cached query results before LRU eviction.
    pub query_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            query_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            query_limit: settings.query_limit,
        }
    }
}

impl CacheConfig {
    /// Returns the query limit as NonZeroUsize, clamping to 1 if zero.
    pub fn query_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.query_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.query_limit, 256);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            query_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.query_limit_non_zero().get(), 1);
    }
}
