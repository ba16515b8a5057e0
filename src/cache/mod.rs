//! Tag-indexed query cache.
//!
//! Query results are stored in an LRU keyed by the normalized query and
//! registered under one or more [`CacheTag`](crate::domain::tags::CacheTag)s.
//! Invalidating a tag drops every entry registered under it immediately; the
//! next read misses and repopulates lazily.
//!
//! ```toml
//! [cache]
//! enabled = true
//! query_limit = 256
//! ```

mod config;
mod keys;
pub(crate) mod lock;
mod registry;
mod store;

pub use config::CacheConfig;
pub use keys::QueryKey;
pub use registry::TagRegistry;
pub use store::{CachedEntry, Epoch, QueryCache};
