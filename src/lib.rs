//! sitewire: content gateway for a CMS-backed company site.
//!
//! Two request paths carry the logic:
//!
//! - **Revalidation**: the CMS posts a signed change notification, which is
//!   mapped through a static content-type table to cache tags that are
//!   dropped immediately.
//! - **Content query**: blog listings filtered by search term and category,
//!   ordered by publication date, cached per query under tags that the
//!   revalidation path can expire.
//!
//! The [`client`] module keeps the filter triple in URL form for consumers of
//! the query API.

pub mod application;
pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod infra;
