//! Application services layer.

pub mod error;
pub mod query;
pub mod repos;
pub mod revalidation;
