//! Wire types shared by the sitewire server and its clients.

pub mod content;
pub mod filter;
pub mod revalidate;

pub use content::{Category, CategoryRef, ContentSummary, MediaRef};
pub use filter::{CATEGORY_ALL, FilterParams, FilterState, SortOrder};
pub use revalidate::{ErrorBody, RevalidateResponse, SlugField, WebhookPayload};
