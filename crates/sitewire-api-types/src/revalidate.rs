//! Revalidation webhook payload and response bodies.

use serde::{Deserialize, Serialize};

/// Change notification body as posted by the CMS webhook projection
/// `{ _type, _id, slug }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<SlugField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugField {
    #[serde(default)]
    pub current: Option<String>,
}

/// Successful webhook outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RevalidateResponse {
    Revalidated {
        revalidated: bool,
        #[serde(rename = "type")]
        content_type: String,
        tags: Vec<String>,
        timestamp: String,
    },
    Skipped {
        message: String,
        #[serde(rename = "type")]
        content_type: String,
    },
}

/// Flat JSON error body: `{ "error": "...", "message": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
