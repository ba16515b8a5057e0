use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use sitewire_api_types::RevalidateResponse;

use crate::application::revalidation::RevalidationOutcome;
use crate::infra::webhook::SIGNATURE_HEADER;

use super::{HttpState, error::ApiError};

pub const NO_REVALIDATION_NEEDED: &str = "No revalidation needed for this content type";

/// `POST /api/revalidate`. The body is read raw because the signature covers
/// the exact bytes sent.
pub(super) async fn revalidate(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RevalidateResponse>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = state.revalidation.handle(signature, &body).await?;

    let response = match outcome {
        RevalidationOutcome::NoRule { content_type } => RevalidateResponse::Skipped {
            message: NO_REVALIDATION_NEEDED.to_string(),
            content_type,
        },
        RevalidationOutcome::Revalidated {
            content_type,
            tags,
            timestamp,
        } => RevalidateResponse::Revalidated {
            revalidated: true,
            content_type,
            tags: tags.into_iter().map(|tag| tag.into_string()).collect(),
            timestamp,
        },
    };
    Ok(Json(response))
}
