use axum::{
    Json,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
};
use sitewire_api_types::FilterState;

use super::{HttpState, error::ApiError};

/// `GET /api/blog/posts?search&category&sort`.
///
/// Parameters are read with the same lenient codec the client uses, so an
/// unknown `sort` falls back to newest first instead of failing.
pub(super) async fn list_posts(
    State(state): State<HttpState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let filter = FilterState::from_query_string(query.as_deref().unwrap_or_default());
    let posts = state.content.query(&filter).await.map_err(ApiError::posts)?;
    Ok(Json(posts.as_slice()).into_response())
}

/// `GET /api/blog/categories`.
pub(super) async fn list_categories(State(state): State<HttpState>) -> Result<Response, ApiError> {
    let categories = state
        .content
        .categories()
        .await
        .map_err(ApiError::categories)?;
    Ok(Json(categories.as_slice()).into_response())
}
