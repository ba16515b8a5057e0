mod blog;
pub mod error;
mod middleware;
mod revalidate;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::{query::ContentQueryService, revalidation::RevalidationService};

pub use error::{ApiError, messages};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use revalidate::NO_REVALIDATION_NEEDED;

#[derive(Clone)]
pub struct HttpState {
    pub revalidation: Arc<RevalidationService>,
    pub content: Arc<ContentQueryService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/revalidate", post(revalidate::revalidate))
        .route("/api/blog/posts", get(blog::list_posts))
        .route("/api/blog/categories", get(blog::list_categories))
        .route("/_health", get(health))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
