use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sitewire_api_types::ErrorBody;

use crate::application::error::ErrorReport;
use crate::application::query::QueryError;
use crate::application::revalidation::RevalidationError;

pub mod messages {
    pub const SERVER_CONFIGURATION: &str = "Server configuration error";
    pub const INVALID_SIGNATURE: &str = "Invalid signature";
    pub const INVALID_PAYLOAD: &str = "Invalid payload";
    pub const REVALIDATION_FAILED: &str = "Revalidation failed";
    pub const FETCH_POSTS_FAILED: &str = "Failed to fetch blog posts";
    pub const FETCH_CATEGORIES_FAILED: &str = "Failed to fetch categories";
}

/// JSON error response: a fixed public `error` string, an optional public
/// `message`, and a diagnostic report that only reaches the logs.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: Option<String>,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        error: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            error,
            message: None,
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        error: &'static str,
        err: &dyn StdError,
    ) -> Self {
        Self {
            status,
            error,
            message: None,
            report: ErrorReport::from_error(source, status, err),
        }
    }

    /// Expose `message` in the response body alongside `error`.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn posts(err: QueryError) -> Self {
        Self::from_error(
            "infra::http::blog::list_posts",
            StatusCode::INTERNAL_SERVER_ERROR,
            messages::FETCH_POSTS_FAILED,
            &err,
        )
    }

    pub fn categories(err: QueryError) -> Self {
        Self::from_error(
            "infra::http::blog::list_categories",
            StatusCode::INTERNAL_SERVER_ERROR,
            messages::FETCH_CATEGORIES_FAILED,
            &err,
        )
    }
}

impl From<RevalidationError> for ApiError {
    fn from(err: RevalidationError) -> Self {
        const SOURCE: &str = "infra::http::revalidate";
        match &err {
            RevalidationError::MissingSecret => Self::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::SERVER_CONFIGURATION,
                &err,
            ),
            RevalidationError::InvalidSignature(_) => Self::from_error(
                SOURCE,
                StatusCode::UNAUTHORIZED,
                messages::INVALID_SIGNATURE,
                &err,
            ),
            RevalidationError::InvalidPayload(_) => Self::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                messages::INVALID_PAYLOAD,
                &err,
            ),
            RevalidationError::Invalidation(_) | RevalidationError::Timestamp(_) => {
                Self::from_error(
                    SOURCE,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    messages::REVALIDATION_FAILED,
                    &err,
                )
                .with_message(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error.to_string(),
            message: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
