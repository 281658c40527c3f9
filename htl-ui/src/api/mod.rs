//! HTTP API layer

mod health;
mod results;
mod rounds;
mod session;
mod sse;

pub use health::health_check;
pub use results::{get_report, get_results};
pub use rounds::get_rounds;
pub use session::{get_state, post_advance, post_confirm, post_reset, post_select};
pub use sse::event_stream;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Maps core errors onto HTTP responses
#[derive(Debug)]
pub struct ApiError(pub htl_common::Error);

impl From<htl_common::Error> for ApiError {
    fn from(e: htl_common::Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use htl_common::Error;
        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            // Already recorded counts as success at this surface
            Error::DuplicateVote => StatusCode::OK,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
