pub mod submissions;
pub mod submit;

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;

use crate::error::AppError;
use crate::state::SharedState;

/// API routes. The upload route is bounded by the multipart constraints
/// instead of the plain body limit.
pub fn api_routes(max_body_size: usize) -> Router<SharedState> {
    Router::new()
        .route("/api/submissions", get(submissions::list))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .route("/api/submit", post(submit::submit))
}

pub async fn route_not_found() -> impl IntoResponse {
    AppError::NotFound("Route not found".to_string())
}
