use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::SharedState;

/// Middleware that answers 408 once a request runs past the configured timeout.
/// The handler future is dropped at that point; files it already wrote stay.
pub async fn enforce(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let limit = state.config.request_timeout;

    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!("Request {method} {uri} timed out after {}s", limit.as_secs());
            AppError::Timeout.into_response()
        }
    }
}
