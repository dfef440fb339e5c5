use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::SharedState;

use super::client_ip::client_ip;

/// Middleware that applies the per-IP rate limit to every request.
pub async fn limit_by_ip(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let ip = client_ip(req.headers(), peer, &state.config.trusted_proxies);

    if let Err(retry_after) = state.limiter.check(ip) {
        tracing::warn!("Rate limited {ip}, retry after {retry_after}s");
        return AppError::RateLimited { retry_after }.into_response();
    }

    next.run(req).await
}
