pub mod config;
pub mod error;
pub mod state;
pub mod db;
pub mod models;
pub mod middleware;
pub mod routes;
pub mod submission;
pub mod rate_limit;

use std::sync::Arc;

use axum::Router;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::SubmissionStore;
use crate::rate_limit::RateLimiter;
use crate::state::{AppState, SharedState};
use crate::submission::files::PUBLIC_PREFIX;

pub fn build_app(store: Arc<dyn SubmissionStore>, config: Config) -> (Router, SharedState) {
    let cors = cors_layer(&config.cors_origins);
    let uploads = ServeDir::new(&config.upload_dir)
        .not_found_service(routes::route_not_found.into_service());
    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState {
        store,
        limiter: RateLimiter::new(config.rate_limit),
        config,
    });

    let app = Router::new()
        .merge(routes::api_routes(max_body_size))
        .nest_service(PUBLIC_PREFIX, uploads)
        .route("/health", axum::routing::get(health))
        .fallback(routes::route_not_found)
        .layer(
            // Outermost first
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // Security headers
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                ))
                .layer(cors)
                .layer(CatchPanicLayer::custom(error::handle_panic))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::timeout::enforce,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::throttle::limit_by_ip,
                )),
        )
        .with_state(state.clone());

    (app, state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{origin}': {e}");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}

async fn health() -> &'static str {
    "ok"
}
