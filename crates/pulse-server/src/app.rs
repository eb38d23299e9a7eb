use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — permissive CORS: the tracking snippet is embedded on
///    arbitrary customer domains, so the payload's `domain` field (not CORS)
///    is the authorization boundary.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/track", post(routes::track::track))
        .route(
            "/api/events",
            post(routes::events::record_custom_event).get(routes::events::list_custom_events),
        )
        .route("/api/websites/{domain}/views", get(routes::stats::get_views))
        .route("/api/websites/{domain}/stats", get(routes::stats::get_stats))
        .route(
            "/api/websites/{domain}/active",
            get(routes::stats::get_active),
        )
        .route(
            "/api/websites/{domain}",
            get(routes::websites::get_website).delete(routes::websites::delete_website),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
