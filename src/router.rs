use crate::handlers::{self, AppState};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Maximum accepted request body: 1MB.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Enrollment endpoints, before state is attached.
///
/// Kept separate from [`build_router`] so callers can wrap them in extra
/// layers (rate limiting) without touching the health check.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/enrollments",
            get(handlers::get_enrollment).post(handlers::post_enrollment),
        )
        .route("/enrollments/cep", get(handlers::get_address_from_cep))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Final app: health check, the given API routes, tracing and CORS.
pub fn build_router(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
