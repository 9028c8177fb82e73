use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Push-to-talk
        .route("/sphere/press", post(handlers::press))
        .route("/sphere/release", post(handlers::release))
        .route("/interaction", post(handlers::interaction))
        // Session queries
        .route("/status", get(handlers::status))
        .route("/transcript", get(handlers::transcript))
        .route("/session/reset", post(handlers::reset))
        // The sphere front end is served from its own origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
