//! API Route Configuration

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{handle_middleware_error, logging_middleware, rate_limit_middleware};

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_body_bytes = state.config.server.max_body_bytes;
    let request_timeout = state.config.server.request_timeout;

    // API v1 routes
    let api_v1 = Router::new()
        // Health & Status
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .route("/patterns", get(handlers::list_patterns))
        // Scanning
        .route("/scan", post(handlers::scan_address))
        .route("/scan/code", post(handlers::scan_code))
        .route("/scan/batch", post(handlers::scan_batch));

    Router::new()
        .nest("/v1", api_v1)
        // Also expose at root for load balancer probes
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(request_timeout),
        )
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}
