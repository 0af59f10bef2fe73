//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    cancel_job, chat, create_job, get_result, get_status, get_style, health, list_styles, ready,
    upload_video,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    structured_errors, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/status/:job_id", get(get_status))
        .route("/jobs/:job_id/cancel", post(cancel_job))
        .route("/jobs/:job_id/result", get(get_result));

    let style_routes = Router::new()
        .route("/styles", get(list_styles))
        .route("/styles/:name", get(get_style));

    // Chat may wait on the text-completion service, so it shares the timeout
    let timed_routes = Router::new()
        .merge(job_routes)
        .merge(style_routes)
        .route("/chat", post(chat))
        .layer(TimeoutLayer::new(state.config.request_timeout));

    // Submission is bounded by the gateway submit timeout, so a slow
    // provider still ends in the simulated fallback instead of a 408.
    // Large uploads are bounded by the body limit only.
    let untimed_routes = Router::new()
        .route("/process", post(create_job))
        .route("/upload", post(upload_video));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(timed_routes)
        .merge(untimed_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Extractors default to 2 MB; uploads need the configured ceiling
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(structured_errors))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
