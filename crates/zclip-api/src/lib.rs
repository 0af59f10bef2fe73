//! Axum HTTP API server.
//!
//! This crate provides:
//! - Job endpoints backed by the processing engine
//! - Chat assistant with canned-reply fallback
//! - Video uploads into local media storage
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::{ApiConfig, JobStoreKind};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use services::{AssistantConfig, AssistantService};
pub use state::AppState;
