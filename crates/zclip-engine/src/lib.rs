//! Processing job lifecycle.
//!
//! This crate provides:
//! - `JobEngine`: create, poll, cancel and resolve processing jobs
//! - Simulated and gateway processing backends
//! - The HTTP client for the remote processing API
//! - Job lifecycle metrics

pub mod backend;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod progress;

pub use backend::{backend_from_config, GatewayBackend, ProcessingBackend, SimulatedBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    EngineConfig, GatewayConfig, ProcessingMode, DEFAULT_JOB_DURATION_SECS, DEFAULT_PROGRESS_CAP,
};
pub use engine::JobEngine;
pub use error::{JobError, JobResult};
pub use gateway::{RemoteGateway, RemoteStatus};
pub use progress::{simulated_progress, SimulatedProgress};
