//! Job lifecycle metrics.
//!
//! Provides counters for:
//! - Job creation by execution mode
//! - Terminal transitions
//! - Gateway requests and fallbacks

use metrics::{counter, histogram};
use zclip_models::JobStatus;

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Jobs created, by execution mode.
    pub const JOBS_CREATED_TOTAL: &str = "zclip_jobs_created_total";

    /// Jobs that reached `completed`.
    pub const JOBS_COMPLETED_TOTAL: &str = "zclip_jobs_completed_total";

    /// Jobs that reached `canceled`.
    pub const JOBS_CANCELED_TOTAL: &str = "zclip_jobs_canceled_total";

    /// Jobs that reached `error`.
    pub const JOBS_FAILED_TOTAL: &str = "zclip_jobs_failed_total";

    /// Gateway submissions that fell back to simulated processing.
    pub const GATEWAY_FALLBACKS_TOTAL: &str = "zclip_gateway_fallbacks_total";

    /// Gateway requests by operation and outcome.
    pub const GATEWAY_REQUESTS_TOTAL: &str = "zclip_gateway_requests_total";

    /// Gateway request latency in seconds by operation.
    pub const GATEWAY_LATENCY_SECONDS: &str = "zclip_gateway_latency_seconds";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a newly created job.
pub fn record_job_created(mode: &str) {
    counter!(names::JOBS_CREATED_TOTAL, "mode" => mode.to_string()).increment(1);
}

/// Record a job entering a terminal state.
pub fn record_terminal_transition(status: JobStatus) {
    let name = match status {
        JobStatus::Completed => names::JOBS_COMPLETED_TOTAL,
        JobStatus::Canceled => names::JOBS_CANCELED_TOTAL,
        JobStatus::Error => names::JOBS_FAILED_TOTAL,
        JobStatus::Submitted | JobStatus::Processing => return,
    };
    counter!(name).increment(1);
}

/// Record a gateway submission that fell back to simulation.
pub fn record_gateway_fallback() {
    counter!(names::GATEWAY_FALLBACKS_TOTAL).increment(1);
}

/// Record a completed gateway request.
pub fn record_gateway_request(operation: &str, success: bool, latency_ms: f64) {
    let outcome = if success { "ok" } else { "error" };

    counter!(
        names::GATEWAY_REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        names::GATEWAY_LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

// =============================================================================
// Tests
// =============================================================================
