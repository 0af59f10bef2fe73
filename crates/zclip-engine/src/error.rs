//! Job lifecycle error types.

use thiserror::Error;
use zclip_store::StorageError;

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Result not ready: {0}")]
    NotReady(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Processing gateway unavailable: {0}")]
    GatewayUnavailable(String),
}

impl JobError {
    pub fn not_found(job_id: impl Into<String>) -> Self {
        Self::NotFound(job_id.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn not_ready(job_id: impl Into<String>) -> Self {
        Self::NotReady(job_id.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn gateway_unavailable(msg: impl Into<String>) -> Self {
        Self::GatewayUnavailable(msg.into())
    }

    /// Stable machine-readable kind, used at the API boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::NotFound(_) => "not_found",
            JobError::InvalidState(_) => "invalid_state",
            JobError::NotReady(_) => "not_ready",
            JobError::InvalidInput(_) => "invalid_input",
            JobError::Storage(_) => "storage_error",
            JobError::GatewayUnavailable(_) => "gateway_unavailable",
        }
    }
}

impl From<reqwest::Error> for JobError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::GatewayUnavailable(format!("request timed out: {}", e))
        } else {
            Self::GatewayUnavailable(e.to_string())
        }
    }
}
