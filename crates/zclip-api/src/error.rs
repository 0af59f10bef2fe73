//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zclip_engine::JobError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timed out")]
    RequestTimeout,

    #[error("Processing gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] zclip_store::StorageError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidState(_) | ApiError::NotReady(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InvalidState(_) => "invalid_state",
            ApiError::NotReady(_) => "not_ready",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::RateLimited => "rate_limited",
            ApiError::RequestTimeout => "request_timeout",
            ApiError::GatewayUnavailable(_) => "gateway_unavailable",
            ApiError::Internal(_) => "internal",
            ApiError::Storage(_) => "storage_error",
        }
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::NotFound(id) => ApiError::NotFound(format!("job {}", id)),
            JobError::InvalidState(msg) => ApiError::InvalidState(msg),
            JobError::NotReady(msg) => ApiError::NotReady(msg),
            JobError::InvalidInput(msg) => ApiError::BadRequest(msg),
            JobError::Storage(e) => ApiError::Storage(e),
            JobError::GatewayUnavailable(msg) => ApiError::GatewayUnavailable(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::BadRequest(e.body_text())
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) | ApiError::Storage(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            detail,
            code: Some(self.code().to_string()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zclip_store::StorageError;

    #[test]
    fn test_job_error_mapping() {
        let cases: Vec<(JobError, StatusCode, &str)> = vec![
            (JobError::not_found("x"), StatusCode::NOT_FOUND, "not_found"),
            (JobError::invalid_state("done"), StatusCode::CONFLICT, "invalid_state"),
            (JobError::not_ready("x"), StatusCode::CONFLICT, "not_ready"),
            (JobError::invalid_input("empty"), StatusCode::BAD_REQUEST, "bad_request"),
            (
                JobError::Storage(StorageError::write_failed("disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
            ),
            (
                JobError::gateway_unavailable("down"),
                StatusCode::BAD_GATEWAY,
                "gateway_unavailable",
            ),
        ];

        for (job_error, status, code) in cases {
            let api_error = ApiError::from(job_error);
            assert_eq!(api_error.status_code(), status);
            assert_eq!(api_error.code(), code);
        }
    }

    #[test]
    fn test_response_status() {
        let response = ApiError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = ApiError::payload_too_large("2 GiB").into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let error = ApiError::RequestTimeout;
        assert_eq!(error.code(), "request_timeout");
        assert_eq!(error.into_response().status(), StatusCode::REQUEST_TIMEOUT);
    }
}
