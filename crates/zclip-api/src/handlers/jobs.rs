//! Processing job handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use zclip_models::{JobId, JobRequest, JobStatusSnapshot};

use crate::error::{ApiError, ApiResult};
use crate::security::{sanitize_string, validate_media_ref, MAX_INSTRUCTIONS_LENGTH};
use crate::state::AppState;

/// Maximum style name length.
const MAX_STYLE_NAME_LENGTH: usize = 100;

// ============================================================================
// Create
// ============================================================================

/// Request to start processing a video.
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    /// Uploaded path or URL of the footage
    pub main_video: String,
    /// Optional style donor footage
    #[serde(default)]
    pub reference_video: Option<String>,
    /// Style template name
    #[serde(default = "default_style")]
    pub template_style: String,
    /// Free-text editing instructions
    #[serde(default)]
    pub instructions: String,
}

fn default_style() -> String {
    "default".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub success: bool,
    pub job_id: JobId,
    pub message: String,
}

/// Start a processing job.
pub async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> ApiResult<Json<CreateJobResponse>> {
    let Json(request) = payload?;

    let main_video = validate_media_ref(&request.main_video).map_err(ApiError::bad_request)?;
    let reference_video = match request.reference_video.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => Some(validate_media_ref(r).map_err(ApiError::bad_request)?),
        _ => None,
    };

    let style = sanitize_string(request.template_style.trim(), MAX_STYLE_NAME_LENGTH);
    let style = if style.is_empty() { default_style() } else { style };
    let instructions = sanitize_string(&request.instructions, MAX_INSTRUCTIONS_LENGTH);

    let mut job_request = JobRequest::new(main_video, style).with_instructions(instructions);
    if let Some(reference) = reference_video {
        job_request = job_request.with_reference(reference);
    }

    let job_id = state.engine.create_job(job_request).await?;

    info!(job_id = %job_id, "Video processing started");

    Ok(Json(CreateJobResponse {
        success: true,
        job_id,
        message: "Video processing started successfully".to_string(),
    }))
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: JobStatusSnapshot,
}

/// Poll a job.
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let job_id = parse_job_id(job_id)?;
    let status = state.engine.get_status(&job_id).await?;

    Ok(Json(StatusResponse {
        success: true,
        status,
    }))
}

// ============================================================================
// Cancel
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub canceled: bool,
}

/// Cancel a job.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<CancelResponse>> {
    let job_id = parse_job_id(job_id)?;
    let canceled = state.engine.cancel(&job_id).await?;

    Ok(Json(CancelResponse { canceled }))
}

// ============================================================================
// Result
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    pub result_ref: String,
}

/// Output location of a completed job.
pub async fn get_result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ResultResponse>> {
    let job_id = parse_job_id(job_id)?;
    let result_ref = state.engine.get_result_location(&job_id).await?;

    Ok(Json(ResultResponse { result_ref }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Reject IDs that could never have been generated.
fn parse_job_id(raw: String) -> ApiResult<JobId> {
    let job_id = JobId::from(raw);
    if !job_id.is_well_formed() {
        return Err(ApiError::bad_request("Invalid job ID format"));
    }
    Ok(job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_id() {
        assert!(parse_job_id("task_1700000000000_ab12cd34_0".into()).is_ok());
        assert!(parse_job_id("unknown-id".into()).is_ok());
        assert!(parse_job_id("bad id".into()).is_err());
        assert!(parse_job_id("x".repeat(200)).is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateJobRequest =
            serde_json::from_str(r#"{"main_video": "uploads/main/a.mp4"}"#).unwrap();
        assert_eq!(request.template_style, "default");
        assert_eq!(request.instructions, "");
        assert!(request.reference_video.is_none());
    }
}
