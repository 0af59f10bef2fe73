//! Video upload handler.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use zclip_store::sanitize_file_name;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::UPLOAD_TYPES;
use crate::state::AppState;

/// Accepted video file extensions.
const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "webm", "mkv"];

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Store an uploaded video under `uploads/<type>/`.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file_data: Option<(String, Vec<u8>)> = None;
    let mut kind = "main".to_string();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "video" => {
                let filename = field.file_name().unwrap_or("upload.mp4").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file_data = Some((filename, data.to_vec()));
            }
            "type" => {
                kind = field.text().await.map_err(multipart_error)?.trim().to_lowercase();
            }
            _ => {}
        }
    }

    if !UPLOAD_TYPES.contains(&kind.as_str()) {
        return Err(ApiError::bad_request(format!(
            "Invalid upload type '{}'. Expected one of: {}",
            kind,
            UPLOAD_TYPES.join(", ")
        )));
    }

    let (filename, data) =
        file_data.ok_or_else(|| ApiError::bad_request("Missing required 'video' field"))?;
    if data.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let file_name = sanitize_file_name(&filename);
    let ext = match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    };
    if !SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ApiError::bad_request(format!(
            "Unsupported video format '.{}'. Supported: {}",
            ext,
            SUPPORTED_VIDEO_EXTENSIONS.join(", ")
        )));
    }

    let file_size = data.len() as u64;
    let file_path = state
        .media
        .save(&format!("uploads/{}/{}", kind, file_name), data)
        .await?;
    let stored_name = file_path
        .rsplit('/')
        .next()
        .unwrap_or(file_path.as_str())
        .to_string();

    info!(path = %file_path, size = file_size, kind = %kind, "Video uploaded");
    metrics::record_upload(&kind, file_size);

    Ok(Json(UploadResponse {
        success: true,
        file_path,
        file_name: stored_name,
        file_size,
        kind,
    }))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(e.body_text())
    } else {
        ApiError::bad_request(e.body_text())
    }
}
