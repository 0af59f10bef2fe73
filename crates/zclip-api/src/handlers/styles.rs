//! Style template handlers.

use axum::extract::Path;
use axum::Json;
use serde::{Deserialize, Serialize};
use zclip_models::{StyleParams, StyleTemplate};

use crate::error::{ApiError, ApiResult};

/// Template summary for the picker.
#[derive(Debug, Serialize, Deserialize)]
pub struct StyleInfo {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub requires_reference: bool,
}

impl From<StyleTemplate> for StyleInfo {
    fn from(template: StyleTemplate) -> Self {
        Self {
            name: template.display_name().to_string(),
            slug: template.as_slug().to_string(),
            description: template.description().to_string(),
            requires_reference: template.requires_reference(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StyleListResponse {
    pub styles: Vec<StyleInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StyleDetailResponse {
    #[serde(flatten)]
    pub info: StyleInfo,
    pub params: StyleParams,
}

/// List all templates.
pub async fn list_styles() -> Json<StyleListResponse> {
    Json(StyleListResponse {
        styles: StyleTemplate::ALL.iter().copied().map(StyleInfo::from).collect(),
    })
}

/// Mapped parameters of one template.
pub async fn get_style(Path(name): Path<String>) -> ApiResult<Json<StyleDetailResponse>> {
    let template: StyleTemplate = name
        .parse()
        .map_err(|_| ApiError::not_found(format!("Style not found: {}", name)))?;

    Ok(Json(StyleDetailResponse {
        info: template.into(),
        params: template.params(),
    }))
}
