//! Style template definitions.
//!
//! A style template is a named editing preset. The mapper turns the
//! human-readable name into the parameter set sent to the processing API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available editing templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StyleTemplate {
    /// Fast cuts, bold captions, high energy
    AlexHormozi,
    /// Cinematic look with smooth B-roll transitions
    ImanGadzhi,
    /// Authentic, raw, conversational
    GaryVee,
    /// Learned from a user-supplied reference video
    Custom,
    /// Professional fallback preset
    #[default]
    Default,
}

impl StyleTemplate {
    /// All templates, in display order.
    pub const ALL: &'static [StyleTemplate] = &[
        StyleTemplate::AlexHormozi,
        StyleTemplate::ImanGadzhi,
        StyleTemplate::GaryVee,
        StyleTemplate::Custom,
        StyleTemplate::Default,
    ];

    /// Resolve a template name, falling back to [`StyleTemplate::Default`]
    /// for anything unknown.
    pub fn resolve(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    /// Slug form, as used in request payloads.
    pub fn as_slug(&self) -> &'static str {
        match self {
            StyleTemplate::AlexHormozi => "alex_hormozi",
            StyleTemplate::ImanGadzhi => "iman_gadzhi",
            StyleTemplate::GaryVee => "gary_vee",
            StyleTemplate::Custom => "custom",
            StyleTemplate::Default => "default",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            StyleTemplate::AlexHormozi => "Alex Hormozi",
            StyleTemplate::ImanGadzhi => "Iman Gadzhi",
            StyleTemplate::GaryVee => "Gary Vee",
            StyleTemplate::Custom => "Custom",
            StyleTemplate::Default => "default",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StyleTemplate::AlexHormozi => "Fast cuts, bold text, high energy",
            StyleTemplate::ImanGadzhi => "Cinematic, smooth B-roll",
            StyleTemplate::GaryVee => "Authentic, raw, engaging",
            StyleTemplate::Custom => "Upload a reference video to copy its editing style",
            StyleTemplate::Default => "Clean professional edit",
        }
    }

    /// Whether the template needs a reference video.
    pub fn requires_reference(&self) -> bool {
        matches!(self, StyleTemplate::Custom)
    }

    /// Processing parameters for this template.
    pub fn params(&self) -> StyleParams {
        match self {
            StyleTemplate::AlexHormozi => StyleParams {
                caption_style: Some("bold".into()),
                pace: Some("high".into()),
                music_tempo: Some("upbeat".into()),
                ..StyleParams::new("fast_cuts")
            },
            StyleTemplate::ImanGadzhi => StyleParams {
                transitions: Some("smooth".into()),
                color_grade: Some("cinematic".into()),
                pace: Some("medium".into()),
                ..StyleParams::new("cinematic")
            },
            StyleTemplate::GaryVee => StyleParams {
                cuts: Some("minimal".into()),
                color_grade: Some("natural".into()),
                pace: Some("conversational".into()),
                ..StyleParams::new("authentic")
            },
            StyleTemplate::Custom => StyleParams {
                style_transfer: Some(true),
                ..StyleParams::new("custom")
            },
            StyleTemplate::Default => StyleParams {
                pace: Some("medium".into()),
                color_grade: Some("enhanced".into()),
                ..StyleParams::new("professional")
            },
        }
    }
}

impl fmt::Display for StyleTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for StyleTemplate {
    type Err = StyleParseError;

    /// Accepts display names and slugs, case-insensitively
    /// (`"Alex Hormozi"`, `"alex_hormozi"`, `"alex-hormozi"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "alex_hormozi" => Ok(StyleTemplate::AlexHormozi),
            "iman_gadzhi" => Ok(StyleTemplate::ImanGadzhi),
            "gary_vee" => Ok(StyleTemplate::GaryVee),
            "custom" => Ok(StyleTemplate::Custom),
            "default" => Ok(StyleTemplate::Default),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown style template: {0}")]
pub struct StyleParseError(String);

/// Structured processing parameters for a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StyleParams {
    /// Editing style identifier
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_tempo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuts: Option<String>,
    /// Copy the editing style of the reference input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_transfer: Option<bool>,
}

impl StyleParams {
    fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            pace: None,
            color_grade: None,
            caption_style: None,
            music_tempo: None,
            transitions: None,
            cuts: None,
            style_transfer: None,
        }
    }
}

/// Map a template name to its processing parameters.
///
/// Unknown names map to the `default` parameter set.
pub fn map_style(style_name: &str) -> StyleParams {
    StyleTemplate::resolve(style_name).params()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_names_and_slugs() {
        assert_eq!(
            "Alex Hormozi".parse::<StyleTemplate>().unwrap(),
            StyleTemplate::AlexHormozi
        );
        assert_eq!(
            "alex_hormozi".parse::<StyleTemplate>().unwrap(),
            StyleTemplate::AlexHormozi
        );
        assert_eq!(
            "GARY-VEE".parse::<StyleTemplate>().unwrap(),
            StyleTemplate::GaryVee
        );
        assert!("tiktok".parse::<StyleTemplate>().is_err());
    }

    #[test]
    fn test_map_alex_hormozi() {
        let params = map_style("Alex Hormozi");
        assert_eq!(params.style, "fast_cuts");
        assert_eq!(params.caption_style.as_deref(), Some("bold"));
        assert_eq!(params.pace.as_deref(), Some("high"));
        assert_eq!(params.music_tempo.as_deref(), Some("upbeat"));
        assert!(params.color_grade.is_none());
    }

    #[test]
    fn test_map_custom_enables_style_transfer() {
        let params = map_style("Custom");
        assert_eq!(params.style, "custom");
        assert_eq!(params.style_transfer, Some(true));
        assert!(StyleTemplate::Custom.requires_reference());
    }

    #[test]
    fn test_unknown_style_maps_to_default() {
        let params = map_style("Some Influencer");
        assert_eq!(params, StyleTemplate::Default.params());
        assert_eq!(params.style, "professional");
        assert_eq!(params.pace.as_deref(), Some("medium"));
        assert_eq!(params.color_grade.as_deref(), Some("enhanced"));
    }

    #[test]
    fn test_params_serialize_without_unset_fields() {
        let value = serde_json::to_value(map_style("default")).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["style"], "professional");
    }

    #[test]
    fn test_every_template_round_trips_through_its_slug() {
        for template in StyleTemplate::ALL {
            assert_eq!(&template.as_slug().parse::<StyleTemplate>().unwrap(), template);
            assert_eq!(&template.display_name().parse::<StyleTemplate>().unwrap(), template);
        }
    }
}
