//! Export configuration
//!
//! Tuning values for the emitter. A config is built once and handed to the
//! exporter; nothing reads these values from global state.

use crate::color::{ColorError, RgbColor};
use serde::{Deserialize, Serialize};

/// Errors for invalid configuration values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("shape_opacity must be within 0..=1, got {0}")]
    OpacityOutOfRange(f64),
    #[error("invalid color in config: {0}")]
    Color(#[from] ColorError),
}

/// Immutable tuning values for PDF export
///
/// Missing fields take their default when deserialized, so a host can store
/// only the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Stroke width for outlines, in page points
    pub stroke_width: f64,
    /// Fill and stroke alpha for shapes
    pub shape_opacity: f64,
    pub font_size: f64,
    /// Cloud arc radius, in page points
    pub cloud_radius: f64,
    /// Arrowhead wing length, in page points
    pub arrowhead_length: f64,
    /// Fallback outline color for shapes without one
    pub default_color: String,
    pub text_background: String,
    pub text_color: String,
    /// Marker icon size, in page points
    pub marker_width: f64,
    pub marker_height: f64,
    /// Radius of circle markers, in canvas pixels
    pub circle_marker_radius: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            stroke_width: 6.0,
            shape_opacity: 0.2,
            font_size: 16.0,
            cloud_radius: 10.0,
            arrowhead_length: 10.0,
            default_color: "#3388ff".to_string(),
            text_background: "#ffffff".to_string(),
            text_color: "#000000".to_string(),
            marker_width: 25.0,
            marker_height: 41.0,
            circle_marker_radius: 10.0,
        }
    }
}

impl ExportConfig {
    /// Parse a (possibly partial) JSON object and validate the result
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ExportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("stroke_width", self.stroke_width),
            ("font_size", self.font_size),
            ("cloud_radius", self.cloud_radius),
            ("arrowhead_length", self.arrowhead_length),
            ("marker_width", self.marker_width),
            ("marker_height", self.marker_height),
            ("circle_marker_radius", self.circle_marker_radius),
        ];
        for (field, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.shape_opacity) {
            return Err(ConfigError::OpacityOutOfRange(self.shape_opacity));
        }

        self.default_color()?;
        self.text_background()?;
        self.text_color()?;
        Ok(())
    }

    pub fn default_color(&self) -> Result<RgbColor, ColorError> {
        RgbColor::from_hex(&self.default_color)
    }

    pub fn text_background(&self) -> Result<RgbColor, ColorError> {
        RgbColor::from_hex(&self.text_background)
    }

    pub fn text_color(&self) -> Result<RgbColor, ColorError> {
        RgbColor::from_hex(&self.text_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExportConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stroke_width, 6.0);
        assert_eq!(config.shape_opacity, 0.2);
        assert_eq!(config.font_size, 16.0);
    }

    #[test]
    fn test_partial_json_override() {
        let config = ExportConfig::from_json(r##"{"font_size": 12, "default_color": "#ff0000"}"##).unwrap();
        assert_eq!(config.font_size, 12.0);
        assert_eq!(config.default_color().unwrap(), RgbColor::new(1.0, 0.0, 0.0));
        assert_eq!(config.stroke_width, 6.0);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            ExportConfig::from_json(r#"{"shape_opacity": 1.5}"#),
            Err(ConfigError::OpacityOutOfRange(_))
        ));
        assert!(matches!(
            ExportConfig::from_json(r#"{"cloud_radius": 0}"#),
            Err(ConfigError::NotPositive { field: "cloud_radius", .. })
        ));
        assert!(matches!(
            ExportConfig::from_json(r##"{"text_color": "black"}"##),
            Err(ConfigError::Color(_))
        ));
        assert!(matches!(ExportConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}
