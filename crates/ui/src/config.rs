//! Thumbnail panel configuration
//!
//! Configuration can be created programmatically, read from environment
//! variables, or loaded from a JSON file.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default thumbnail canvas width in pixels
pub const THUMBNAIL_WIDTH: u32 = 98;

/// Offset applied when scrolling a thumbnail into view, so it does not sit
/// flush against the top edge
pub const THUMBNAIL_SCROLL_MARGIN: f32 = -19.0;

/// Layout and rendering settings for the thumbnail panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailViewerConfig {
    /// Thumbnail canvas width in pixels; height follows the page ratio
    pub thumbnail_width: u32,

    /// Selection ring padding around each canvas
    pub ring_padding: f32,

    /// Vertical gap between thumbnails
    pub spacing: f32,

    /// Top offset used by `scroll_thumbnail_into_view`
    pub scroll_margin: f32,

    /// Oversampling factor for page rasterization before reduction
    pub output_scale: f32,

    /// Keep finished thumbnails as raw bitmaps instead of PNG-encoding them
    pub disable_canvas_to_image_conversion: bool,
}

impl Default for ThumbnailViewerConfig {
    fn default() -> Self {
        Self {
            thumbnail_width: THUMBNAIL_WIDTH,
            ring_padding: 7.0,
            spacing: 5.0,
            scroll_margin: THUMBNAIL_SCROLL_MARGIN,
            output_scale: 2.0,
            disable_canvas_to_image_conversion: false,
        }
    }
}

impl ThumbnailViewerConfig {
    /// Sets the thumbnail canvas width.
    pub fn with_thumbnail_width(mut self, width: u32) -> Self {
        self.thumbnail_width = width.max(1);
        self
    }

    /// Sets the rasterization oversampling factor.
    pub fn with_output_scale(mut self, scale: f32) -> Self {
        self.output_scale = scale;
        self
    }

    /// Sets the gap between thumbnails.
    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Keeps finished thumbnails as raw bitmaps.
    pub fn with_canvas_to_image_conversion_disabled(mut self, disabled: bool) -> Self {
        self.disable_canvas_to_image_conversion = disabled;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `THUMBSTRIP_THUMBNAIL_WIDTH`: canvas width in pixels (default: 98)
    /// - `THUMBSTRIP_OUTPUT_SCALE`: oversampling factor (default: 2.0)
    /// - `THUMBSTRIP_DISABLE_IMAGE_CONVERSION`: `true`/`false` (default: false)
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("THUMBSTRIP_THUMBNAIL_WIDTH") {
            config.thumbnail_width = val
                .parse::<u32>()
                .ok()
                .filter(|width| *width > 0)
                .ok_or_else(|| ConfigError::InvalidValue("THUMBSTRIP_THUMBNAIL_WIDTH".to_string()))?;
        }

        if let Ok(val) = std::env::var("THUMBSTRIP_OUTPUT_SCALE") {
            config.output_scale = val
                .parse::<f32>()
                .ok()
                .filter(|scale| *scale > 0.0)
                .ok_or_else(|| ConfigError::InvalidValue("THUMBSTRIP_OUTPUT_SCALE".to_string()))?;
        }

        if let Ok(val) = std::env::var("THUMBSTRIP_DISABLE_IMAGE_CONVERSION") {
            config.disable_canvas_to_image_conversion = val.parse::<bool>().map_err(|_| {
                ConfigError::InvalidValue("THUMBSTRIP_DISABLE_IMAGE_CONVERSION".to_string())
            })?;
        }

        Ok(config)
    }

    /// Loads configuration from a JSON file.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnail_width == 0 {
            return Err(ConfigError::InvalidValue("thumbnail_width".to_string()));
        }
        if !(self.output_scale > 0.0) {
            return Err(ConfigError::InvalidValue("output_scale".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        std::env::remove_var("THUMBSTRIP_THUMBNAIL_WIDTH");
        std::env::remove_var("THUMBSTRIP_OUTPUT_SCALE");
        std::env::remove_var("THUMBSTRIP_DISABLE_IMAGE_CONVERSION");
    }

    #[test]
    fn test_default_config() {
        let config = ThumbnailViewerConfig::default();
        assert_eq!(config.thumbnail_width, 98);
        assert_eq!(config.scroll_margin, -19.0);
        assert!(!config.disable_canvas_to_image_conversion);
    }

    #[test]
    fn test_builder_methods() {
        let config = ThumbnailViewerConfig::default()
            .with_thumbnail_width(0)
            .with_output_scale(1.0)
            .with_spacing(12.0)
            .with_canvas_to_image_conversion_disabled(true);

        assert_eq!(config.thumbnail_width, 1);
        assert_eq!(config.output_scale, 1.0);
        assert_eq!(config.spacing, 12.0);
        assert!(config.disable_canvas_to_image_conversion);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var("THUMBSTRIP_THUMBNAIL_WIDTH", "120");
        std::env::set_var("THUMBSTRIP_DISABLE_IMAGE_CONVERSION", "true");

        let config = ThumbnailViewerConfig::from_env().unwrap();
        assert_eq!(config.thumbnail_width, 120);
        assert!(config.disable_canvas_to_image_conversion);
        assert_eq!(config.output_scale, 2.0);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_value() {
        clear_env();
        std::env::set_var("THUMBSTRIP_OUTPUT_SCALE", "-1");

        let result = ThumbnailViewerConfig::from_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue(key)) if key == "THUMBSTRIP_OUTPUT_SCALE"));

        clear_env();
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("thumbnails.json");

        let config = ThumbnailViewerConfig::default().with_thumbnail_width(150);
        config.save_to_file(&path).unwrap();

        let loaded = ThumbnailViewerConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("thumbnails.json");
        fs::write(&path, r#"{ "spacing": 9.5 }"#).unwrap();

        let loaded = ThumbnailViewerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.spacing, 9.5);
        assert_eq!(loaded.thumbnail_width, THUMBNAIL_WIDTH);
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("thumbnails.json");

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ThumbnailViewerConfig::from_file(&path),
            Err(ConfigError::Parse(_))
        ));

        fs::write(&path, r#"{ "thumbnail_width": 0 }"#).unwrap();
        assert!(matches!(
            ThumbnailViewerConfig::from_file(&path),
            Err(ConfigError::InvalidValue(_))
        ));

        assert!(matches!(
            ThumbnailViewerConfig::from_file(temp_dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
