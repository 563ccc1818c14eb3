use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub mod startup_checks;
pub mod watermark;

use watermark::{DEFAULT_EXPORT_FILE_NAME, PatternFormat, StyleConfig, WatermarkError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml_edit::de::Error),

    #[error("Invalid [watermark] settings: {0}")]
    Watermark(#[from] WatermarkError),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub watermark: WatermarkConfig,
    pub map: MapConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub font_family: String,
    pub font_size_px: u32,
    pub fonts_directory: PathBuf,
    pub date_format: String,
    pub time_format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MapConfig {
    /// How long to wait for the map snapshot before composing without it.
    pub snapshot_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    pub file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        let style = StyleConfig::default();
        let format = PatternFormat::default();
        Self {
            font_family: style.font_family,
            font_size_px: style.font_size_px,
            fonts_directory: PathBuf::from("static"),
            date_format: format.date_pattern,
            time_format: format.time_pattern,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            snapshot_timeout_ms: 5000,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML config; missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml_edit::de::from_str(content)?;
        config.watermark.validate()?;
        Ok(config)
    }
}

impl WatermarkConfig {
    pub fn style(&self) -> StyleConfig {
        StyleConfig::new(self.font_family.clone(), self.font_size_px)
    }

    pub fn date_time_format(&self) -> PatternFormat {
        PatternFormat::new(self.date_format.clone(), self.time_format.clone())
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        self.style().validate()?;
        self.date_time_format().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.app.log_level, "info");
        assert_eq!(config.watermark.style(), StyleConfig::default());
        assert_eq!(config.watermark.fonts_directory, PathBuf::from("static"));
        assert_eq!(config.watermark.date_time_format(), PatternFormat::default());
        assert_eq!(config.map.snapshot_timeout_ms, 5000);
        assert_eq!(config.export.file_name, "gps_photo_watermark.png");
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = Config::from_toml_str(
            r#"
[app]
log_level = "debug"

[watermark]
font_family = "Liberation Serif"
font_size_px = 32
date_format = "%Y-%m-%d"

[map]
snapshot_timeout_ms = 250
"#,
        )
        .unwrap();

        assert_eq!(config.app.log_level, "debug");
        assert_eq!(
            config.watermark.style(),
            StyleConfig::new("Liberation Serif", 32)
        );
        assert_eq!(config.watermark.date_format, "%Y-%m-%d");
        assert_eq!(config.watermark.time_format, "%H:%M:%S");
        assert_eq!(config.map.snapshot_timeout_ms, 250);
        assert_eq!(config.export.file_name, "gps_photo_watermark.png");
    }

    #[test]
    fn test_negative_font_size_is_rejected() {
        let result = Config::from_toml_str("[watermark]\nfont_size_px = -4\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_out_of_range_font_size_is_rejected() {
        for size in ["0", "1000000000"] {
            let result = Config::from_toml_str(&format!("[watermark]\nfont_size_px = {size}\n"));
            assert!(matches!(
                result,
                Err(ConfigError::Watermark(WatermarkError::InvalidFontSize(_)))
            ));
        }
    }

    #[test]
    fn test_malformed_date_format_is_rejected() {
        let result = Config::from_toml_str("[watermark]\ndate_format = \"%Q\"\n");
        assert!(matches!(
            result,
            Err(ConfigError::Watermark(WatermarkError::InvalidPattern(p))) if p == "%Q"
        ));

        let result = Config::from_toml_str("[watermark]\ntime_format = \"%H:%\"\n");
        assert!(matches!(
            result,
            Err(ConfigError::Watermark(WatermarkError::InvalidPattern(_)))
        ));
    }
}
