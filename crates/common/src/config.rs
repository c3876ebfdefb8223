//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GlideError, GlideResult};

/// Untyped key/value parameter payload handed to scroll controllers.
pub type ParameterMap = serde_json::Map<String, serde_json::Value>;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scroll controller selection and parameter overrides.
    pub scroll: ScrollSettings,

    /// Device discovery and event interception.
    pub receiver: ReceiverSettings,

    /// Synthetic output device settings.
    pub output: OutputSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Scroll controller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// Animate scrolling. When false, ticks are posted as fixed steps.
    pub smooth: bool,

    /// Parameter overrides, applied on top of the controller defaults.
    pub parameters: ParameterMap,
}

/// Input receiver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverSettings {
    /// How often the device list is rescanned for attach/detach (ms).
    pub rescan_interval_ms: u64,

    /// Take exclusive access to relevant devices so their raw wheel
    /// events do not reach applications twice.
    pub grab_devices: bool,

    /// Only mice with a scroll wheel count as relevant.
    pub require_wheel: bool,

    /// Case-insensitive device name fragments to ignore.
    pub ignore_names: Vec<String>,

    /// `vendor:product` ids (lowercase hex) to ignore.
    pub ignore_ids: Vec<String>,
}

/// Output device settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// How many pixels one legacy wheel detent represents downstream.
    pub pixels_per_detent: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "glide=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            smooth: true,
            parameters: ParameterMap::new(),
        }
    }
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self {
            rescan_interval_ms: 1000,
            grab_devices: true,
            require_wheel: true,
            ignore_names: Vec::new(),
            ignore_ids: Vec::new(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            pixels_per_detent: 76.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = ?config_path,
                    error = %e,
                    "Failed to load config, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> GlideResult<Self> {
        if !path.exists() {
            return Err(GlideError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)
            .map_err(|e| GlideError::config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> GlideResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> GlideResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("glide").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let raw = r#"{
            "receiver": { "grab_devices": false },
            "scroll": { "parameters": { "px_per_tick": 60 } }
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();

        assert!(!config.receiver.grab_devices);
        assert_eq!(config.receiver.rescan_interval_ms, 1000);
        assert!(config.scroll.smooth);
        assert_eq!(config.scroll.parameters["px_per_tick"], 60);
        assert_eq!(config.logging.level, "info");
        assert!((config.output.pixels_per_detent - 76.0).abs() < 1e-9);
    }

    #[test]
    fn save_and_load_roundtrip_through_file() {
        let dir = std::env::temp_dir().join("glide_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.receiver.ignore_names.push("Logitech G Pro".to_string());
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.receiver.ignore_names, vec!["Logitech G Pro"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_from_missing_path_is_file_not_found() {
        let path = std::env::temp_dir().join("glide_test_config_missing.json");
        let _ = std::fs::remove_file(&path);
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, GlideError::FileNotFound { .. }));
    }

    #[test]
    fn load_from_invalid_json_is_config_error() {
        let path = std::env::temp_dir().join("glide_test_config_invalid.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, GlideError::Config { .. }));
        std::fs::remove_file(&path).ok();
    }
}
