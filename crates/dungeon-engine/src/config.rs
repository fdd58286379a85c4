//! YAML configuration for the application.
//!
//! ```yaml
//! log:
//!   level: INFO              # ERROR | WARN | INFO | DEBUG | TRACE
//! render:
//!   window:
//!     width: 1280
//!     height: 720
//!     fullscreen: false
//!     title: "Infinite Dungeon"
//! comfyui:
//!   base_url: "http://127.0.0.1:8000"
//!   workflow_folder: "assets/workflows"
//!   workflow_name: "default_api.json"
//! simulation:
//!   seed: 42                 # omit for a fresh seed every run
//! ```
//!
//! Every section and field is optional; missing values take the defaults
//! shown above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_owned(),
        }
    }
}

impl LogConfig {
    /// The configured level as a filter directive. Unrecognised levels fall
    /// back to `info`.
    pub fn directive(&self) -> &'static str {
        match self.level.parse::<tracing::Level>() {
            Ok(tracing::Level::ERROR) => "error",
            Ok(tracing::Level::WARN) => "warn",
            Ok(tracing::Level::DEBUG) => "debug",
            Ok(tracing::Level::TRACE) => "trace",
            _ => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            title: "Infinite Dungeon".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub window: WindowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComfyUiConfig {
    pub base_url: String,
    pub workflow_folder: PathBuf,
    /// Workflow file used by the image generation scene.
    pub workflow_name: String,
}

impl Default for ComfyUiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_owned(),
            workflow_folder: PathBuf::from("assets/workflows"),
            workflow_name: "default_api.json".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for scene randomness. `None` seeds from the OS.
    pub seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub render: RenderConfig,
    pub comfyui: ComfyUiConfig,
    pub simulation: SimulationConfig,
}

impl Config {
    /// Read, parse and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        let config: Config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = &self.render.window;
        if window.width == 0 || window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                window.width, window.height
            )));
        }
        if self.comfyui.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "comfyui.base_url must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Logical viewport size in pixels.
    pub fn viewport(&self) -> (f64, f64) {
        (
            f64::from(self.render.window.width),
            f64::from(self.render.window.height),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document_parses() {
        let yaml = r#"
log:
  level: DEBUG
render:
  window:
    width: 800
    height: 600
    fullscreen: true
    title: "Test"
comfyui:
  base_url: "http://example:9000"
  workflow_folder: "wf"
  workflow_name: "custom.json"
simulation:
  seed: 7
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.log.directive(), "debug");
        assert_eq!(config.render.window.width, 800);
        assert!(config.render.window.fullscreen);
        assert_eq!(config.comfyui.workflow_folder, PathBuf::from("wf"));
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.viewport(), (800.0, 600.0));
    }

    #[test]
    fn missing_sections_take_defaults() {
        let config = Config::from_yaml_str("log:\n  level: TRACE\n").unwrap();
        assert_eq!(config.render, RenderConfig::default());
        assert_eq!(config.comfyui, ComfyUiConfig::default());
        assert_eq!(config.simulation.seed, None);

        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let log = LogConfig {
            level: "LOUD".to_owned(),
        };
        assert_eq!(log.directive(), "info");
        let log = LogConfig {
            level: "warn".to_owned(),
        };
        assert_eq!(log.directive(), "warn");
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = Config::from_yaml_str("render:\n  window:\n    width: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("0x720")));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let err = Config::from_yaml_str("comfyui:\n  base_url: \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = Config::from_yaml_str("render: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let path = dir.path().join("ok.yaml");
        std::fs::write(&path, "simulation:\n  seed: 3\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().simulation.seed, Some(3));
    }
}
