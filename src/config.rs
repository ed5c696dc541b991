//! Configuration for mooze.
//!
//! Settings are read from `~/.mooze/config.toml`. Every field has a default,
//! so a missing file or a partial one is fine:
//!
//! ```toml
//! # Truncation marker: ".." or "..."
//! ellipsis = "..."
//!
//! # Border glyphs: single, double, rounded, heavy, ascii
//! border_style = "rounded"
//!
//! # Report mouse clicks and drags
//! mouse = false
//!
//! # How often the event loop checks for shutdown while idle
//! poll_interval_ms = 50
//!
//! # trace, debug, info, warn, error (RUST_LOG overrides)
//! log_level = "info"
//!
//! [window]
//! fg = "silver"
//! bg = "navy"
//! title_fg = "magenta"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::{Ellipsis, Style};
use crate::ui::BorderGlyphs;

const APP_DIR: &str = ".mooze";
const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "mooze.log";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine home directory")]
    NoHome,
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Marker for truncated lines
    pub ellipsis: Ellipsis,
    /// Window border glyph set name
    pub border_style: String,
    pub window: WindowConfig,
    pub mouse: bool,
    pub poll_interval_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ellipsis: Ellipsis::default(),
            border_style: "single".to_string(),
            window: WindowConfig::default(),
            mouse: false,
            poll_interval_ms: 50,
            log_level: "info".to_string(),
        }
    }
}

/// Window colors, by palette name or `#rrggbb`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub fg: String,
    pub bg: Option<String>,
    pub title_fg: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            fg: "default".to_string(),
            bg: None,
            title_fg: "magenta".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `~/.mooze/config.toml`.
    ///
    /// Problems are logged and the defaults used instead.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to `~/.mooze/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoHome)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        fs::write(path, content).map_err(write_err)
    }

    /// `~/.mooze`
    pub fn app_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(APP_DIR))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::app_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::app_dir().map(|dir| dir.join(LOG_FILE))
    }

    pub fn window_style(&self) -> Style {
        Style::from_names(&self.window.fg, self.window.bg.as_deref())
    }

    pub fn title_style(&self) -> Style {
        Style::from_names(&self.window.title_fg, self.window.bg.as_deref())
    }

    pub fn border(&self) -> BorderGlyphs {
        BorderGlyphs::by_name(&self.border_style)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Color;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("mooze-config-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ellipsis, Ellipsis::Long);
        assert_eq!(config.border(), BorderGlyphs::single());
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.window_style(), Style::default());
        assert_eq!(config.title_style().fg, Color::Indexed(13));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            ellipsis = ".."
            [window]
            bg = "navy"
            "#,
        )
        .unwrap();
        assert_eq!(config.ellipsis, Ellipsis::Short);
        assert_eq!(config.border_style, "single");
        assert_eq!(config.window.title_fg, "magenta");
        assert_eq!(config.window_style().bg, Some(Color::Indexed(4)));
    }

    #[test]
    fn test_bad_ellipsis_is_parse_error() {
        let result: Result<Config, _> = toml::from_str("ellipsis = \"....\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = scratch_file("saved.toml");
        let config = Config {
            border_style: "double".to_string(),
            mouse: true,
            poll_interval_ms: 20,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.border().top_left, '╔');

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_errors() {
        let err = Config::load_from(Path::new("/nonexistent/mooze.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let path = scratch_file("broken.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "mouse = maybe").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = Config {
            poll_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }
}
