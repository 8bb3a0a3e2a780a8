//! Application settings and paths.
//!
//! Settings live in an optional JSON file under the XDG config directory
//! (`~/.config/pythodan/settings.json`). Every field is optional; command-line
//! flags and environment variables take precedence.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::batch::DEFAULT_INTERVAL;
use crate::query::shodan::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/pythodan)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform directories. Nothing is created on disk.
    pub fn discover() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "pythodan", "pythodan").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Shodan API key.
    pub api_key: Option<String>,
    /// Minimum gap between queries in milliseconds.
    pub min_interval_ms: u64,
    /// API base URL.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Directory for CSV reports; the working directory when unset.
    pub output_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            min_interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            output_dir: None,
        }
    }
}

impl Settings {
    /// Load settings from the default location, or defaults if absent.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::discover()?.settings_file();

        if !file.exists() {
            debug!(path = %file.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.min_interval(), Duration::from_secs(1));
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.api_base_url, "https://api.shodan.io");
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"api_key": "abc123", "min_interval_ms": 1500}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("abc123"));
        assert_eq!(settings.min_interval(), Duration::from_millis(1500));
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(ConfigError::InvalidFormat(_))
        ));
        assert!(matches!(
            Settings::load_from(&dir.path().join("missing.json")),
            Err(ConfigError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }
}
