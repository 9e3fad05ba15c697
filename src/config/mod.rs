//! Configuration for the feed runtime.
//!
//! Read from `~/.config/clipstream/config.toml` at startup. A default
//! file with comments is written on first run; missing fields fall back
//! to defaults.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::app::{ClipstreamError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub downloads: DownloadConfig,
    pub gestures: GestureConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the feed service; endpoints are joined onto it.
    pub base_url: String,
    /// Base URL used to build shareable deep links.
    pub share_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Where saved media lands; defaults to the user download dir.
    pub dir: Option<PathBuf>,
    /// Center watermark opacity, 0.0–1.0.
    pub watermark_opacity: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Double-tap window in milliseconds.
    pub double_tap_window_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            downloads: DownloadConfig::default(),
            gestures: GestureConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.clipstream.app/".into(),
            share_base_url: "https://clipstream.app/".into(),
            timeout_secs: 10,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: None,
            watermark_opacity: 0.45,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: 300,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ClipstreamError::Config(format!("{}: {}", config_path.display(), e)))?;
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ClipstreamError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("clipstream").join("config.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.gestures.double_tap_window_ms)
    }

    /// Resolved download directory.
    pub fn download_dir(&self) -> PathBuf {
        self.downloads
            .dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn create_default_config(path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(Self::default_config_content().as_bytes())?;
        Ok(())
    }

    fn default_config_content() -> &'static str {
        r#"# clipstream configuration

[api]
# Feed service base URL.
# base_url = "https://api.clipstream.app/"
# Base URL for shareable deep links.
# share_base_url = "https://clipstream.app/"
# Request timeout in seconds.
# timeout_secs = 10

[downloads]
# Where saved media is written. Defaults to your download directory.
# dir = "/home/you/Downloads"
# Watermark opacity, 0.0 - 1.0.
# watermark_opacity = 0.45

[gestures]
# Double-tap detection window in milliseconds.
# double_tap_window_ms = 300
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.gestures.double_tap_window_ms, 300);
        assert!((config.downloads.watermark_opacity - 0.45).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://staging.clipstream.app/"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://staging.clipstream.app/");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.gestures.double_tap_window_ms, 300);
    }

    #[test]
    fn test_default_config_content_parses() {
        let config: Config = toml::from_str(Config::default_config_content()).unwrap();
        assert_eq!(config.api.base_url, Config::default().api.base_url);
    }
}
