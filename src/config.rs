//! Configuration for sockterm.
//!
//! Loads TOML configuration from `~/.sockterm/config.toml`:
//!
//! ```toml
//! # Endpoint of the terminal session service
//! url = "ws://127.0.0.1:8090/terminal"
//!
//! # Font size used to estimate cell geometry
//! font_size = 14.0
//!
//! # Retained output lines
//! scrollback_lines = 5000
//! ```
//!
//! Missing file or missing keys fall back to defaults; a malformed file is
//! ignored entirely.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::scrollback::MAX_SCROLLBACK;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Websocket endpoint of the session service
    pub url: String,
    /// Font size in points, for cell geometry estimation
    pub font_size: f64,
    /// Retained output lines
    pub scrollback_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8090/terminal".to_string(),
            font_size: 14.0,
            scrollback_lines: MAX_SCROLLBACK,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(content) = fs::read_to_string(&path) {
                    match toml::from_str(&content) {
                        Ok(config) => return config,
                        Err(e) => warn!(error = %e, "ignoring malformed config"),
                    }
                }
            }
        }
        Self::default()
    }

    /// Config file path, creating the directory if needed
    fn config_path() -> Option<PathBuf> {
        let dir = app_dir()?;
        Some(dir.join("config.toml"))
    }
}

/// Per-user application directory (`~/.sockterm`), created on first use.
pub fn app_dir() -> Option<PathBuf> {
    let home = home_dir()?;
    let dir = home.join(".sockterm");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.url, "ws://127.0.0.1:8090/terminal");
        assert_eq!(config.font_size, 14.0);
        assert_eq!(config.scrollback_lines, 5000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("url = \"wss://example.net/term\"").unwrap();
        assert_eq!(config.url, "wss://example.net/term");
        assert_eq!(config.font_size, 14.0);
        assert_eq!(config.scrollback_lines, 5000);
    }

    #[test]
    fn test_full_toml() {
        let config: Config = toml::from_str(
            "url = \"ws://host:9000/t\"\nfont_size = 16.0\nscrollback_lines = 1000\n",
        )
        .unwrap();
        assert_eq!(config.url, "ws://host:9000/t");
        assert_eq!(config.font_size, 16.0);
        assert_eq!(config.scrollback_lines, 1000);
    }
}
