// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the platform config directory. Unknown fields are
//! ignored and missing fields take their defaults, so files written by
//! older versions keep loading.

use crate::constants::{DEFAULT_LOG_FILTER, app_info, export};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project texture coordinates when reconstructing
    pub need_texture: bool,
    /// Start sampling depth metrics as soon as frames arrive
    pub capture_metrics_on_start: bool,
    /// tracing filter used when RUST_LOG is not set
    pub log_filter: String,
    /// Directory for exported scenes (None = documents directory)
    pub export_dir: Option<PathBuf>,
    /// JPEG quality for embedded textures (1-100)
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            need_texture: false,
            capture_metrics_on_start: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            export_dir: None,
            jpeg_quality: export::DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut config: Config = serde_json::from_str(&contents)?;
        config.jpeg_quality = config.jpeg_quality.clamp(1, 100);
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load from `path` (or the default location), falling back to defaults
    /// when the file does not exist
    pub fn load_or_default(path: Option<&Path>) -> AppResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Export directory, falling back to the documents or home directory
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::document_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
