//! Engine configuration, stored as TOML.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames per second used to turn frame numbers into time
    pub fps: f64,
    /// Number of frames the command-line runner evaluates
    pub frames: u64,
    /// Time in seconds of frame 0
    pub start_time: f64,
    /// `env_logger` filter used when `RUST_LOG` is not set
    pub log_filter: String,
    /// Report re-entrant evaluation as an error instead of recursing
    pub cycle_guard: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            frames: 10,
            start_time: 0.0,
            log_filter: "info".to_string(),
            cycle_guard: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, LibraryError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        if config.fps <= 0.0 {
            return Err(LibraryError::runtime(format!(
                "fps must be positive, got {}",
                config.fps
            )));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let toml_str = fs::read_to_string(path)?;
        Self::from_toml(&toml_str)
    }

    /// Load `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded engine config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load config file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| LibraryError::runtime(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, toml_str)?;
        Ok(())
    }
}
