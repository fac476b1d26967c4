//! Configuration for the macals binary
//!
//! Reads configuration from ~/.config/macals/config.toml

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Binary configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Sensor used by `read` and `get_current_lux` when no name is given
    #[serde(default)]
    pub sensor: Option<String>,

    /// List of disabled MCP tool names (all others are enabled)
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl Config {
    /// Get the config file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("macals").join("config.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::error!("Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!("Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Check if a tool is enabled
    pub fn is_enabled(&self, tool_name: &str) -> bool {
        !self.disabled.iter().any(|t| t == tool_name)
    }
}

/// Names of the MCP tools served by `macals serve`
pub fn all_tool_names() -> Vec<&'static str> {
    vec!["list_light_sensors", "find_light_sensor", "get_current_lux"]
}
