//! Desk configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Directory name under the platform data dir
const DATA_DIR_NAME: &str = "deskgate";

/// Installation-wide settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeskConfig {
    /// Where the user registry and block record are kept
    #[serde(default = "DeskConfig::default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
        }
    }
}

impl DeskConfig {
    /// Platform data directory, falling back to the working directory
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DATA_DIR_NAME)
    }

    /// Create config with custom data directory
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}
