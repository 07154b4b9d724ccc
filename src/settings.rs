//! Service settings (TOML)

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    /// Empty logs to stderr only
    pub dir: String,
    pub file: String,
    pub max_file_size: u64,
    pub max_files: usize,
    /// Lowest level also copied to stderr when logging to files ("off" for none)
    pub stderr: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "rolegate".to_string(),
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_files: 5,
            stderr: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// JSON permission configuration read at startup
    pub permissions_file: String,
    /// Snapshot store directory; no persistence when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            permissions_file: "config/permissions.json".to_string(),
            store_path: None,
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(s)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
