// Import necessary libraries and modules for file I/O and serialization.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub const SETTINGS_FILE: &str = "settings.json";

// Application settings, stored as JSON next to the character data.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub data_dir: Option<PathBuf>, // Overrides ~/mettle/data when set.
    pub roll_clear_seconds: u64,   // How long a power roll result stays on screen.
    pub portrait_timeout_seconds: u64,
    pub storage_quota_bytes: u64, // Upper bound for everything the stores write.
    pub debug_mode: bool,         // Enables debug level logging.
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: None,
            roll_clear_seconds: 5,
            portrait_timeout_seconds: 10,
            storage_quota_bytes: 5 * 1024 * 1024,
            debug_mode: false,
        }
    }
}

impl Settings {
    /// Default data directory: `~/mettle/data`.
    pub fn default_data_dir() -> Result<PathBuf> {
        dir::home_dir()
            .map(|home| home.join("mettle").join("data"))
            .ok_or(AppError::NoHomeDir)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(path) => Ok(path.clone()),
            None => Self::default_data_dir(),
        }
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_data_dir()?.join(SETTINGS_FILE))
    }

    // Load settings from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::default_path()
            .ok()
            .and_then(|path| Self::load_settings_from_file(path).ok())
            .unwrap_or_default()
    }

    // Save current settings to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to_file(Self::default_path()?)?;
        Ok(())
    }

    pub fn load_settings_from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = Settings {
            roll_clear_seconds: 9,
            debug_mode: true,
            ..Settings::default()
        };
        settings.save_to_file(&path).unwrap();
        let loaded = Settings::load_settings_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"debug_mode": true}"#).unwrap();
        assert!(settings.debug_mode);
        assert_eq!(settings.roll_clear_seconds, 5);
        assert_eq!(settings.storage_quota_bytes, 5 * 1024 * 1024);
    }
}
