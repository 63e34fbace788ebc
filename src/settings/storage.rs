//! Settings Storage
//!
//! File-based storage for the settings record: one JSON object in a single
//! file. Loading never fails on bad content; it validates and defaults.

use super::UserSettings;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

const SETTINGS_FILE: &str = "settings.json";

/// Settings storage manager
pub struct SettingsStorage {
    settings_path: PathBuf,
}

impl SettingsStorage {
    /// Storage at an explicit file path
    pub fn new(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Storage inside a data directory (useful for Docker/testing)
    pub fn with_dir(base_dir: PathBuf) -> Self {
        Self {
            settings_path: base_dir.join(SETTINGS_FILE),
        }
    }

    async fn ensure_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Load settings from disk. Missing, unreadable, or malformed content
    /// yields defaults for whatever could not be used.
    pub async fn load(&self) -> UserSettings {
        if !self.settings_path.exists() {
            info!("No settings file found, using defaults");
            return UserSettings::default();
        }

        let content = match fs::read_to_string(&self.settings_path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, path = ?self.settings_path, "Failed to read settings, using defaults");
                return UserSettings::default();
            }
        };

        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(value) => UserSettings::from_value(&value),
            Err(e) => {
                warn!(error = %e, "Settings file is not valid JSON, using defaults");
                UserSettings::default()
            }
        }
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &UserSettings) -> anyhow::Result<()> {
        self.ensure_dir().await?;
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.settings_path, content).await?;

        info!("Saved settings to {:?}", self.settings_path);
        Ok(())
    }
}
