//! Shell settings

use std::path::PathBuf;

use anyhow::{Context, Result};
use gsw_mux::ControllerConfig;
use gsw_sim::DriverState;
use serde::{Deserialize, Serialize};

/// Persisted shell settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Switch-mode controller configuration
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Simulated driver state, carried between runs
    #[serde(default)]
    pub driver: DriverState,
}

impl Settings {
    /// Get the XDG config directory for gswitch
    /// Uses $XDG_CONFIG_HOME/gswitch when set, falls back to ~/.config/gswitch
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("gswitch"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("gswitch"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().context("could not determine settings path")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("failed to serialize settings")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use gsw_mux::Gpu;

    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());

        let settings: Settings =
            serde_json::from_str(r#"{"controller":{"settle_delay_ms":5}}"#).unwrap();
        assert_eq!(settings.controller.settle_delay_ms, 5);
        assert_eq!(settings.controller.nonzero_active_card, Gpu::Discrete);
    }

    #[test]
    fn test_round_trip() {
        let mut settings = Settings::default();
        settings.driver = settings.driver.on_discrete();

        let json = serde_json::to_string_pretty(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();

        assert_eq!(back, settings);
    }
}
