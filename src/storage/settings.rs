//! Settings persistence.
//!
//! Cross-platform: the file lives in the OS config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{DriverConfig, ProfileConfig};
use crate::error::{SettingsError, SettingsResult};

// =============================================================================
// Config Path
// =============================================================================

const APP_NAME: &str = "colorcal";
const CONFIG_FILE: &str = "config.json";

/// Get the configuration directory path.
/// - Linux: ~/.config/colorcal/
/// - Windows: %APPDATA%\colorcal\
pub fn get_config_dir() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or(SettingsError::NoConfigDir)
}

/// Get the full path to the settings file.
pub fn get_config_path() -> SettingsResult<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

// =============================================================================
// Settings
// =============================================================================

/// Everything persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub profiles: ProfileConfig,
}

/// Load settings from `path`. A missing file gives the defaults.
pub fn load_settings_from(path: &Path) -> SettingsResult<AppSettings> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Write settings to `path` as pretty JSON, creating parent directories.
pub fn save_settings_to(path: &Path, settings: &AppSettings) -> SettingsResult<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load settings from the default location.
pub fn load_settings() -> SettingsResult<AppSettings> {
    load_settings_from(&get_config_path()?)
}

/// Save settings to the default location.
pub fn save_settings(settings: &AppSettings) -> SettingsResult<()> {
    save_settings_to(&get_config_path()?, settings)
}

/// Create the settings file with defaults if it does not exist yet.
///
/// Returns the path of the file.
pub fn ensure_settings_exist() -> SettingsResult<PathBuf> {
    let path = get_config_path()?;
    if !path.exists() {
        info!(path = %path.display(), "creating default settings");
        save_settings_to(&path, &AppSettings::default())?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut settings = AppSettings::default();
        settings.driver.failure_policy = FailurePolicy::Resubmit;
        settings.profiles.search_dirs = vec![PathBuf::from("/opt/icc")];
        save_settings_to(&path, &settings).unwrap();

        assert_eq!(load_settings_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "driver": { "control_timeout_ms": 500 } }"#).unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.driver.control_timeout_ms, 500);
        assert_eq!(settings.profiles, ProfileConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_settings_from(&path), Err(SettingsError::Json(_))));
    }
}
