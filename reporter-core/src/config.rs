use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{ReporterError, Units, store::DEFAULT_LOG_FILE};

/// Environment variable holding the OpenWeather API key.
pub const API_KEY_VAR: &str = "OPENWEATHER_API_KEY";

/// Preferences stored on disk. The API key is never stored here.
///
/// Example TOML:
/// ```toml
/// units = "imperial"
/// csv_path = "/home/me/weather_log.csv"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// "metric", "imperial" or "standard"; metric when absent.
    pub units: Option<String>,

    /// Where the lookup log lives; `weather_log.csv` in the working directory when absent.
    pub csv_path: Option<PathBuf>,

    /// Request timeout; the HTTP client's default when absent.
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Configured unit system as a strongly-typed value.
    pub fn units(&self) -> Result<Units> {
        match &self.units {
            Some(s) => Units::try_from(s.as_str()),
            None => Ok(Units::default()),
        }
    }

    pub fn set_units(&mut self, units: Units) {
        self.units = Some(units.as_str().to_string());
    }

    pub fn csv_path(&self) -> PathBuf {
        self.csv_path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-reporter", "weather-reporter")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Read the API key from [`API_KEY_VAR`], failing before any network call.
pub fn api_key_from_env() -> Result<String, ReporterError> {
    api_key_from(env::var(API_KEY_VAR).ok())
}

fn api_key_from(value: Option<String>) -> Result<String, ReporterError> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(ReporterError::Auth(format!(
            "{API_KEY_VAR} is not set (hint: export {API_KEY_VAR}=<your key>)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::default();
        assert_eq!(cfg.units().unwrap(), Units::Metric);
        assert_eq!(cfg.csv_path(), PathBuf::from("weather_log.csv"));
    }

    #[test]
    fn set_units_overrides_default() {
        let mut cfg = Config::default();
        cfg.set_units(Units::Standard);
        assert_eq!(cfg.units().unwrap(), Units::Standard);
    }

    #[test]
    fn invalid_units_surface_on_use() {
        let cfg = Config { units: Some("rankine".into()), ..Config::default() };
        assert!(cfg.units().is_err());
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_preserves_preferences() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let cfg = Config {
            units: Some("imperial".into()),
            csv_path: Some(PathBuf::from("/var/tmp/log.csv")),
            timeout_secs: Some(7),
        };

        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn broken_toml_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "units = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn missing_or_blank_key_is_auth_error() {
        for value in [None, Some(String::new()), Some("   ".to_string())] {
            let err = api_key_from(value).unwrap_err();
            assert!(matches!(err, ReporterError::Auth(_)));
            assert!(err.to_string().contains(API_KEY_VAR));
        }
    }

    #[test]
    fn key_is_trimmed() {
        assert_eq!(api_key_from(Some(" abc123\n".into())).unwrap(), "abc123");
    }
}
