use anyhow::{anyhow, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Position;
use crate::random::DelayRange;

const APP_DIR: &str = "retro-messenger";

/// Where new chat windows appear and how far each one cascades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub origin: Position,
    pub cascade_offset: i32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        WindowSettings {
            origin: Position { x: 100, y: 100 },
            cascade_offset: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub presence_interval_ms: u64,
    pub response_delay: DelayRange,
    pub typing_delay: DelayRange,
    pub nudge_delay: DelayRange,
    pub login_delay_ms: u64,
    pub windows: WindowSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            presence_interval_ms: 30_000,
            response_delay: DelayRange::new(2_000, 5_000),
            typing_delay: DelayRange::new(1_000, 3_000),
            nudge_delay: DelayRange::new(1_000, 3_000),
            login_delay_ms: 1_000,
            windows: WindowSettings::default(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Loads the config file at `path`, or the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed config {}", path.display()))?;
        config.validate()?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.presence_interval_ms == 0 {
            return Err(anyhow!("presence_interval_ms must be greater than zero"));
        }
        for (name, range) in [
            ("response_delay", self.response_delay),
            ("typing_delay", self.typing_delay),
            ("nudge_delay", self.nudge_delay),
        ] {
            if range.min_ms > range.max_ms {
                return Err(anyhow!("{}: min_ms is larger than max_ms", name));
            }
        }
        Ok(())
    }

    pub fn presence_interval(&self) -> Duration {
        Duration::from_millis(self.presence_interval_ms)
    }

    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }

    /// Directory for durable session state.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        Ok(dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?
            .join(APP_DIR))
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join(APP_DIR)
        .join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("config.json"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.presence_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"presence_interval_ms": 5000, "windows": {"cascade_offset": 12}}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.presence_interval_ms, 5000);
        assert_eq!(config.windows.cascade_offset, 12);
        assert_eq!(config.windows.origin, Position { x: 100, y: 100 });
        assert_eq!(config.response_delay, DelayRange::new(2000, 5000));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, "not json").unwrap();
        assert!(Config::load(Some(&path)).is_err());

        fs::write(&path, r#"{"typing_delay": {"min_ms": 9, "max_ms": 1}}"#).unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config { data_dir: Some(PathBuf::from("/tmp/msn")), ..Config::default() };
        assert_eq!(config.storage_dir().unwrap(), PathBuf::from("/tmp/msn"));
    }
}
