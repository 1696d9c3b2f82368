// Runtime configuration for the chat core
//
// Values come from built-in defaults, then an optional JSON file, then
// CHATSPHERE_* environment variables.

use anyhow::{anyhow, Result};
use log::{info, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// What auto-advance does after the last story of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryEndBehavior {
    /// Close the viewer
    Close,
    /// Wrap around to the first story
    Loop,
    /// Stay on the last story at full progress
    Hold,
}

impl std::str::FromStr for StoryEndBehavior {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "close" => Ok(StoryEndBehavior::Close),
            "loop" => Ok(StoryEndBehavior::Loop),
            "hold" => Ok(StoryEndBehavior::Hold),
            other => Err(ConfigError::InvalidValue {
                key: "story_end".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Errors produced while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A duration or size that must be positive was zero
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    /// A value could not be parsed
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Delay before a composed message is marked delivered
    pub delivery_delay_ms: u64,
    /// How long each story stays on screen
    pub story_duration_ms: u64,
    /// Story ticker period
    pub tick_period_ms: u64,
    pub story_end: StoryEndBehavior,
    /// Capacity of the event channels handed to the presenter
    pub event_buffer: usize,
    /// Period of the typing indicator dot animation
    pub typing_interval_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            delivery_delay_ms: 1000,
            story_duration_ms: 5000,
            tick_period_ms: 100,
            story_end: StoryEndBehavior::Close,
            event_buffer: 100,
            typing_interval_ms: 500,
        }
    }
}

impl ChatConfig {
    pub fn delivery_delay(&self) -> Duration {
        Duration::from_millis(self.delivery_delay_ms)
    }

    pub fn story_duration(&self) -> Duration {
        Duration::from_millis(self.story_duration_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing_interval_ms)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.story_duration_ms == 0 {
            return Err(ConfigError::ZeroValue("story_duration_ms"));
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroValue("tick_period_ms"));
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::ZeroValue("event_buffer"));
        }
        if self.typing_interval_ms == 0 {
            return Err(ConfigError::ZeroValue("typing_interval_ms"));
        }
        Ok(())
    }

    /// Apply CHATSPHERE_* environment overrides on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_u64("CHATSPHERE_DELIVERY_DELAY_MS")? {
            self.delivery_delay_ms = value;
        }
        if let Some(value) = env_u64("CHATSPHERE_STORY_DURATION_MS")? {
            self.story_duration_ms = value;
        }
        if let Some(value) = env_u64("CHATSPHERE_TICK_PERIOD_MS")? {
            self.tick_period_ms = value;
        }
        if let Ok(value) = env::var("CHATSPHERE_STORY_END") {
            self.story_end = value.parse()?;
        }
        Ok(())
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| {
                ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.clone(),
                }
                .into()
            }),
        Err(_) => Ok(None),
    }
}

static CONFIG_PATH_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Point config loading at an explicit file (set once, from the command line)
pub fn set_config_path_override(path: PathBuf) {
    if CONFIG_PATH_OVERRIDE.set(path).is_err() {
        warn!("Config path override already set; ignoring new value");
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("chatsphere");
    Ok(config_dir)
}

fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = CONFIG_PATH_OVERRIDE.get() {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("config.json"))
}

/// Read a config file. Missing fields fall back to their defaults.
pub fn load_config_file(path: &Path) -> Result<ChatConfig> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let config: ChatConfig = serde_json::from_str(&contents)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Defaults, then the config file if there is one, then environment overrides
pub fn load_config() -> Result<ChatConfig> {
    let path = get_config_path()?;

    let mut config = if path.exists() {
        load_config_file(&path)?
    } else {
        if CONFIG_PATH_OVERRIDE.get().is_some() {
            warn!("Config file {} does not exist, using defaults", path.display());
        }
        ChatConfig::default()
    };

    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = ChatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.delivery_delay(), Duration::from_millis(1000));
        assert_eq!(config.story_duration(), Duration::from_millis(5000));
        assert_eq!(config.tick_period(), Duration::from_millis(100));
        assert_eq!(config.story_end, StoryEndBehavior::Close);
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{ "story_duration_ms": 3000, "story_end": "loop" }}"#)?;

        let config = load_config_file(file.path())?;
        assert_eq!(config.story_duration_ms, 3000);
        assert_eq!(config.story_end, StoryEndBehavior::Loop);
        assert_eq!(config.delivery_delay_ms, 1000);
        Ok(())
    }

    #[test]
    fn test_zero_tick_period_rejected() {
        let config = ChatConfig {
            tick_period_ms: 0,
            ..ChatConfig::default()
        };
        match config.validate() {
            Err(ConfigError::ZeroValue(field)) => assert_eq!(field, "tick_period_ms"),
            other => panic!("Expected ZeroValue error, got {:?}", other),
        }
    }

    #[test]
    fn test_story_end_parsing() {
        assert_eq!("Hold".parse::<StoryEndBehavior>().ok(), Some(StoryEndBehavior::Hold));
        assert!("stall".parse::<StoryEndBehavior>().is_err());
    }
}
