//! Configuration loading for TurnQueue.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the TurnQueue home directory (~/.turnqueue).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".turnqueue"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.turnqueue/settings.json
pub fn load_settings() -> Result<Settings> {
    let path = get_settings_path()?;

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let settings = parse_settings(&content)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Parse and validate a settings document.
pub fn parse_settings(content: &str) -> Result<Settings> {
    let settings: Settings = serde_json::from_str(content)?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.queue.ack_timeout_secs == 0 {
        return Err(Error::Config(
            "queue.ack_timeout_secs must be greater than zero".to_string(),
        ));
    }
    if settings.estimate.min_plausible_secs > settings.estimate.max_plausible_secs {
        return Err(Error::Config(format!(
            "estimate.min_plausible_secs ({}) exceeds estimate.max_plausible_secs ({})",
            settings.estimate.min_plausible_secs, settings.estimate.max_plausible_secs
        )));
    }
    Ok(())
}

/// Load settings or return default if not found.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

/// Telegram channel configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
}

/// Queue behaviour.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QueueConfig {
    /// How long a freshly assigned holder has to acknowledge before the turn moves on.
    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: u64,

    /// Where queue.json and estimate.json live. Defaults to ~/.turnqueue/db.
    pub data_dir: Option<PathBuf>,
}

fn default_ack_timeout_secs() -> u64 {
    7 * 60
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ack_timeout_secs: default_ack_timeout_secs(),
            data_dir: None,
        }
    }
}

impl QueueConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }

    /// Resolve the data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_home_dir()?.join("db")),
        }
    }
}

/// Hold-time estimate configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EstimateConfig {
    #[serde(default = "default_min_plausible_secs")]
    pub min_plausible_secs: u64,

    #[serde(default = "default_max_plausible_secs")]
    pub max_plausible_secs: u64,
}

fn default_min_plausible_secs() -> u64 {
    15 * 60
}

fn default_max_plausible_secs() -> u64 {
    2 * 60 * 60
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            min_plausible_secs: default_min_plausible_secs(),
            max_plausible_secs: default_max_plausible_secs(),
        }
    }
}

/// TurnQueue settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub estimate: EstimateConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = parse_settings("{}").unwrap();

        assert!(settings.telegram.bot_token.is_none());
        assert_eq!(settings.queue.ack_timeout(), Duration::from_secs(420));
        assert_eq!(settings.estimate.min_plausible_secs, 900);
        assert_eq!(settings.estimate.max_plausible_secs, 7200);
    }

    #[test]
    fn test_partial_sections() {
        let settings = parse_settings(
            r#"{"telegram": {"bot_token": "abc"}, "queue": {"data_dir": "/tmp/tq"}}"#,
        )
        .unwrap();

        assert_eq!(settings.telegram.bot_token.as_deref(), Some("abc"));
        assert_eq!(settings.queue.ack_timeout_secs, 420);
        assert_eq!(settings.queue.data_dir().unwrap(), PathBuf::from("/tmp/tq"));
    }

    #[test]
    fn test_zero_ack_timeout_rejected() {
        let err = parse_settings(r#"{"queue": {"ack_timeout_secs": 0}}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_inverted_band_rejected() {
        let err = parse_settings(
            r#"{"estimate": {"min_plausible_secs": 600, "max_plausible_secs": 60}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
