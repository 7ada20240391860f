//! Voice channel defaults loaded from config.toml.
//!
//! Operators can tune join-to-create behavior through an optional `[voice]`
//! table in the configuration file. Every field has a default, and a missing
//! or partial file yields a fully usable configuration.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the config.toml file.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Voice channel lifecycle settings.
    #[serde(default)]
    pub voice: VoiceDefaults,
}

/// Defaults and limits for temporary voice channels.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VoiceDefaults {
    /// Seconds a user must wait between temporary channel creations.
    pub cooldown_seconds: u64,
    /// Maximum number of users tracked by the creation cooldown at once.
    pub cooldown_capacity: usize,
    /// Channel name template applied when a trigger has none configured.
    pub default_name_template: String,
    /// Lowest accepted channel bitrate in bits per second.
    pub min_bitrate: u32,
    /// Highest accepted channel bitrate in bits per second.
    pub max_bitrate: u32,
    /// Highest accepted user limit (Discord caps voice channels at 99).
    pub max_user_limit: u16,
    /// Channel names longer than this are truncated.
    pub max_name_length: usize,
}

impl Default for VoiceDefaults {
    fn default() -> Self {
        Self {
            cooldown_seconds: 2,
            cooldown_capacity: 1_000,
            default_name_template: "{username}'s channel".to_string(),
            min_bitrate: 8_000,
            max_bitrate: 384_000,
            max_user_limit: 99,
            max_name_length: 100,
        }
    }
}

/// Loads voice defaults from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid. A
/// file without a `[voice]` table parses to the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<VoiceDefaults> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    Ok(config.voice)
}

/// Loads voice defaults from the default location (./config.toml), falling
/// back to the built-in defaults when the file does not exist.
#[must_use]
pub fn load_default_config() -> VoiceDefaults {
    load_config("config.toml").unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_voice_config() {
        let toml_str = r#"
            [voice]
            cooldown_seconds = 5
            default_name_template = "{displayname}'s room"
            max_user_limit = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.voice.cooldown_seconds, 5);
        assert_eq!(config.voice.default_name_template, "{displayname}'s room");
        assert_eq!(config.voice.max_user_limit, 10);
        // Unspecified fields keep their defaults.
        assert_eq!(config.voice.max_bitrate, 384_000);
        assert_eq!(config.voice.max_name_length, 100);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.voice.cooldown_seconds, 2);
        assert_eq!(config.voice.default_name_template, "{username}'s channel");
    }
}
