//! Per-guild join-to-create settings.
//!
//! One JSON document per guild, persisted through the storage facade under
//! `guild:<id>:jointocreate`. The document tracks which channels act as
//! creation triggers, per-trigger overrides, and every live temporary
//! channel with its owner, so the manager can recover its state from
//! storage after a restart.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, GuildId, UserId};

/// Storage key for a guild's join-to-create document.
#[must_use]
pub fn settings_key(guild: GuildId) -> String {
    format!("guild:{guild}:jointocreate")
}

/// Per-trigger overrides. Unset fields fall back to the crate-wide
/// [`crate::config::voice::VoiceDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerOptions {
    /// Name template for channels created from this trigger.
    pub name_template: Option<String>,
    /// Member cap for created channels, zero meaning unlimited.
    pub user_limit: Option<u16>,
    /// Bitrate for created channels in bits per second.
    pub bitrate: Option<u32>,
    /// Category to create channels under, overriding the guild default.
    pub category_id: Option<ChannelId>,
}

/// A live temporary channel, keyed in the settings by its channel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempChannel {
    /// Member who currently owns the channel.
    pub owner_id: UserId,
    /// Trigger the channel was created from.
    pub trigger_channel_id: ChannelId,
}

/// The full join-to-create configuration and runtime state of one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildVoiceSettings {
    /// Feature switch. Disabled guilds keep their configuration.
    pub enabled: bool,
    /// Voice channels that spawn a temporary channel when joined.
    pub trigger_channels: HashSet<ChannelId>,
    /// Per-trigger overrides.
    pub channel_options: HashMap<ChannelId, TriggerOptions>,
    /// Live temporary channels by channel id.
    pub temporary_channels: HashMap<ChannelId, TempChannel>,
    /// Default category for created channels.
    pub category_id: Option<ChannelId>,
}

impl GuildVoiceSettings {
    /// Whether `channel` is a configured trigger.
    #[must_use]
    pub fn is_trigger(&self, channel: ChannelId) -> bool {
        self.trigger_channels.contains(&channel)
    }

    /// The temporary channel `user` currently owns, if any.
    #[must_use]
    pub fn owned_channel(&self, user: UserId) -> Option<ChannelId> {
        self.temporary_channels
            .iter()
            .find(|(_, record)| record.owner_id == user)
            .map(|(channel, _)| *channel)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_settings_key_shape() {
        assert_eq!(settings_key(GuildId::new(123)), "guild:123:jointocreate");
    }

    #[test]
    fn test_document_round_trip() {
        let mut settings = GuildVoiceSettings {
            enabled: true,
            category_id: Some(ChannelId::new(5)),
            ..GuildVoiceSettings::default()
        };
        settings.trigger_channels.insert(ChannelId::new(10));
        settings.channel_options.insert(
            ChannelId::new(10),
            TriggerOptions {
                name_template: Some("{username}'s den".to_string()),
                user_limit: Some(4),
                ..TriggerOptions::default()
            },
        );
        settings.temporary_channels.insert(
            ChannelId::new(77),
            TempChannel {
                owner_id: UserId::new(9),
                trigger_channel_id: ChannelId::new(10),
            },
        );

        let encoded = serde_json::to_value(&settings).unwrap();
        let decoded: GuildVoiceSettings = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, settings);
        assert!(decoded.is_trigger(ChannelId::new(10)));
        assert_eq!(decoded.owned_channel(UserId::new(9)), Some(ChannelId::new(77)));
    }

    #[test]
    fn test_partial_document_parses_with_defaults() {
        // Documents written by older versions may lack newer fields.
        let decoded: GuildVoiceSettings = serde_json::from_str(r#"{ "enabled": true }"#).unwrap();
        assert!(decoded.enabled);
        assert!(decoded.trigger_channels.is_empty());
        assert!(decoded.temporary_channels.is_empty());
        assert_eq!(decoded.category_id, None);
    }
}
