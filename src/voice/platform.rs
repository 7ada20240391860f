//! Platform boundary for voice channel operations.
//!
//! The lifecycle manager never talks to Discord directly. Every outbound
//! action and every state query goes through [`VoicePlatform`], implemented
//! over serenity's HTTP client in the running bot and over a scripted mock
//! in tests. Inbound gateway events are reduced by the caller to
//! [`VoiceStateChange`] values before they reach the manager.

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};

use crate::errors::Result;

/// Identity of a member as needed for channel naming and ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Discord user ID.
    pub user_id: UserId,
    /// Account username.
    pub username: String,
    /// Guild nickname or global display name, when set.
    pub display_name: Option<String>,
    /// Legacy `name#discriminator` tag, when the account still has one.
    pub tag: Option<String>,
    /// Bot accounts never get temporary channels.
    pub bot: bool,
}

impl MemberInfo {
    /// The name members see in the client, preferring the display name.
    #[must_use]
    pub fn visible_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// A reduced voice state update: where the member was and where they are
/// now. Either side is `None` when the member was not in a voice channel.
#[derive(Debug, Clone)]
pub struct VoiceStateChange {
    /// Guild the update happened in.
    pub guild_id: GuildId,
    /// Channel the member was connected to before the update.
    pub previous_channel: Option<ChannelId>,
    /// Channel the member is connected to after the update.
    pub new_channel: Option<ChannelId>,
    /// The member the update is about.
    pub member: MemberInfo,
}

/// Parameters for creating a temporary voice channel. The platform
/// implementation grants `owner` elevated permissions (manage channel,
/// move members) on the created channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateVoiceChannel {
    /// Rendered channel name.
    pub name: String,
    /// Category to create the channel under, guild root when `None`.
    pub category: Option<ChannelId>,
    /// Bits per second, already clamped to the platform's accepted range.
    pub bitrate: u32,
    /// Maximum members, zero meaning unlimited.
    pub user_limit: u16,
    /// Member the channel belongs to.
    pub owner: UserId,
}

/// Discord operations the lifecycle manager depends on.
///
/// Implementations should map missing-permission responses to
/// [`crate::errors::Error::Permission`] so the manager can tell an operator
/// mistake from a transient failure.
#[async_trait]
pub trait VoicePlatform: Send + Sync + 'static {
    /// Creates a voice channel and returns its id.
    async fn create_voice_channel(
        &self,
        guild: GuildId,
        request: CreateVoiceChannel,
    ) -> Result<ChannelId>;

    /// Deletes a channel with an audit log reason.
    async fn delete_channel(&self, channel: ChannelId, reason: &str) -> Result<()>;

    /// Moves a connected member into another voice channel.
    async fn move_member(&self, guild: GuildId, user: UserId, channel: ChannelId) -> Result<()>;

    /// Renames a channel.
    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<()>;

    /// Sends a direct message to a user.
    async fn send_direct_message(&self, user: UserId, content: &str) -> Result<()>;

    /// Members currently connected to a voice channel.
    async fn channel_members(&self, guild: GuildId, channel: ChannelId) -> Result<Vec<MemberInfo>>;

    /// The voice channel a member is connected to right now, if any.
    async fn member_voice_channel(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<ChannelId>>;

    /// Display name of a guild, `None` when unknown to the platform.
    async fn guild_name(&self, guild: GuildId) -> Result<Option<String>>;

    /// Display name of a channel, `None` when unknown to the platform.
    async fn channel_name(&self, channel: ChannelId) -> Result<Option<String>>;
}
