//! Shared test utilities for Guildkeeper.
//!
//! This module provides common helper functions for setting up test storage
//! backends and a scriptable in-memory stand-in for the Discord voice
//! platform.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use tracing_subscriber::EnvFilter;

use crate::errors::{Error, Result};
use crate::storage::RelationalBackend;
use crate::voice::platform::{CreateVoiceChannel, MemberInfo, VoicePlatform};

/// Initializes a tracing subscriber for test output.
///
/// Safe to call from every test; repeated initialization is a no-op.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with the full storage schema.
/// This is the standard setup for relational backend tests.
///
/// # Errors
/// Returns an error when the connection or schema setup fails.
pub async fn setup_relational_backend() -> Result<RelationalBackend> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    let backend = RelationalBackend::from_connection(db);
    backend.ensure_schema().await?;
    Ok(backend)
}

/// Builds a human member with sensible defaults.
///
/// # Arguments
/// * `id` - Discord user ID, must be non-zero
/// * `username` - Account name, also used as the visible name
#[must_use]
pub fn member(id: u64, username: &str) -> MemberInfo {
    MemberInfo {
        user_id: UserId::new(id),
        username: username.to_string(),
        display_name: None,
        tag: None,
        bot: false,
    }
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    locations: HashMap<UserId, Option<ChannelId>>,
    location_scripts: HashMap<UserId, VecDeque<Option<ChannelId>>>,
    members: HashMap<ChannelId, Vec<MemberInfo>>,
    guild_names: HashMap<GuildId, String>,
    channel_names: HashMap<ChannelId, String>,
    deny_creation: bool,
    created: Vec<(GuildId, CreateVoiceChannel)>,
    created_ids: Vec<ChannelId>,
    deleted: Vec<(ChannelId, String)>,
    moved: Vec<(UserId, ChannelId)>,
    renamed: Vec<(ChannelId, String)>,
    dms: Vec<(UserId, String)>,
}

/// In-memory [`VoicePlatform`] that records every side effect.
///
/// Member locations can either be placed directly or scripted as a
/// sequence, which lets a test drive the lifecycle through the
/// "member disconnected mid-creation" races deterministically.
#[derive(Debug)]
pub struct MockVoicePlatform {
    state: Mutex<MockState>,
}

impl Default for MockVoicePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVoicePlatform {
    /// Creates an empty platform. Created channels get IDs from 9000 up.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 9000,
                ..MockState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Puts a member into a voice channel, or nowhere with `None`.
    pub fn place_member(&self, user: UserId, channel: Option<ChannelId>) {
        self.state().locations.insert(user, channel);
    }

    /// Scripts the next location lookups for a member. Each query consumes
    /// one entry before falling back to the placed location.
    pub fn script_member_location(&self, user: UserId, sequence: Vec<Option<ChannelId>>) {
        self.state().location_scripts.insert(user, sequence.into());
    }

    /// Sets the member list reported for a channel.
    pub fn set_channel_members(&self, channel: ChannelId, members: Vec<MemberInfo>) {
        self.state().members.insert(channel, members);
    }

    /// Sets the name reported for a guild.
    pub fn set_guild_name(&self, guild: GuildId, name: &str) {
        self.state().guild_names.insert(guild, name.to_string());
    }

    /// Sets the name reported for a channel.
    pub fn set_channel_name(&self, channel: ChannelId, name: &str) {
        self.state().channel_names.insert(channel, name.to_string());
    }

    /// Makes channel creation fail with a permission error.
    pub fn set_deny_creation(&self, deny: bool) {
        self.state().deny_creation = deny;
    }

    /// Every creation request received, in order.
    #[must_use]
    pub fn created(&self) -> Vec<(GuildId, CreateVoiceChannel)> {
        self.state().created.clone()
    }

    /// IDs handed out for created channels, in order.
    #[must_use]
    pub fn created_ids(&self) -> Vec<ChannelId> {
        self.state().created_ids.clone()
    }

    /// Every deletion, with the audit log reason.
    #[must_use]
    pub fn deleted(&self) -> Vec<(ChannelId, String)> {
        self.state().deleted.clone()
    }

    /// Every member move.
    #[must_use]
    pub fn moved(&self) -> Vec<(UserId, ChannelId)> {
        self.state().moved.clone()
    }

    /// Every rename.
    #[must_use]
    pub fn renamed(&self) -> Vec<(ChannelId, String)> {
        self.state().renamed.clone()
    }

    /// Every direct message sent.
    #[must_use]
    pub fn dms(&self) -> Vec<(UserId, String)> {
        self.state().dms.clone()
    }
}

#[async_trait]
impl VoicePlatform for MockVoicePlatform {
    async fn create_voice_channel(
        &self,
        guild: GuildId,
        request: CreateVoiceChannel,
    ) -> Result<ChannelId> {
        let mut state = self.state();
        if state.deny_creation {
            return Err(Error::Permission {
                message: "Missing Permissions".to_string(),
            });
        }
        let id = ChannelId::new(state.next_id);
        state.next_id += 1;
        state.created.push((guild, request));
        state.created_ids.push(id);
        Ok(id)
    }

    async fn delete_channel(&self, channel: ChannelId, reason: &str) -> Result<()> {
        self.state().deleted.push((channel, reason.to_string()));
        Ok(())
    }

    async fn move_member(&self, _guild: GuildId, user: UserId, channel: ChannelId) -> Result<()> {
        let mut state = self.state();
        state.moved.push((user, channel));
        state.locations.insert(user, Some(channel));
        Ok(())
    }

    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<()> {
        self.state().renamed.push((channel, name.to_string()));
        Ok(())
    }

    async fn send_direct_message(&self, user: UserId, content: &str) -> Result<()> {
        self.state().dms.push((user, content.to_string()));
        Ok(())
    }

    async fn channel_members(
        &self,
        _guild: GuildId,
        channel: ChannelId,
    ) -> Result<Vec<MemberInfo>> {
        Ok(self.state().members.get(&channel).cloned().unwrap_or_default())
    }

    async fn member_voice_channel(
        &self,
        _guild: GuildId,
        user: UserId,
    ) -> Result<Option<ChannelId>> {
        let mut state = self.state();
        let scripted = state
            .location_scripts
            .get_mut(&user)
            .and_then(VecDeque::pop_front);
        if let Some(next) = scripted {
            return Ok(next);
        }
        Ok(state.locations.get(&user).copied().flatten())
    }

    async fn guild_name(&self, guild: GuildId) -> Result<Option<String>> {
        Ok(self.state().guild_names.get(&guild).cloned())
    }

    async fn channel_name(&self, channel: ChannelId) -> Result<Option<String>> {
        Ok(self.state().channel_names.get(&channel).cloned())
    }
}
