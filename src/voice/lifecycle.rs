//! Join-to-create channel lifecycle.
//!
//! Members joining a configured trigger channel get their own temporary
//! voice channel: created on demand, owned by the creator, cleaned up when
//! it empties, and handed to the next member when the owner leaves. The
//! manager is driven entirely by reduced voice state events and channel
//! deletion notifications; it keeps no in-process channel state beyond the
//! creation cooldown, reading and writing the per-guild settings document
//! through the storage facade so state survives restarts.
//!
//! Event handlers never fail outward. Platform errors after a side effect
//! are logged and swallowed; errors before one abort the transition
//! cleanly. The settings CRUD used by command handlers does return errors,
//! since those surface directly to the invoking user.

use std::sync::Arc;
use std::time::Duration;

use serenity::model::id::{ChannelId, GuildId, UserId};
use tracing::{debug, info, warn};

use crate::config::voice::VoiceDefaults;
use crate::errors::{Error, Result};
use crate::storage::StorageService;
use crate::voice::cooldown::CooldownTracker;
use crate::voice::platform::{CreateVoiceChannel, MemberInfo, VoicePlatform, VoiceStateChange};
use crate::voice::settings::{GuildVoiceSettings, TempChannel, TriggerOptions, settings_key};
use crate::voice::template::{TemplateContext, render};

/// Bitrate used when neither the trigger nor the guild configures one.
const DEFAULT_BITRATE: u32 = 64_000;

const PERMISSION_DM: &str = "I couldn't create a voice channel for you because I'm missing \
                             permissions. Please let a server admin know.";

/// Temporary voice channel manager.
pub struct JoinToCreate {
    storage: Arc<StorageService>,
    platform: Arc<dyn VoicePlatform>,
    cooldowns: CooldownTracker,
    defaults: VoiceDefaults,
}

impl std::fmt::Debug for JoinToCreate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinToCreate")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl JoinToCreate {
    /// A manager with the built-in defaults.
    #[must_use]
    pub fn new(storage: Arc<StorageService>, platform: Arc<dyn VoicePlatform>) -> Self {
        Self::with_defaults(storage, platform, VoiceDefaults::default())
    }

    /// A manager with explicit defaults, usually loaded from configuration.
    #[must_use]
    pub fn with_defaults(
        storage: Arc<StorageService>,
        platform: Arc<dyn VoicePlatform>,
        defaults: VoiceDefaults,
    ) -> Self {
        let cooldowns = CooldownTracker::new(
            Duration::from_secs(defaults.cooldown_seconds),
            defaults.cooldown_capacity,
        );
        Self {
            storage,
            platform,
            cooldowns,
            defaults,
        }
    }

    /// Processes one reduced voice state update.
    ///
    /// A move between channels is evaluated as a leave from the old channel
    /// followed by a join to the new one. Updates that keep the member in
    /// the same channel (mute, deafen, stream) are ignored.
    pub async fn handle_voice_state(&self, change: VoiceStateChange) {
        let VoiceStateChange {
            guild_id,
            previous_channel,
            new_channel,
            member,
        } = change;
        if previous_channel == new_channel {
            return;
        }
        if let Some(left) = previous_channel {
            self.handle_leave(guild_id, left, member.user_id).await;
        }
        if let Some(joined) = new_channel {
            self.handle_join(guild_id, joined, &member).await;
        }
    }

    async fn handle_join(&self, guild: GuildId, channel: ChannelId, member: &MemberInfo) {
        let Some(settings) = self.guild_settings(guild).await else {
            return;
        };
        if !settings.enabled || !settings.is_trigger(channel) {
            return;
        }
        if member.bot {
            debug!(%guild, user = %member.user_id, "Ignoring bot in trigger channel");
            return;
        }

        // Re-entry: the member already owns a live temporary channel, so
        // move them back into it instead of creating a second one.
        if let Some(owned) = settings.owned_channel(member.user_id) {
            debug!(%guild, user = %member.user_id, %owned, "Owner rejoined trigger, moving home");
            if let Err(e) = self.platform.move_member(guild, member.user_id, owned).await {
                debug!(error = %e, "Failed to move owner back to their channel");
            }
            return;
        }

        if !self.cooldowns.try_acquire(member.user_id) {
            debug!(%guild, user = %member.user_id, "Channel creation debounced");
            return;
        }

        let request = self.build_request(guild, channel, member, &settings).await;

        // The member may have left the trigger while we were resolving
        // names; creating a channel for a gone member would orphan it.
        match self.platform.member_voice_channel(guild, member.user_id).await {
            Ok(Some(current)) if current == channel => {}
            Ok(_) => {
                debug!(%guild, user = %member.user_id, "Member left the trigger before creation");
                self.cooldowns.release(member.user_id);
                return;
            }
            Err(e) => {
                warn!(%guild, error = %e, "Could not verify member's voice state");
                self.cooldowns.release(member.user_id);
                return;
            }
        }

        let created = match self.platform.create_voice_channel(guild, request).await {
            Ok(id) => id,
            Err(Error::Permission { message }) => {
                warn!(%guild, error = %message, "Missing permissions to create temporary channel");
                self.cooldowns.release(member.user_id);
                if let Err(e) = self
                    .platform
                    .send_direct_message(member.user_id, PERMISSION_DM)
                    .await
                {
                    debug!(error = %e, "Could not notify member about the failure");
                }
                return;
            }
            Err(e) => {
                warn!(%guild, error = %e, "Failed to create temporary channel");
                self.cooldowns.release(member.user_id);
                return;
            }
        };

        // Second checkpoint: the member may have disconnected while Discord
        // processed the creation. Remove the channel before anyone sees it.
        let still_waiting = matches!(
            self.platform.member_voice_channel(guild, member.user_id).await,
            Ok(Some(current)) if current == channel
        );
        if !still_waiting {
            debug!(%guild, user = %member.user_id, "Member left during creation, removing channel");
            if let Err(e) = self
                .platform
                .delete_channel(created, "creator left before the channel was ready")
                .await
            {
                warn!(%created, error = %e, "Failed to remove abandoned channel");
            }
            self.cooldowns.release(member.user_id);
            return;
        }

        // Re-read the document so a concurrent settings change is not
        // clobbered by our insert.
        let mut settings = self.guild_settings(guild).await.unwrap_or(settings);
        settings.temporary_channels.insert(
            created,
            TempChannel {
                owner_id: member.user_id,
                trigger_channel_id: channel,
            },
        );
        self.save_settings(guild, &settings).await;
        info!(%guild, %created, owner = %member.user_id, "Created temporary voice channel");

        if let Err(e) = self.platform.move_member(guild, member.user_id, created).await {
            warn!(%guild, %created, error = %e, "Created channel but could not move the owner in");
        }
    }

    async fn handle_leave(&self, guild: GuildId, channel: ChannelId, user: UserId) {
        let Some(mut settings) = self.guild_settings(guild).await else {
            return;
        };
        let Some(record) = settings.temporary_channels.get(&channel).copied() else {
            return;
        };

        let members = match self.platform.channel_members(guild, channel).await {
            Ok(members) => members,
            Err(e) => {
                warn!(%guild, %channel, error = %e, "Could not list channel members");
                return;
            }
        };

        if members.is_empty() {
            if let Err(e) = self
                .platform
                .delete_channel(channel, "temporary channel empty")
                .await
            {
                // Keep the record so a later leave event retries the
                // cleanup; external deletions arrive via channel_deleted.
                warn!(%guild, %channel, error = %e, "Failed to delete empty temporary channel");
                return;
            }
            settings.temporary_channels.remove(&channel);
            self.save_settings(guild, &settings).await;
            debug!(%guild, %channel, "Removed empty temporary channel");
            return;
        }

        if record.owner_id == user {
            let Some(new_owner) = members.first().cloned() else {
                return;
            };
            if let Some(live) = settings.temporary_channels.get_mut(&channel) {
                live.owner_id = new_owner.user_id;
            }
            self.save_settings(guild, &settings).await;
            info!(%guild, %channel, new_owner = %new_owner.user_id, "Transferred ownership");

            let name = self
                .render_name(guild, record.trigger_channel_id, &new_owner, &settings)
                .await;
            if let Err(e) = self.platform.rename_channel(channel, &name).await {
                debug!(%channel, error = %e, "Could not rename channel for its new owner");
            }
        }
    }

    /// Reacts to a channel being deleted outside the manager's control.
    ///
    /// Deleted triggers leave the configuration, deleted temporary channels
    /// drop their record, and losing the configured category disables the
    /// feature for the guild until an admin re-runs setup.
    pub async fn channel_deleted(&self, guild: GuildId, channel: ChannelId) {
        let Some(mut settings) = self.guild_settings(guild).await else {
            return;
        };
        let mut changed = false;

        if settings.trigger_channels.remove(&channel) {
            settings.channel_options.remove(&channel);
            info!(%guild, %channel, "Trigger channel deleted, dropping it from the configuration");
            changed = true;
        }
        if settings.temporary_channels.remove(&channel).is_some() {
            debug!(%guild, %channel, "Tracked temporary channel deleted externally");
            changed = true;
        }
        if settings.category_id == Some(channel) {
            settings.category_id = None;
            settings.enabled = false;
            warn!(%guild, "Voice category deleted, disabling join-to-create");
            changed = true;
        }
        for options in settings.channel_options.values_mut() {
            if options.category_id == Some(channel) {
                options.category_id = None;
                changed = true;
            }
        }

        if !changed {
            return;
        }
        if settings.trigger_channels.is_empty() && settings.temporary_channels.is_empty() {
            self.storage.delete(&settings_key(guild)).await;
        } else {
            self.save_settings(guild, &settings).await;
        }
    }

    /// Enables join-to-create for a guild, creating the settings document
    /// on first use.
    ///
    /// # Errors
    /// Returns an error when the settings cannot be persisted.
    pub async fn setup(
        &self,
        guild: GuildId,
        trigger: ChannelId,
        category: Option<ChannelId>,
    ) -> Result<GuildVoiceSettings> {
        let mut settings = self.guild_settings(guild).await.unwrap_or_default();
        settings.enabled = true;
        settings.trigger_channels.insert(trigger);
        if category.is_some() {
            settings.category_id = category;
        }
        self.persist(guild, &settings).await?;
        info!(%guild, %trigger, "Join-to-create configured");
        Ok(settings)
    }

    /// Adds a trigger channel to an already configured guild.
    ///
    /// # Errors
    /// Returns an error when the guild has no configuration yet or the
    /// settings cannot be persisted.
    pub async fn add_trigger(
        &self,
        guild: GuildId,
        trigger: ChannelId,
        options: Option<TriggerOptions>,
    ) -> Result<()> {
        let mut settings = self.require_settings(guild).await?;
        settings.trigger_channels.insert(trigger);
        if let Some(options) = options {
            settings.channel_options.insert(trigger, options);
        }
        self.persist(guild, &settings).await
    }

    /// Removes a trigger channel and its overrides. Removing the last
    /// trigger deletes the whole document once no temporary channels
    /// remain.
    ///
    /// # Errors
    /// Returns an error when the guild has no configuration, the channel
    /// is not a trigger, or the settings cannot be persisted.
    pub async fn remove_trigger(&self, guild: GuildId, trigger: ChannelId) -> Result<()> {
        let mut settings = self.require_settings(guild).await?;
        if !settings.trigger_channels.remove(&trigger) {
            return Err(Error::Config {
                message: format!("channel {trigger} is not a join-to-create trigger"),
            });
        }
        settings.channel_options.remove(&trigger);
        if settings.trigger_channels.is_empty() && settings.temporary_channels.is_empty() {
            self.storage.delete(&settings_key(guild)).await;
            info!(%guild, "Last trigger removed, join-to-create unconfigured");
            return Ok(());
        }
        self.persist(guild, &settings).await
    }

    /// Sets per-trigger overrides.
    ///
    /// # Errors
    /// Returns an error when the guild has no configuration, the channel
    /// is not a trigger, or the settings cannot be persisted.
    pub async fn set_trigger_options(
        &self,
        guild: GuildId,
        trigger: ChannelId,
        options: TriggerOptions,
    ) -> Result<()> {
        let mut settings = self.require_settings(guild).await?;
        if !settings.is_trigger(trigger) {
            return Err(Error::Config {
                message: format!("channel {trigger} is not a join-to-create trigger"),
            });
        }
        settings.channel_options.insert(trigger, options);
        self.persist(guild, &settings).await
    }

    /// Turns the feature on or off without touching the configuration.
    ///
    /// # Errors
    /// Returns an error when the guild has no configuration or the settings
    /// cannot be persisted.
    pub async fn set_enabled(&self, guild: GuildId, enabled: bool) -> Result<()> {
        let mut settings = self.require_settings(guild).await?;
        settings.enabled = enabled;
        self.persist(guild, &settings).await
    }

    /// The guild's settings document, `None` when join-to-create was never
    /// set up.
    pub async fn guild_settings(&self, guild: GuildId) -> Option<GuildVoiceSettings> {
        self.storage.get_json(&settings_key(guild)).await
    }

    async fn require_settings(&self, guild: GuildId) -> Result<GuildVoiceSettings> {
        self.guild_settings(guild).await.ok_or_else(|| Error::Config {
            message: "join-to-create is not set up for this guild".to_string(),
        })
    }

    async fn persist(&self, guild: GuildId, settings: &GuildVoiceSettings) -> Result<()> {
        if self.storage.set_json(&settings_key(guild), settings, None).await {
            Ok(())
        } else {
            Err(Error::Storage {
                message: format!("failed to persist voice settings for guild {guild}"),
            })
        }
    }

    async fn save_settings(&self, guild: GuildId, settings: &GuildVoiceSettings) {
        if !self.storage.set_json(&settings_key(guild), settings, None).await {
            warn!(%guild, "Failed to persist voice settings");
        }
    }

    async fn build_request(
        &self,
        guild: GuildId,
        trigger: ChannelId,
        member: &MemberInfo,
        settings: &GuildVoiceSettings,
    ) -> CreateVoiceChannel {
        let options = settings.channel_options.get(&trigger);
        let name = self.render_name(guild, trigger, member, settings).await;
        let bitrate = options
            .and_then(|o| o.bitrate)
            .unwrap_or(DEFAULT_BITRATE)
            .clamp(self.defaults.min_bitrate, self.defaults.max_bitrate);
        let user_limit = options
            .and_then(|o| o.user_limit)
            .unwrap_or(0)
            .min(self.defaults.max_user_limit);
        let category = options
            .and_then(|o| o.category_id)
            .or(settings.category_id);
        CreateVoiceChannel {
            name,
            category,
            bitrate,
            user_limit,
            owner: member.user_id,
        }
    }

    async fn render_name(
        &self,
        guild: GuildId,
        trigger: ChannelId,
        member: &MemberInfo,
        settings: &GuildVoiceSettings,
    ) -> String {
        let template = settings
            .channel_options
            .get(&trigger)
            .and_then(|o| o.name_template.as_deref())
            .unwrap_or(&self.defaults.default_name_template);

        let mut ctx = TemplateContext::for_member(member);
        // Name lookups cost a platform call each, so only resolve the ones
        // the template asks for.
        if template.contains("{guild}") {
            ctx = ctx.guild_name(self.platform.guild_name(guild).await.ok().flatten());
        }
        if template.contains("{channel}") {
            ctx = ctx.channel_name(self.platform.channel_name(trigger).await.ok().flatten());
        }
        render(template, &ctx, self.defaults.max_name_length)
    }
}
