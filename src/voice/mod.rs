//! Temporary voice channel management.
//!
//! Everything join-to-create: the platform abstraction the manager drives,
//! the per-guild settings document, channel name templating, creation
//! cooldowns, and the lifecycle manager itself.

/// Per-user creation cooldown tracking.
pub mod cooldown;
/// The join-to-create lifecycle manager.
pub mod lifecycle;
/// Platform operations and reduced event types.
pub mod platform;
/// Per-guild settings document and its storage key.
pub mod settings;
/// Channel name templates.
pub mod template;

pub use cooldown::CooldownTracker;
pub use lifecycle::JoinToCreate;
pub use platform::{CreateVoiceChannel, MemberInfo, VoicePlatform, VoiceStateChange};
pub use settings::{GuildVoiceSettings, TempChannel, TriggerOptions, settings_key};
pub use template::{TemplateContext, render};
