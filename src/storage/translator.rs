//! Key schema translator for the relational driver.
//!
//! Parses opaque colon-delimited storage keys (`guild:<id>:config`,
//! `guild:<id>:leveling:users:<userId>`, `temp:*`, ...) into a typed
//! descriptor that names the table a read or write must touch. The parse is
//! total: every string, including the empty string and keys with arbitrary
//! segment counts, maps to exactly one descriptor. Shapes the dispatch table
//! does not recognize fall back to generic temp storage so that no caller
//! can ever hand the driver an unroutable key.

/// Logical record type a storage key resolves to. Each variant corresponds
/// to one table in the relational schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// `guild:<id>:config` - general guild settings.
    GuildConfig,
    /// `guild:<id>:birthdays` - the guild's birthday map.
    GuildBirthdays,
    /// `guild:<id>:giveaways` - active giveaways keyed by message.
    GuildGiveaways,
    /// `guild:<id>:welcome` - welcome message settings.
    WelcomeConfig,
    /// `guild:<id>:leveling:config` - leveling system settings.
    LevelingConfig,
    /// `guild:<id>:leveling:users:<userId>` - one member's level record.
    UserLevel,
    /// `guild:<id>:economy:<userId>` - one member's economy account.
    Economy,
    /// `guild:<id>:afk:<userId>` - one member's AFK status.
    AfkStatus,
    /// `guild:<id>:ticket:<channelId>` - one support ticket.
    Ticket,
    /// `temp:*` and every unrecognized shape.
    Temp,
    /// `cache:*` - short-lived cached lookups.
    Cache,
}

impl KeyKind {
    /// Stable snake_case name, used in logs and diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::GuildConfig => "guild_config",
            KeyKind::GuildBirthdays => "guild_birthdays",
            KeyKind::GuildGiveaways => "guild_giveaways",
            KeyKind::WelcomeConfig => "welcome_config",
            KeyKind::LevelingConfig => "leveling_config",
            KeyKind::UserLevel => "user_level",
            KeyKind::Economy => "economy",
            KeyKind::AfkStatus => "afk_status",
            KeyKind::Ticket => "ticket",
            KeyKind::Temp => "temp",
            KeyKind::Cache => "cache",
        }
    }
}

/// Translator output: the record kind plus every identifier extracted from
/// the key. Derived purely from the key string, never from the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// Which table family the key routes to.
    pub kind: KeyKind,
    /// Guild snowflake, for guild-scoped kinds.
    pub guild_id: Option<String>,
    /// User snowflake, for member-scoped kinds.
    pub user_id: Option<String>,
    /// Channel snowflake, for ticket keys.
    pub channel_id: Option<String>,
    /// The literal key as given, used verbatim for catch-all rows.
    pub full_key: String,
}

impl KeyDescriptor {
    fn generic(kind: KeyKind, full_key: &str) -> Self {
        Self {
            kind,
            guild_id: None,
            user_id: None,
            channel_id: None,
            full_key: full_key.to_string(),
        }
    }

    fn guild(kind: KeyKind, guild_id: &str, full_key: &str) -> Self {
        Self {
            guild_id: Some(guild_id.to_string()),
            ..Self::generic(kind, full_key)
        }
    }

    fn guild_user(kind: KeyKind, guild_id: &str, user_id: &str, full_key: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Self::guild(kind, guild_id, full_key)
        }
    }

    fn guild_channel(kind: KeyKind, guild_id: &str, channel_id: &str, full_key: &str) -> Self {
        Self {
            channel_id: Some(channel_id.to_string()),
            ..Self::guild(kind, guild_id, full_key)
        }
    }
}

/// Classifies a storage key.
///
/// Unrecognized shapes (including keys with empty id segments) are routed to
/// generic temp storage keyed by the full literal string rather than
/// rejected.
#[must_use]
pub fn parse_key(key: &str) -> KeyDescriptor {
    let segments: Vec<&str> = key.split(':').collect();

    match segments.first().copied() {
        Some("temp") => return KeyDescriptor::generic(KeyKind::Temp, key),
        Some("cache") => return KeyDescriptor::generic(KeyKind::Cache, key),
        Some("guild") => {}
        _ => return KeyDescriptor::generic(KeyKind::Temp, key),
    }

    // guild:<id>:<record>[...] - empty ids disqualify the shape
    let guild_id = match segments.get(1).copied() {
        Some(id) if !id.is_empty() => id,
        _ => return KeyDescriptor::generic(KeyKind::Temp, key),
    };

    match (segments.get(2).copied(), segments.len()) {
        (Some("config"), 3) => KeyDescriptor::guild(KeyKind::GuildConfig, guild_id, key),
        (Some("birthdays"), 3) => KeyDescriptor::guild(KeyKind::GuildBirthdays, guild_id, key),
        (Some("giveaways"), 3) => KeyDescriptor::guild(KeyKind::GuildGiveaways, guild_id, key),
        (Some("welcome"), 3) => KeyDescriptor::guild(KeyKind::WelcomeConfig, guild_id, key),
        (Some("leveling"), 4) if segments[3] == "config" => {
            KeyDescriptor::guild(KeyKind::LevelingConfig, guild_id, key)
        }
        (Some("leveling"), 5) if segments[3] == "users" && !segments[4].is_empty() => {
            KeyDescriptor::guild_user(KeyKind::UserLevel, guild_id, segments[4], key)
        }
        (Some("economy"), 4) if !segments[3].is_empty() => {
            KeyDescriptor::guild_user(KeyKind::Economy, guild_id, segments[3], key)
        }
        (Some("afk"), 4) if !segments[3].is_empty() => {
            KeyDescriptor::guild_user(KeyKind::AfkStatus, guild_id, segments[3], key)
        }
        (Some("ticket"), 4) if !segments[3].is_empty() => {
            KeyDescriptor::guild_channel(KeyKind::Ticket, guild_id, segments[3], key)
        }
        _ => KeyDescriptor::generic(KeyKind::Temp, key),
    }
}
