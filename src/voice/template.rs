//! Channel name templates.
//!
//! Operators configure names like `"{username}'s channel"` per trigger.
//! Rendering substitutes the recognized tokens, falls back to something
//! sensible for every missing value, and clamps the result to Discord's
//! channel name limit. Every brace pair is treated as a token; ones the
//! renderer does not recognize substitute the username rather than leaking
//! into the channel name.

use crate::voice::platform::MemberInfo;

/// Values available to a name template.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Account username, the `{username}` token.
    pub username: String,
    /// Guild nickname or global display name, the `{displayname}` token.
    pub display_name: Option<String>,
    /// Legacy `name#discriminator` tag, the `{tag}` token.
    pub tag: Option<String>,
    /// Guild name, the `{guild}` token.
    pub guild_name: Option<String>,
    /// Trigger channel name, the `{channel}` token.
    pub channel_name: Option<String>,
}

impl TemplateContext {
    /// Context from a member's identity, without guild or channel names.
    #[must_use]
    pub fn for_member(member: &MemberInfo) -> Self {
        Self {
            username: member.username.clone(),
            display_name: member.display_name.clone(),
            tag: member.tag.clone(),
            guild_name: None,
            channel_name: None,
        }
    }

    #[must_use]
    pub fn guild_name(mut self, name: Option<String>) -> Self {
        self.guild_name = name;
        self
    }

    #[must_use]
    pub fn channel_name(mut self, name: Option<String>) -> Self {
        self.channel_name = name;
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Renders a channel name from `template`.
///
/// Supported tokens: `{username}`, `{displayname}`, `{tag}`, `{guild}`,
/// `{channel}`. Identity tokens fall back to the username (or `Unknown`
/// when even that is empty), and any other brace pair substitutes the
/// username too, so a typo in a template never leaks into the channel
/// name. A template that renders to nothing yields `<username>'s channel`.
/// The result is clamped to `max_len` characters.
#[must_use]
pub fn render(template: &str, ctx: &TemplateContext, max_len: usize) -> String {
    let username = non_empty(Some(&ctx.username)).unwrap_or("Unknown");
    let display_name = non_empty(ctx.display_name.as_deref()).unwrap_or(username);
    let tag = non_empty(ctx.tag.as_deref()).unwrap_or(username);
    let guild = non_empty(ctx.guild_name.as_deref()).unwrap_or("server");
    let channel = non_empty(ctx.channel_name.as_deref()).unwrap_or("voice");

    let mut name = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        name.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            // Unmatched brace, keep it as literal text.
            name.push_str(&rest[open..]);
            rest = "";
            break;
        };
        name.push_str(match &rest[open + 1..open + close] {
            "username" => username,
            "displayname" => display_name,
            "tag" => tag,
            "guild" => guild,
            "channel" => channel,
            _ => username,
        });
        rest = &rest[open + close + 1..];
    }
    name.push_str(rest);

    let name = if name.trim().is_empty() {
        format!("{username}'s channel")
    } else {
        name.trim().to_string()
    };
    name.chars().take(max_len.max(1)).collect()
}
