//! Relational storage backend.
//!
//! Implements the key-value contract on top of normalized tables. Every
//! operation first runs the key through the schema translator, then touches
//! the table the descriptor names: scalar config documents upsert a single
//! JSON row, collection documents (birthdays, giveaways) are decomposed into
//! one row per member and reassembled on read, and unrecognized keys land in
//! the catch-all tables keyed by the literal string.
//!
//! A collection with no remaining rows reads back as absent, matching a
//! deleted key. TTLs only apply to catch-all rows; schema-backed records are
//! durable and a requested expiry is dropped with a debug log.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QuerySelect, Schema, Set,
};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::entities::{
    afk_status, birthday, cache_entry, economy_account, giveaway, guild, guild_config,
    leveling_config, temp_entry, ticket, user, user_level, welcome_config,
};
use crate::errors::Result;
use crate::storage::backend::{ConnectionType, StorageBackend};
use crate::storage::translator::{KeyKind, parse_key};

/// Storage backend over a SQL database via `SeaORM`.
///
/// Built for `PostgreSQL` in production; tests run the same code against
/// in-memory `SQLite`.
#[derive(Debug)]
pub struct RelationalBackend {
    db: DatabaseConnection,
}

impl RelationalBackend {
    /// Connects to the database at `url` and creates any missing tables.
    pub async fn connect(url: &str) -> Result<Self> {
        debug!("Connecting to relational storage");
        let db = Database::connect(url).await?;
        let backend = Self { db };
        backend.ensure_schema().await?;
        info!("Relational storage ready");
        Ok(backend)
    }

    /// Wraps an existing connection without touching the schema.
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates all storage tables using `SeaORM`'s schema generation from the
    /// entity definitions. Parent tables come first so foreign keys resolve.
    pub async fn ensure_schema(&self) -> Result<()> {
        let builder = self.db.get_database_backend();
        let schema = Schema::new(builder);

        let statements = vec![
            schema.create_table_from_entity(guild::Entity),
            schema.create_table_from_entity(user::Entity),
            schema.create_table_from_entity(guild_config::Entity),
            schema.create_table_from_entity(welcome_config::Entity),
            schema.create_table_from_entity(leveling_config::Entity),
            schema.create_table_from_entity(birthday::Entity),
            schema.create_table_from_entity(giveaway::Entity),
            schema.create_table_from_entity(user_level::Entity),
            schema.create_table_from_entity(economy_account::Entity),
            schema.create_table_from_entity(afk_status::Entity),
            schema.create_table_from_entity(ticket::Entity),
            schema.create_table_from_entity(temp_entry::Entity),
            schema.create_table_from_entity(cache_entry::Entity),
        ];
        for mut statement in statements {
            statement.if_not_exists();
            self.db.execute(builder.build(&statement)).await?;
        }
        Ok(())
    }

    /// Inserts the guild parent row if it does not exist yet.
    async fn ensure_guild(&self, guild_id: &str) -> Result<()> {
        let model = guild::ActiveModel {
            id: Set(guild_id.to_string()),
        };
        guild::Entity::insert(model)
            .on_conflict(
                OnConflict::column(guild::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// Inserts the user parent row if it does not exist yet.
    async fn ensure_user(&self, user_id: &str) -> Result<()> {
        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
        };
        user::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// Replaces all birthday rows for a guild with the members of `value`.
    ///
    /// The delete and insert run as separate statements; a crash between the
    /// two loses the previous rows. Members without numeric `month` and
    /// `day` fields are skipped with a warning.
    async fn replace_birthdays(&self, guild_id: &str, value: &Value) -> Result<()> {
        birthday::Entity::delete_many()
            .filter(birthday::Column::GuildId.eq(guild_id))
            .exec(&self.db)
            .await?;

        let Some(entries) = value.as_object() else {
            if !value.is_null() {
                warn!(guild_id, "Birthday document is not an object, stored as empty");
            }
            return Ok(());
        };

        let mut models = Vec::with_capacity(entries.len());
        for (user_id, entry) in entries {
            match parse_birthday(entry) {
                Some((month, day)) => {
                    self.ensure_user(user_id).await?;
                    models.push(birthday::ActiveModel {
                        guild_id: Set(guild_id.to_string()),
                        user_id: Set(user_id.clone()),
                        month: Set(month),
                        day: Set(day),
                    });
                }
                None => warn!(guild_id, user_id, "Skipping malformed birthday entry"),
            }
        }
        if !models.is_empty() {
            birthday::Entity::insert_many(models)
                .exec_without_returning(&self.db)
                .await?;
        }
        Ok(())
    }

    /// Replaces all giveaway rows for a guild with the members of `value`,
    /// keyed by message id.
    async fn replace_giveaways(&self, guild_id: &str, value: &Value) -> Result<()> {
        giveaway::Entity::delete_many()
            .filter(giveaway::Column::GuildId.eq(guild_id))
            .exec(&self.db)
            .await?;

        let Some(entries) = value.as_object() else {
            if !value.is_null() {
                warn!(guild_id, "Giveaway document is not an object, stored as empty");
            }
            return Ok(());
        };

        let models: Vec<giveaway::ActiveModel> = entries
            .iter()
            .map(|(message_id, entry)| giveaway::ActiveModel {
                guild_id: Set(guild_id.to_string()),
                message_id: Set(message_id.clone()),
                data: Set(entry.clone()),
            })
            .collect();
        if !models.is_empty() {
            giveaway::Entity::insert_many(models)
                .exec_without_returning(&self.db)
                .await?;
        }
        Ok(())
    }
}

fn parse_birthday(entry: &Value) -> Option<(i16, i16)> {
    let month = i16::try_from(entry.get("month")?.as_i64()?).ok()?;
    let day = i16::try_from(entry.get("day")?.as_i64()?).ok()?;
    Some((month, day))
}

fn expiry_from_ttl(ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    // TTLs too large for chrono are stored as persistent.
    ttl.and_then(|d| chrono::Duration::from_std(d).ok())
        .map(|d| Utc::now() + d)
}

fn is_live(expires_at: Option<DateTime<Utc>>) -> bool {
    expires_at.is_none_or(|at| at > Utc::now())
}

#[async_trait]
impl StorageBackend for RelationalBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let desc = parse_key(key);
        match (
            desc.kind,
            desc.guild_id.as_deref(),
            desc.user_id.as_deref(),
            desc.channel_id.as_deref(),
        ) {
            (KeyKind::GuildConfig, Some(gid), ..) => Ok(guild_config::Entity::find_by_id(gid)
                .one(&self.db)
                .await?
                .map(|m| m.data)),
            (KeyKind::WelcomeConfig, Some(gid), ..) => Ok(welcome_config::Entity::find_by_id(gid)
                .one(&self.db)
                .await?
                .map(|m| m.data)),
            (KeyKind::LevelingConfig, Some(gid), ..) => {
                Ok(leveling_config::Entity::find_by_id(gid)
                    .one(&self.db)
                    .await?
                    .map(|m| m.data))
            }
            (KeyKind::GuildBirthdays, Some(gid), ..) => {
                let rows = birthday::Entity::find()
                    .filter(birthday::Column::GuildId.eq(gid))
                    .all(&self.db)
                    .await?;
                if rows.is_empty() {
                    return Ok(None);
                }
                let mut doc = Map::new();
                for row in rows {
                    doc.insert(row.user_id, json!({ "month": row.month, "day": row.day }));
                }
                Ok(Some(Value::Object(doc)))
            }
            (KeyKind::GuildGiveaways, Some(gid), ..) => {
                let rows = giveaway::Entity::find()
                    .filter(giveaway::Column::GuildId.eq(gid))
                    .all(&self.db)
                    .await?;
                if rows.is_empty() {
                    return Ok(None);
                }
                let mut doc = Map::new();
                for row in rows {
                    doc.insert(row.message_id, row.data);
                }
                Ok(Some(Value::Object(doc)))
            }
            (KeyKind::UserLevel, Some(gid), Some(uid), _) => {
                Ok(
                    user_level::Entity::find_by_id((gid.to_string(), uid.to_string()))
                        .one(&self.db)
                        .await?
                        .map(|m| m.data),
                )
            }
            (KeyKind::Economy, Some(gid), Some(uid), _) => {
                Ok(
                    economy_account::Entity::find_by_id((gid.to_string(), uid.to_string()))
                        .one(&self.db)
                        .await?
                        .map(|m| m.data),
                )
            }
            (KeyKind::AfkStatus, Some(gid), Some(uid), _) => {
                Ok(
                    afk_status::Entity::find_by_id((gid.to_string(), uid.to_string()))
                        .one(&self.db)
                        .await?
                        .map(|m| m.data),
                )
            }
            (KeyKind::Ticket, Some(gid), _, Some(cid)) => {
                Ok(
                    ticket::Entity::find_by_id((gid.to_string(), cid.to_string()))
                        .one(&self.db)
                        .await?
                        .map(|m| m.data),
                )
            }
            (KeyKind::Cache, ..) => {
                let Some(row) = cache_entry::Entity::find_by_id(key).one(&self.db).await? else {
                    return Ok(None);
                };
                if !is_live(row.expires_at) {
                    cache_entry::Entity::delete_by_id(key).exec(&self.db).await?;
                    return Ok(None);
                }
                Ok(Some(row.data))
            }
            _ => {
                let Some(row) = temp_entry::Entity::find_by_id(key).one(&self.db).await? else {
                    return Ok(None);
                };
                if !is_live(row.expires_at) {
                    temp_entry::Entity::delete_by_id(key).exec(&self.db).await?;
                    return Ok(None);
                }
                Ok(Some(row.data))
            }
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let desc = parse_key(key);
        if ttl.is_some() && !matches!(desc.kind, KeyKind::Temp | KeyKind::Cache) {
            debug!(key, kind = desc.kind.as_str(), "TTL ignored for schema-backed key");
        }
        let now = Utc::now();
        match (
            desc.kind,
            desc.guild_id.as_deref(),
            desc.user_id.as_deref(),
            desc.channel_id.as_deref(),
        ) {
            (KeyKind::GuildConfig, Some(gid), ..) => {
                self.ensure_guild(gid).await?;
                let model = guild_config::ActiveModel {
                    guild_id: Set(gid.to_string()),
                    data: Set(value),
                    updated_at: Set(now),
                };
                guild_config::Entity::insert(model)
                    .on_conflict(
                        OnConflict::column(guild_config::Column::GuildId)
                            .update_columns([
                                guild_config::Column::Data,
                                guild_config::Column::UpdatedAt,
                            ])
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
                Ok(())
            }
            (KeyKind::WelcomeConfig, Some(gid), ..) => {
                self.ensure_guild(gid).await?;
                let model = welcome_config::ActiveModel {
                    guild_id: Set(gid.to_string()),
                    data: Set(value),
                    updated_at: Set(now),
                };
                welcome_config::Entity::insert(model)
                    .on_conflict(
                        OnConflict::column(welcome_config::Column::GuildId)
                            .update_columns([
                                welcome_config::Column::Data,
                                welcome_config::Column::UpdatedAt,
                            ])
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
                Ok(())
            }
            (KeyKind::LevelingConfig, Some(gid), ..) => {
                self.ensure_guild(gid).await?;
                let model = leveling_config::ActiveModel {
                    guild_id: Set(gid.to_string()),
                    data: Set(value),
                    updated_at: Set(now),
                };
                leveling_config::Entity::insert(model)
                    .on_conflict(
                        OnConflict::column(leveling_config::Column::GuildId)
                            .update_columns([
                                leveling_config::Column::Data,
                                leveling_config::Column::UpdatedAt,
                            ])
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
                Ok(())
            }
            (KeyKind::GuildBirthdays, Some(gid), ..) => {
                self.ensure_guild(gid).await?;
                self.replace_birthdays(gid, &value).await
            }
            (KeyKind::GuildGiveaways, Some(gid), ..) => {
                self.ensure_guild(gid).await?;
                self.replace_giveaways(gid, &value).await
            }
            (KeyKind::UserLevel, Some(gid), Some(uid), _) => {
                self.ensure_guild(gid).await?;
                self.ensure_user(uid).await?;
                let model = user_level::ActiveModel {
                    guild_id: Set(gid.to_string()),
                    user_id: Set(uid.to_string()),
                    data: Set(value),
                    updated_at: Set(now),
                };
                user_level::Entity::insert(model)
                    .on_conflict(
                        OnConflict::columns([
                            user_level::Column::GuildId,
                            user_level::Column::UserId,
                        ])
                        .update_columns([user_level::Column::Data, user_level::Column::UpdatedAt])
                        .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
                Ok(())
            }
            (KeyKind::Economy, Some(gid), Some(uid), _) => {
                self.ensure_guild(gid).await?;
                self.ensure_user(uid).await?;
                let model = economy_account::ActiveModel {
                    guild_id: Set(gid.to_string()),
                    user_id: Set(uid.to_string()),
                    data: Set(value),
                    updated_at: Set(now),
                };
                economy_account::Entity::insert(model)
                    .on_conflict(
                        OnConflict::columns([
                            economy_account::Column::GuildId,
                            economy_account::Column::UserId,
                        ])
                        .update_columns([
                            economy_account::Column::Data,
                            economy_account::Column::UpdatedAt,
                        ])
                        .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
                Ok(())
            }
            (KeyKind::AfkStatus, Some(gid), Some(uid), _) => {
                self.ensure_guild(gid).await?;
                self.ensure_user(uid).await?;
                let model = afk_status::ActiveModel {
                    guild_id: Set(gid.to_string()),
                    user_id: Set(uid.to_string()),
                    data: Set(value),
                    updated_at: Set(now),
                };
                afk_status::Entity::insert(model)
                    .on_conflict(
                        OnConflict::columns([
                            afk_status::Column::GuildId,
                            afk_status::Column::UserId,
                        ])
                        .update_columns([afk_status::Column::Data, afk_status::Column::UpdatedAt])
                        .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
                Ok(())
            }
            (KeyKind::Ticket, Some(gid), _, Some(cid)) => {
                self.ensure_guild(gid).await?;
                let model = ticket::ActiveModel {
                    guild_id: Set(gid.to_string()),
                    channel_id: Set(cid.to_string()),
                    data: Set(value),
                    updated_at: Set(now),
                };
                ticket::Entity::insert(model)
                    .on_conflict(
                        OnConflict::columns([ticket::Column::GuildId, ticket::Column::ChannelId])
                            .update_columns([ticket::Column::Data, ticket::Column::UpdatedAt])
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
                Ok(())
            }
            (KeyKind::Cache, ..) => {
                let model = cache_entry::ActiveModel {
                    key: Set(key.to_string()),
                    data: Set(value),
                    expires_at: Set(expiry_from_ttl(ttl)),
                };
                cache_entry::Entity::insert(model)
                    .on_conflict(
                        OnConflict::column(cache_entry::Column::Key)
                            .update_columns([
                                cache_entry::Column::Data,
                                cache_entry::Column::ExpiresAt,
                            ])
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
                Ok(())
            }
            _ => {
                let model = temp_entry::ActiveModel {
                    key: Set(key.to_string()),
                    data: Set(value),
                    expires_at: Set(expiry_from_ttl(ttl)),
                };
                temp_entry::Entity::insert(model)
                    .on_conflict(
                        OnConflict::column(temp_entry::Column::Key)
                            .update_columns([
                                temp_entry::Column::Data,
                                temp_entry::Column::ExpiresAt,
                            ])
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
                Ok(())
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let desc = parse_key(key);
        match (
            desc.kind,
            desc.guild_id.as_deref(),
            desc.user_id.as_deref(),
            desc.channel_id.as_deref(),
        ) {
            (KeyKind::GuildConfig, Some(gid), ..) => {
                let res = guild_config::Entity::delete_by_id(gid).exec(&self.db).await?;
                Ok(res.rows_affected > 0)
            }
            (KeyKind::WelcomeConfig, Some(gid), ..) => {
                let res = welcome_config::Entity::delete_by_id(gid)
                    .exec(&self.db)
                    .await?;
                Ok(res.rows_affected > 0)
            }
            (KeyKind::LevelingConfig, Some(gid), ..) => {
                let res = leveling_config::Entity::delete_by_id(gid)
                    .exec(&self.db)
                    .await?;
                Ok(res.rows_affected > 0)
            }
            (KeyKind::GuildBirthdays, Some(gid), ..) => {
                let res = birthday::Entity::delete_many()
                    .filter(birthday::Column::GuildId.eq(gid))
                    .exec(&self.db)
                    .await?;
                Ok(res.rows_affected > 0)
            }
            (KeyKind::GuildGiveaways, Some(gid), ..) => {
                let res = giveaway::Entity::delete_many()
                    .filter(giveaway::Column::GuildId.eq(gid))
                    .exec(&self.db)
                    .await?;
                Ok(res.rows_affected > 0)
            }
            (KeyKind::UserLevel, Some(gid), Some(uid), _) => {
                let res = user_level::Entity::delete_by_id((gid.to_string(), uid.to_string()))
                    .exec(&self.db)
                    .await?;
                Ok(res.rows_affected > 0)
            }
            (KeyKind::Economy, Some(gid), Some(uid), _) => {
                let res = economy_account::Entity::delete_by_id((gid.to_string(), uid.to_string()))
                    .exec(&self.db)
                    .await?;
                Ok(res.rows_affected > 0)
            }
            (KeyKind::AfkStatus, Some(gid), Some(uid), _) => {
                let res = afk_status::Entity::delete_by_id((gid.to_string(), uid.to_string()))
                    .exec(&self.db)
                    .await?;
                Ok(res.rows_affected > 0)
            }
            (KeyKind::Ticket, Some(gid), _, Some(cid)) => {
                let res = ticket::Entity::delete_by_id((gid.to_string(), cid.to_string()))
                    .exec(&self.db)
                    .await?;
                Ok(res.rows_affected > 0)
            }
            (KeyKind::Cache, ..) => {
                let existed = cache_entry::Entity::find_by_id(key)
                    .one(&self.db)
                    .await?
                    .is_some_and(|row| is_live(row.expires_at));
                cache_entry::Entity::delete_by_id(key).exec(&self.db).await?;
                Ok(existed)
            }
            _ => {
                let existed = temp_entry::Entity::find_by_id(key)
                    .one(&self.db)
                    .await?
                    .is_some_and(|row| is_live(row.expires_at));
                temp_entry::Entity::delete_by_id(key).exec(&self.db).await?;
                Ok(existed)
            }
        }
    }

    /// Reconstructs the full key set from every table, then filters by
    /// prefix. A prefix scan over the relational driver is a full keyspace
    /// walk; the migration utility is its main caller.
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = Vec::new();

        let gids: Vec<String> = guild_config::Entity::find()
            .select_only()
            .column(guild_config::Column::GuildId)
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(gids.into_iter().map(|g| format!("guild:{g}:config")));

        let gids: Vec<String> = welcome_config::Entity::find()
            .select_only()
            .column(welcome_config::Column::GuildId)
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(gids.into_iter().map(|g| format!("guild:{g}:welcome")));

        let gids: Vec<String> = leveling_config::Entity::find()
            .select_only()
            .column(leveling_config::Column::GuildId)
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(gids.into_iter().map(|g| format!("guild:{g}:leveling:config")));

        let gids: Vec<String> = birthday::Entity::find()
            .select_only()
            .column(birthday::Column::GuildId)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(gids.into_iter().map(|g| format!("guild:{g}:birthdays")));

        let gids: Vec<String> = giveaway::Entity::find()
            .select_only()
            .column(giveaway::Column::GuildId)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(gids.into_iter().map(|g| format!("guild:{g}:giveaways")));

        let pairs: Vec<(String, String)> = user_level::Entity::find()
            .select_only()
            .column(user_level::Column::GuildId)
            .column(user_level::Column::UserId)
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(
            pairs
                .into_iter()
                .map(|(g, u)| format!("guild:{g}:leveling:users:{u}")),
        );

        let pairs: Vec<(String, String)> = economy_account::Entity::find()
            .select_only()
            .column(economy_account::Column::GuildId)
            .column(economy_account::Column::UserId)
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(pairs.into_iter().map(|(g, u)| format!("guild:{g}:economy:{u}")));

        let pairs: Vec<(String, String)> = afk_status::Entity::find()
            .select_only()
            .column(afk_status::Column::GuildId)
            .column(afk_status::Column::UserId)
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(pairs.into_iter().map(|(g, u)| format!("guild:{g}:afk:{u}")));

        let pairs: Vec<(String, String)> = ticket::Entity::find()
            .select_only()
            .column(ticket::Column::GuildId)
            .column(ticket::Column::ChannelId)
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(pairs.into_iter().map(|(g, c)| format!("guild:{g}:ticket:{c}")));

        let now = Utc::now();
        let live = Condition::any()
            .add(temp_entry::Column::ExpiresAt.is_null())
            .add(temp_entry::Column::ExpiresAt.gt(now));
        let literal: Vec<String> = temp_entry::Entity::find()
            .select_only()
            .column(temp_entry::Column::Key)
            .filter(live)
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(literal);

        let live = Condition::any()
            .add(cache_entry::Column::ExpiresAt.is_null())
            .add(cache_entry::Column::ExpiresAt.gt(now));
        let literal: Vec<String> = cache_entry::Entity::find()
            .select_only()
            .column(cache_entry::Column::Key)
            .filter(live)
            .into_tuple()
            .all(&self.db)
            .await?;
        keys.extend(literal);

        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Read-modify-write counter. Concurrent increments through the
    /// relational driver can lose updates; counter-heavy keys belong in
    /// Redis.
    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        let current = self.get(key).await?.and_then(|v| v.as_i64()).unwrap_or(0);
        let next = current.saturating_add(amount);
        let remaining = self.ttl(key).await?;
        self.set(key, Value::from(next), remaining).await?;
        Ok(next)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let expires_at = match parse_key(key).kind {
            KeyKind::Cache => cache_entry::Entity::find_by_id(key)
                .one(&self.db)
                .await?
                .and_then(|row| row.expires_at),
            KeyKind::Temp => temp_entry::Entity::find_by_id(key)
                .one(&self.db)
                .await?
                .and_then(|row| row.expires_at),
            _ => None,
        };
        let Some(at) = expires_at else {
            return Ok(None);
        };
        let now = Utc::now();
        if at <= now {
            return Ok(None);
        }
        Ok((at - now).to_std().ok())
    }

    fn connection_type(&self) -> ConnectionType {
        ConnectionType::Postgres
    }

    async fn close(&self) -> Result<()> {
        self.db.clone().close().await?;
        Ok(())
    }
}
