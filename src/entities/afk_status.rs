//! AFK status entity - Away-from-keyboard markers, one row per user per guild.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// AFK status database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "afk_statuses")]
pub struct Model {
    /// Owning guild snowflake
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    /// Marked user snowflake
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// AFK document (reason, set-at timestamp)
    pub data: Json,
    /// When this row was last written
    pub updated_at: DateTimeUtc,
}

/// Parent rows this entity references
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each AFK marker belongs to one guild
    #[sea_orm(
        belongs_to = "super::guild::Entity",
        from = "Column::GuildId",
        to = "super::guild::Column::Id"
    )]
    Guild,
    /// Each AFK marker belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl ActiveModelBehavior for ActiveModel {}
