//! Birthday entity - One row per user birthday within a guild.
//!
//! The storage layer presents birthdays as a single `{userId: {month, day}}`
//! document; this table is the normalized form it is reassembled from.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Birthday database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "birthdays")]
pub struct Model {
    /// Owning guild snowflake
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    /// Celebrating user snowflake
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Birth month, 1-12
    pub month: i16,
    /// Day of month, 1-31
    pub day: i16,
}

/// Parent rows this entity references
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each birthday belongs to one guild
    #[sea_orm(
        belongs_to = "super::guild::Entity",
        from = "Column::GuildId",
        to = "super::guild::Column::Id"
    )]
    Guild,
    /// Each birthday belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::guild::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guild.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
