//! Giveaway entity - One row per running giveaway within a guild.
//!
//! Presented to callers as a `{messageId: giveaway}` document and
//! reassembled from these rows on read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Giveaway database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "giveaways")]
pub struct Model {
    /// Owning guild snowflake
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    /// Discord message snowflake the giveaway is attached to
    #[sea_orm(primary_key, auto_increment = false)]
    pub message_id: String,
    /// Giveaway document (prize, entrants, end time, ...)
    pub data: Json,
}

/// Parent rows this entity references
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each giveaway belongs to one guild
    #[sea_orm(
        belongs_to = "super::guild::Entity",
        from = "Column::GuildId",
        to = "super::guild::Column::Id"
    )]
    Guild,
}

impl Related<super::guild::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guild.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
