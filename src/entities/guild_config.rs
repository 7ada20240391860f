//! Guild config entity - The per-guild configuration document.
//!
//! The config payload is schema-less from the storage layer's point of view
//! (command handlers read and write whole documents), so it lives in a JSON
//! column keyed by guild.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Guild configuration database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guild_configs")]
pub struct Model {
    /// Owning guild snowflake
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    /// Configuration document as stored by the command handlers
    pub data: Json,
    /// When this configuration was last written
    pub updated_at: DateTimeUtc,
}

/// Parent rows this entity references
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each config belongs to one guild
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
