//! Guild entity - Parent row for every guild-scoped record.
//!
//! Guild rows carry no payload of their own; they exist so that the
//! guild-scoped tables can enforce referential integrity. Rows are created
//! on demand by the relational storage driver before any dependent write.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Guild database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guilds")]
pub struct Model {
    /// Discord guild snowflake, stored as text
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
}

/// Guild-scoped tables hang off this entity
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One guild has one config row
    #[sea_orm(has_many = "super::guild_config::Entity")]
    GuildConfigs,
    /// One guild has many birthday rows
    #[sea_orm(has_many = "super::birthday::Entity")]
    Birthdays,
    /// One guild has many giveaway rows
    #[sea_orm(has_many = "super::giveaway::Entity")]
    Giveaways,
    /// One guild has many per-user level rows
    #[sea_orm(has_many = "super::user_level::Entity")]
    UserLevels,
}

impl Related<super::birthday::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Birthdays.def()
    }
}

impl Related<super::giveaway::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Giveaways.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
