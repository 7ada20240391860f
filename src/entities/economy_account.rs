//! Economy account entity - Per-user economy record within a guild.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Economy account database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "economy_accounts")]
pub struct Model {
    /// Owning guild snowflake
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    /// Account holder snowflake
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Account document (wallet, bank, cooldowns, inventory)
    pub data: Json,
    /// When this row was last written
    pub updated_at: DateTimeUtc,
}

/// Parent rows this entity references
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each account belongs to one guild
    #[sea_orm(
        belongs_to = "super::guild::Entity",
        from = "Column::GuildId",
        to = "super::guild::Column::Id"
    )]
    Guild,
    /// Each account belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
