//! Ticket entity - Support-ticket state, one row per ticket channel.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ticket database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    /// Owning guild snowflake
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    /// Channel snowflake the ticket lives in
    #[sea_orm(primary_key, auto_increment = false)]
    pub channel_id: String,
    /// Ticket document (opener, subject, status)
    pub data: Json,
    /// When this row was last written
    pub updated_at: DateTimeUtc,
}

/// Parent rows this entity references
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each ticket belongs to one guild
    #[sea_orm(
        belongs_to = "super::guild::Entity",
        from = "Column::GuildId",
        to = "super::guild::Column::Id"
    )]
    Guild,
}

impl ActiveModelBehavior for ActiveModel {}
