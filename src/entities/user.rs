//! User entity - Parent row for user-scoped records (levels, economy, AFK).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Discord user snowflake, stored as text
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
}

/// User-scoped tables hang off this entity
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many per-guild level rows
    #[sea_orm(has_many = "super::user_level::Entity")]
    UserLevels,
    /// One user has many per-guild economy rows
    #[sea_orm(has_many = "super::economy_account::Entity")]
    EconomyAccounts,
}

impl ActiveModelBehavior for ActiveModel {}
