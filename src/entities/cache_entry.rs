//! Cache data entity - Catch-all table for `cache:*` keys.
//!
//! Identical shape to `temp_data`; kept as a separate table so cache churn
//! can be truncated or inspected independently of temp state.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cache data database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cache_data")]
pub struct Model {
    /// Full literal storage key
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Stored JSON value
    pub data: Json,
    /// Absolute expiry time, NULL for no expiry
    pub expires_at: Option<DateTimeUtc>,
}

/// Cache rows reference nothing
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
