//! Temp data entity - Catch-all table for keys with no dedicated schema.
//!
//! Any storage key the translator cannot classify lands here, keyed by the
//! literal key string. The nullable expiry column backs TTL semantics;
//! expired rows are filtered on read and overwritten on write rather than
//! swept in the background.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Temp data database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "temp_data")]
pub struct Model {
    /// Full literal storage key
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Stored JSON value
    pub data: Json,
    /// Absolute expiry time, NULL for no expiry
    pub expires_at: Option<DateTimeUtc>,
}

/// Catch-all rows reference nothing
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
