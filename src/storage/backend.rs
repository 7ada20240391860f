//! Storage backend contract shared by every driver.
//!
//! Each driver (in-memory, Redis, relational) implements the complete
//! contract on its own - callers never check for optional capabilities.
//! Backends without a native atomic counter implement increment/decrement
//! as read-modify-write, which is only safe under the single-process
//! deployment model this bot assumes.

use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Identifies which driver a store is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    /// Native Redis client.
    Redis,
    /// Process-local map, no persistence.
    Memory,
    /// SeaORM over the relational schema.
    Postgres,
}

impl ConnectionType {
    /// Lower-case driver name, as it appears in configuration and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Redis => "redis",
            ConnectionType::Memory => "memory",
            ConnectionType::Postgres => "postgres",
        }
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform key-value contract over JSON values.
///
/// Keys are opaque colon-delimited strings (`guild:<id>:config`,
/// `temp:<anything>`, ...). Values are arbitrary JSON. A TTL, when given,
/// counts from write time; expired entries read as absent on every backend.
#[async_trait]
pub trait StorageBackend: std::fmt::Debug + Send + Sync + 'static {
    /// Retrieves a value. Returns `Ok(None)` for missing or expired keys.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores a value, overwriting unconditionally. A `ttl` of `None`
    /// clears any previous expiry.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;

    /// Removes a key. Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Checks for a live (non-expired) key.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Lists all live keys starting with `prefix`. An empty prefix
    /// enumerates the whole keyspace.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Adds `amount` to an integer counter, treating a missing key as 0,
    /// and returns the new value.
    async fn increment(&self, key: &str, amount: i64) -> Result<i64>;

    /// Subtracts `amount` from an integer counter and returns the new value.
    /// `i64::MIN` has no positive counterpart, so the negation saturates.
    async fn decrement(&self, key: &str, amount: i64) -> Result<i64> {
        self.increment(key, amount.saturating_neg()).await
    }

    /// Remaining time to live, `Ok(None)` for keys without an expiry or
    /// keys that do not exist.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Which driver this is.
    fn connection_type(&self) -> ConnectionType;

    /// Releases connections/pools. Safe to call more than once.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_type_names() {
        assert_eq!(ConnectionType::Redis.as_str(), "redis");
        assert_eq!(ConnectionType::Memory.as_str(), "memory");
        assert_eq!(ConnectionType::Postgres.as_str(), "postgres");
        assert_eq!(ConnectionType::Postgres.to_string(), "postgres");
    }
}
