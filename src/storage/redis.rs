//! Redis storage backend.
//!
//! Primary production backend. Values are stored as JSON strings; counters
//! use native `INCRBY`/`DECRBY` so concurrent updates stay atomic, and TTLs
//! map onto Redis key expiry. Connections go through a `ConnectionManager`,
//! which transparently reconnects after network drops, so a successfully
//! constructed backend stays usable across Redis restarts.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::Result;
use crate::storage::backend::{ConnectionType, StorageBackend};

/// Storage backend over a Redis server.
#[derive(Clone)]
pub struct RedisBackend {
    manager: ConnectionManager,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Connects to the Redis server at `url` (e.g. `redis://127.0.0.1/`).
    ///
    /// Construction performs the initial handshake, so a returned backend
    /// has already proven the server reachable.
    pub async fn connect(url: &str) -> Result<Self> {
        debug!("Connecting to Redis");
        let client = redis::Client::open(url)?;
        let manager = client.get_connection_manager().await?;
        info!("Redis storage ready");
        Ok(Self { manager })
    }

    fn connection(&self) -> ConnectionManager {
        // ConnectionManager is a cheap handle onto one shared connection.
        self.manager.clone()
    }
}

/// Values written by this backend are JSON documents. Reads of keys written
/// by other tools (plain strings, counter values) still succeed: anything
/// that does not parse as JSON comes back as a JSON string.
fn decode(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

#[async_trait]
impl StorageBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.connection();
        let raw: Option<String> = conn.get(key).await?;
        Ok(raw.map(decode))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let payload = serde_json::to_string(&value)?;
        let mut conn = self.connection();
        match ttl {
            // Sub-second TTLs round up, zero expiry is not valid SETEX.
            Some(ttl) => {
                let seconds = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, payload, seconds).await?;
            }
            None => {
                let _: () = conn.set(key, payload).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection();
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.connection();
        let mut keys: Vec<String> = conn.keys(format!("{prefix}*")).await?;
        keys.sort();
        Ok(keys)
    }

    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        let mut conn = self.connection();
        let value: i64 = conn.incr(key, amount).await?;
        Ok(value)
    }

    async fn decrement(&self, key: &str, amount: i64) -> Result<i64> {
        let mut conn = self.connection();
        let value: i64 = conn.decr(key, amount).await?;
        Ok(value)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.connection();
        // TTL returns -2 for a missing key and -1 for a key with no expiry.
        let seconds: i64 = conn.ttl(key).await?;
        Ok(u64::try_from(seconds).ok().map(Duration::from_secs))
    }

    fn connection_type(&self) -> ConnectionType {
        ConnectionType::Redis
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::init_test_tracing;
    use serde_json::json;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_round_trip_and_delete() -> Result<()> {
        init_test_tracing();
        let backend = RedisBackend::connect(&redis_url()).await?;
        let key = "guildkeeper:test:config";

        backend.set(key, json!({ "prefix": "!" }), None).await?;
        assert_eq!(backend.get(key).await?, Some(json!({ "prefix": "!" })));
        assert!(backend.exists(key).await?);
        assert!(backend.delete(key).await?);
        assert_eq!(backend.get(key).await?, None);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_ttl_round_trip() -> Result<()> {
        init_test_tracing();
        let backend = RedisBackend::connect(&redis_url()).await?;
        let key = "guildkeeper:test:ttl";

        backend
            .set(key, json!("soon gone"), Some(Duration::from_secs(30)))
            .await?;
        let remaining = backend.ttl(key).await?.unwrap();
        assert!(remaining <= Duration::from_secs(30));
        assert!(remaining > Duration::from_secs(20));

        backend.delete(key).await?;
        assert_eq!(backend.ttl(key).await?, None);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_atomic_counters() -> Result<()> {
        init_test_tracing();
        let backend = RedisBackend::connect(&redis_url()).await?;
        let key = "guildkeeper:test:counter";
        backend.delete(key).await?;

        assert_eq!(backend.increment(key, 5).await?, 5);
        assert_eq!(backend.increment(key, 3).await?, 8);
        assert_eq!(backend.decrement(key, 2).await?, 6);
        assert_eq!(backend.get(key).await?, Some(json!(6)));

        backend.delete(key).await?;
        Ok(())
    }
}
