//! In-memory storage backend.
//!
//! Process-local fallback used when neither Redis nor the database is
//! reachable, and the default store for unit tests. Entries live in a
//! `HashMap` behind an async `RwLock`; expiry is lazy, checked on access
//! rather than by a background sweeper, with expired entries dropped
//! opportunistically so the map does not grow without bound.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::Result;
use crate::storage::backend::{ConnectionType, StorageBackend};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Volatile key-value store. Contents are lost on process exit.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries. Test and diagnostics helper.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired()).count()
    }

    /// Whether the store holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }
        // Expired: remove it now instead of waiting for the next write.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(Entry::is_expired) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some(entry) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired());
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        let mut entries = self.entries.write().await;
        let (current, expires_at) = match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                // Non-integer values restart the counter from zero.
                (entry.value.as_i64().unwrap_or(0), entry.expires_at)
            }
            _ => (0, None),
        };
        let next = current.saturating_add(amount);
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::from(next),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(entry
                .expires_at
                .map(|at| at.saturating_duration_since(Instant::now()))),
            _ => Ok(None),
        }
    }

    fn connection_type(&self) -> ConnectionType {
        ConnectionType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_tracing;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_delete() -> Result<()> {
        init_test_tracing();
        let backend = MemoryBackend::new();
        backend
            .set("guild:1:config", json!({"prefix": "!"}), None)
            .await?;

        assert_eq!(
            backend.get("guild:1:config").await?,
            Some(json!({"prefix": "!"}))
        );
        assert!(backend.exists("guild:1:config").await?);
        assert!(backend.delete("guild:1:config").await?);
        assert!(!backend.delete("guild:1:config").await?);
        assert_eq!(backend.get("guild:1:config").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_ttl_expiry_is_lazy() -> Result<()> {
        init_test_tracing();
        let backend = MemoryBackend::new();
        backend
            .set("temp:token", json!("abc"), Some(Duration::from_millis(40)))
            .await?;

        assert!(backend.ttl("temp:token").await?.is_some());
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(backend.get("temp:token").await?, None);
        assert!(!backend.exists("temp:token").await?);
        assert_eq!(backend.ttl("temp:token").await?, None);
        // The expired entry was evicted by the read above.
        assert!(backend.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_ttl_none_for_persistent_keys() -> Result<()> {
        init_test_tracing();
        let backend = MemoryBackend::new();
        backend.set("guild:1:config", json!(1), None).await?;
        assert_eq!(backend.ttl("guild:1:config").await?, None);
        assert_eq!(backend.ttl("missing").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix_and_expiry() -> Result<()> {
        init_test_tracing();
        let backend = MemoryBackend::new();
        backend.set("guild:1:config", json!(1), None).await?;
        backend.set("guild:1:welcome", json!(2), None).await?;
        backend.set("guild:2:config", json!(3), None).await?;
        backend
            .set("guild:1:expired", json!(4), Some(Duration::from_millis(10)))
            .await?;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let keys = backend.list("guild:1:").await?;
        assert_eq!(keys, vec!["guild:1:config", "guild:1:welcome"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_counters() -> Result<()> {
        init_test_tracing();
        let backend = MemoryBackend::new();
        assert_eq!(backend.increment("cache:hits", 5).await?, 5);
        assert_eq!(backend.increment("cache:hits", 3).await?, 8);
        assert_eq!(backend.decrement("cache:hits", 2).await?, 6);
        assert_eq!(backend.get("cache:hits").await?, Some(json!(6)));

        // Counters on non-numeric values restart from zero.
        backend.set("cache:odd", json!("text"), None).await?;
        assert_eq!(backend.increment("cache:odd", 4).await?, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_increment_preserves_ttl() -> Result<()> {
        init_test_tracing();
        let backend = MemoryBackend::new();
        backend
            .set("temp:count", json!(1), Some(Duration::from_secs(60)))
            .await?;
        backend.increment("temp:count", 1).await?;
        assert!(backend.ttl("temp:count").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_saturates_at_the_integer_edge() -> Result<()> {
        init_test_tracing();
        let backend = MemoryBackend::new();
        // i64::MIN cannot be negated; the delta clamps instead of panicking.
        assert_eq!(backend.decrement("cache:debt", i64::MIN).await?, i64::MAX);
        assert_eq!(backend.increment("cache:debt", 1).await?, i64::MAX);
        Ok(())
    }
}
