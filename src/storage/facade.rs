//! Storage service facade.
//!
//! The single entry point the rest of the crate talks to. The service owns
//! one backend chosen by configuration, connects to it lazily on first use
//! (or eagerly through [`StorageService::init`]), and degrades to the
//! in-process memory store when the configured backend cannot be reached.
//!
//! Every operation is infallible from the caller's point of view: backend
//! errors are logged and mapped to a safe default (`None`, `false`, an
//! empty list, or the unapplied counter delta). Command handlers therefore
//! never need error paths for storage outages; they observe missing data
//! and carry on.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::config::storage::StorageConfig;
use crate::errors::{Error, Result};
use crate::storage::backend::{ConnectionType, StorageBackend};
use crate::storage::memory::MemoryBackend;
use crate::storage::postgres::RelationalBackend;
use crate::storage::redis::RedisBackend;

/// Facade over the configured storage backend.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct StorageService {
    config: StorageConfig,
    backend: RwLock<Option<Arc<dyn StorageBackend>>>,
    degraded: AtomicBool,
}

impl StorageService {
    /// Creates a service that will connect per `config` on first use.
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            backend: RwLock::new(None),
            degraded: AtomicBool::new(false),
        }
    }

    /// Creates a service configured from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(StorageConfig::from_env())
    }

    /// Creates a service over a fresh in-process memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    /// Creates a service over an already connected backend.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            config: StorageConfig::memory(),
            backend: RwLock::new(Some(backend)),
            degraded: AtomicBool::new(false),
        }
    }

    /// The configuration this service was built with.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Connects to the configured backend now instead of on first use.
    ///
    /// An unreachable backend is not an error here: the service falls back
    /// to the memory store with a warning, exactly as the lazy path does.
    /// Configuration mistakes (such as selecting the relational backend
    /// without a database URL) do surface, so deployments fail fast.
    ///
    /// # Errors
    /// Returns configuration errors. Availability problems degrade instead.
    #[instrument(skip(self))]
    pub async fn init(&self) -> Result<()> {
        let mut slot = self.backend.write().await;
        if slot.is_some() {
            return Ok(());
        }
        match self.connect_primary().await {
            Ok(backend) => {
                *slot = Some(backend);
                Ok(())
            }
            Err(e) if e.is_availability() => {
                warn!(error = %e, "Storage backend unreachable, using in-memory fallback");
                self.degraded.store(true, Ordering::SeqCst);
                *slot = Some(Arc::new(MemoryBackend::new()));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Closes the current backend connection, if any.
    ///
    /// The service stays usable: the next operation reconnects from
    /// scratch, clearing any degraded state.
    ///
    /// # Errors
    /// Returns the backend's close error, if it reports one.
    pub async fn close(&self) -> Result<()> {
        let backend = self.backend.write().await.take();
        self.degraded.store(false, Ordering::SeqCst);
        if let Some(backend) = backend {
            debug!(backend = %backend.connection_type(), "Closing storage backend");
            backend.close().await?;
        }
        Ok(())
    }

    /// Whether the service currently holds a healthy, non-fallback backend.
    pub async fn is_available(&self) -> bool {
        self.backend.read().await.is_some() && !self.is_degraded()
    }

    /// Whether the service fell back to the in-memory store.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Kind of the connected backend, `None` before the first connection.
    pub async fn connection_type(&self) -> Option<ConnectionType> {
        self.backend
            .read()
            .await
            .as_ref()
            .map(|b| b.connection_type())
    }

    async fn connect_primary(&self) -> Result<Arc<dyn StorageBackend>> {
        match self.config.backend {
            ConnectionType::Redis => Ok(Arc::new(
                RedisBackend::connect(&self.config.redis_url).await?,
            )),
            ConnectionType::Postgres => {
                let url = self
                    .config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| Error::Config {
                        message: "DATABASE_URL must be set when STORAGE_BACKEND=postgres"
                            .to_string(),
                    })?;
                Ok(Arc::new(RelationalBackend::connect(url).await?))
            }
            ConnectionType::Memory => Ok(Arc::new(MemoryBackend::new())),
        }
    }

    /// Returns the connected backend, connecting (or degrading) on first
    /// use.
    async fn backend(&self) -> Arc<dyn StorageBackend> {
        if let Some(backend) = self.backend.read().await.as_ref() {
            return backend.clone();
        }
        let mut slot = self.backend.write().await;
        // Another task may have connected while we waited for the lock.
        if let Some(backend) = slot.as_ref() {
            return backend.clone();
        }
        let backend: Arc<dyn StorageBackend> = match self.connect_primary().await {
            Ok(backend) => backend,
            Err(e) => {
                warn!(error = %e, "Storage backend unreachable, using in-memory fallback");
                self.degraded.store(true, Ordering::SeqCst);
                Arc::new(MemoryBackend::new())
            }
        };
        *slot = Some(backend.clone());
        backend
    }

    /// Reads a value. Missing keys and backend failures both yield `None`.
    pub async fn get(&self, key: &str) -> Option<Value> {
        match self.backend().await.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Storage get failed");
                None
            }
        }
    }

    /// Reads a value, substituting `default` when the key is missing or the
    /// backend is unreachable.
    pub async fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).await.unwrap_or(default)
    }

    /// Reads a value and deserializes it. Decode failures are logged and
    /// yield `None`, the same as a missing key.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key, error = %e, "Stored value has unexpected shape");
                None
            }
        }
    }

    /// Writes a value, optionally with a TTL. Returns whether the write
    /// reached the backend.
    pub async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        match self.backend().await.set(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Storage set failed");
                false
            }
        }
    }

    /// Serializes and writes a value. Returns whether the write reached the
    /// backend.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> bool {
        match serde_json::to_value(value) {
            Ok(encoded) => self.set(key, encoded, ttl).await,
            Err(e) => {
                warn!(key, error = %e, "Value failed to serialize");
                false
            }
        }
    }

    /// Deletes a key. Returns `true` only when the key existed.
    pub async fn delete(&self, key: &str) -> bool {
        match self.backend().await.delete(key).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(key, error = %e, "Storage delete failed");
                false
            }
        }
    }

    /// Whether the key exists. Failures read as absent.
    pub async fn exists(&self, key: &str) -> bool {
        match self.backend().await.exists(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key, error = %e, "Storage exists check failed");
                false
            }
        }
    }

    /// Lists keys beginning with `prefix`. Failures read as an empty
    /// keyspace.
    pub async fn list(&self, prefix: &str) -> Vec<String> {
        match self.backend().await.list(prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(prefix, error = %e, "Storage list failed");
                Vec::new()
            }
        }
    }

    /// Atomically adds `amount` to a counter and returns the new value.
    /// On failure the delta is reported as if applied to a zero counter.
    pub async fn increment(&self, key: &str, amount: i64) -> i64 {
        match self.backend().await.increment(key, amount).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Storage increment failed");
                amount
            }
        }
    }

    /// Atomically subtracts `amount` from a counter and returns the new
    /// value. On failure the delta is reported as if applied to a zero
    /// counter.
    pub async fn decrement(&self, key: &str, amount: i64) -> i64 {
        match self.backend().await.decrement(key, amount).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Storage decrement failed");
                -amount
            }
        }
    }

    /// Remaining TTL for a key, `None` when absent or persistent. Failures
    /// read as `None`.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        match self.backend().await.ttl(key).await {
            Ok(remaining) => remaining,
            Err(e) => {
                warn!(key, error = %e, "Storage ttl lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::init_test_tracing;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct WelcomeSettings {
        channel_id: String,
        message: String,
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        init_test_tracing();
        let storage = StorageService::memory();
        let settings = WelcomeSettings {
            channel_id: "42".to_string(),
            message: "hello {user}".to_string(),
        };

        assert!(storage.set_json("guild:1:welcome", &settings, None).await);
        let loaded: WelcomeSettings = storage.get_json("guild:1:welcome").await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn test_shape_mismatch_reads_as_missing() {
        init_test_tracing();
        let storage = StorageService::memory();
        storage.set("guild:1:welcome", json!("just a string"), None).await;

        let loaded: Option<WelcomeSettings> = storage.get_json("guild:1:welcome").await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_get_or_falls_back_to_the_default() {
        init_test_tracing();
        let storage = StorageService::memory();
        assert_eq!(storage.get_or("guild:1:prefix", json!("!")).await, json!("!"));

        storage.set("guild:1:prefix", json!("?"), None).await;
        assert_eq!(storage.get_or("guild:1:prefix", json!("!")).await, json!("?"));
    }

    #[tokio::test]
    async fn test_counters_stay_consistent() {
        init_test_tracing();
        let storage = StorageService::memory();
        assert_eq!(storage.increment("cache:guild:1:members", 5).await, 5);
        assert_eq!(storage.decrement("cache:guild:1:members", 2).await, 3);
        assert_eq!(storage.get("cache:guild:1:members").await, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_availability_reporting() {
        init_test_tracing();
        let storage = StorageService::memory();
        assert!(storage.is_available().await);
        assert!(!storage.is_degraded());
        assert_eq!(
            storage.connection_type().await,
            Some(ConnectionType::Memory)
        );
    }

    #[tokio::test]
    async fn test_close_then_reuse() -> Result<()> {
        init_test_tracing();
        let storage = StorageService::new(StorageConfig::memory());
        storage.init().await?;
        storage.set("temp:a", json!(1), None).await;

        storage.close().await?;
        assert_eq!(storage.connection_type().await, None);

        // The next operation reconnects; memory contents start fresh.
        assert_eq!(storage.get("temp:a").await, None);
        assert_eq!(
            storage.connection_type().await,
            Some(ConnectionType::Memory)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_misconfigured_relational_backend() {
        init_test_tracing();
        let config = StorageConfig {
            backend: ConnectionType::Postgres,
            database_url: None,
            ..StorageConfig::default()
        };
        let storage = StorageService::new(config);

        // Eager init surfaces the configuration mistake.
        assert!(storage.init().await.is_err());

        // Lazy use still never fails: operations degrade to memory.
        assert!(storage.set("temp:a", json!(1), None).await);
        assert_eq!(storage.get("temp:a").await, Some(json!(1)));
        assert!(storage.is_degraded());
        assert!(!storage.is_available().await);
    }
}
