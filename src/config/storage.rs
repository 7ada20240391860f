//! Storage configuration from environment variables.
//!
//! Backend selection and connection URLs come from the environment (loaded
//! from `.env` in development via `dotenvy`). Redis is the default backend;
//! setting `STORAGE_BACKEND=postgres` switches to the relational driver and
//! `STORAGE_BACKEND=memory` forces the in-process store, which is mostly
//! useful for local development without any services running.

use crate::storage::backend::ConnectionType;

/// Default Redis URL when `REDIS_URL` is not set.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1/";

/// Connection settings for the storage service.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Which backend the service should connect to first.
    pub backend: ConnectionType,
    /// Redis connection URL.
    pub redis_url: String,
    /// Database URL for the relational backend. Required when `backend` is
    /// `Postgres`, unused otherwise.
    pub database_url: Option<String>,
    /// Tuning for the backend migration utility.
    pub migration: MigrationConfig,
}

/// Tuning knobs for keyspace migration.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// How many migrated keys to spot-check against the destination.
    pub verify_sample_size: usize,
    /// Keyspace size above which a full migration scan logs a warning.
    pub full_scan_warn_threshold: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            verify_sample_size: 10,
            full_scan_warn_threshold: 50_000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: ConnectionType::Redis,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            database_url: None,
            migration: MigrationConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Builds the configuration from environment variables.
    ///
    /// Reads `STORAGE_BACKEND`, `REDIS_URL`, `DATABASE_URL`,
    /// `MIGRATION_VERIFY_SAMPLE_SIZE` and `MIGRATION_SCAN_WARN_THRESHOLD`.
    /// Every variable has a default, so this never fails; unparseable
    /// numeric values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Make it non-fatal, env vars can be set externally

        let backend = match std::env::var("STORAGE_BACKEND").as_deref() {
            Ok("postgres" | "database") => ConnectionType::Postgres,
            Ok("memory") => ConnectionType::Memory,
            _ => ConnectionType::Redis,
        };

        let defaults = MigrationConfig::default();
        let migration = MigrationConfig {
            verify_sample_size: env_usize("MIGRATION_VERIFY_SAMPLE_SIZE")
                .unwrap_or(defaults.verify_sample_size),
            full_scan_warn_threshold: env_usize("MIGRATION_SCAN_WARN_THRESHOLD")
                .unwrap_or(defaults.full_scan_warn_threshold),
        };

        Self {
            backend,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            migration,
        }
    }

    /// Configuration pinned to the in-process memory backend.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            backend: ConnectionType::Memory,
            ..Self::default()
        }
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, ConnectionType::Redis);
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert!(config.database_url.is_none());
        assert_eq!(config.migration.verify_sample_size, 10);
        assert_eq!(config.migration.full_scan_warn_threshold, 50_000);
    }

    #[test]
    fn test_memory_preset() {
        let config = StorageConfig::memory();
        assert_eq!(config.backend, ConnectionType::Memory);
    }
}
