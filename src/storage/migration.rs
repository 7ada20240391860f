//! Backend-to-backend keyspace migration.
//!
//! Copies every key from one storage backend to another, preserving TTLs,
//! and verifies the result with a count comparison plus a random sample of
//! value equality checks. One bad key never aborts the run: failures are
//! recorded in the report and the scan moves on. Migrations expect an empty
//! destination; pre-existing keys surface as a count mismatch.
//!
//! Re-running a migration is safe. Every copy is an overwrite, so a second
//! pass converges on the same destination state.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::storage::MigrationConfig;
use crate::errors::Result;
use crate::storage::backend::StorageBackend;

/// One key that failed to copy, with the backend error it hit.
#[derive(Debug, Clone, Serialize)]
pub struct KeyFailure {
    /// The key that could not be copied.
    pub key: String,
    /// Rendered backend error.
    pub error: String,
}

/// Outcome of a keyspace migration.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// Keys found in the source scan.
    pub total_keys: usize,
    /// Keys copied to the destination.
    pub migrated: usize,
    /// Keys that vanished between the scan and the copy (usually expiry).
    pub skipped: usize,
    /// Keys that errored; details in `failures`.
    pub failed: usize,
    /// Migrated key counts grouped by record family.
    pub groups: BTreeMap<String, usize>,
    /// Every failed key with its error.
    pub failures: Vec<KeyFailure>,
    /// Wall-clock time the whole run took.
    pub elapsed: Duration,
    /// Keys the destination reported after the copy.
    pub dest_count: usize,
    /// Destination count differs from the number of migrated keys.
    pub count_mismatch: bool,
    /// Size of the random sample compared value-for-value.
    pub sample_checked: usize,
    /// Sampled keys whose destination value differed from the source.
    pub sample_mismatches: Vec<String>,
}

impl MigrationReport {
    /// Whether every key arrived and verification found no differences.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !self.count_mismatch && self.sample_mismatches.is_empty()
    }
}

/// Coarse record family for the migration report. Less precise than the
/// schema translator on purpose: the report is for operators eyeballing
/// what moved, not for routing.
fn taxonomy(key: &str) -> &'static str {
    if key.starts_with("temp:") {
        return "temp";
    }
    if key.starts_with("cache:") {
        return "cache";
    }
    let mut parts = key.split(':');
    if parts.next() == Some("guild") {
        let _guild_id = parts.next();
        return match parts.next() {
            Some("config") => "config",
            Some("birthdays") => "birthdays",
            Some("giveaways") => "giveaways",
            Some("welcome") => "welcome",
            Some("leveling") => match parts.next() {
                Some("users") => "user-level",
                _ => "leveling",
            },
            Some("economy") => "economy",
            Some("afk") => "afk",
            Some("ticket") => "ticket",
            _ => "other",
        };
    }
    "other"
}

async fn copy_key(
    source: &dyn StorageBackend,
    dest: &dyn StorageBackend,
    key: &str,
) -> Result<bool> {
    let Some(value) = source.get(key).await? else {
        // Listed but gone by the time we read it, most likely expired.
        return Ok(false);
    };
    let ttl = source.ttl(key).await?;
    dest.set(key, value, ttl).await?;
    Ok(true)
}

/// Copies the full keyspace of `source` into `dest` and verifies the copy.
///
/// # Errors
/// Returns an error only when the initial source scan or the destination
/// verification scan fails. Individual key errors are collected in the
/// report instead.
#[instrument(skip(source, dest, options))]
pub async fn migrate_backend(
    source: &dyn StorageBackend,
    dest: &dyn StorageBackend,
    options: &MigrationConfig,
) -> Result<MigrationReport> {
    let started = Instant::now();
    info!(
        source = %source.connection_type(),
        dest = %dest.connection_type(),
        "Starting storage migration"
    );

    let keys = source.list("").await?;
    if keys.len() > options.full_scan_warn_threshold {
        warn!(
            total = keys.len(),
            threshold = options.full_scan_warn_threshold,
            "Large keyspace, full migration scan will take a while"
        );
    }

    let mut migrated_keys: Vec<String> = Vec::with_capacity(keys.len());
    let mut groups: BTreeMap<String, usize> = BTreeMap::new();
    let mut failures: Vec<KeyFailure> = Vec::new();
    let mut skipped = 0usize;

    for key in &keys {
        match copy_key(source, dest, key).await {
            Ok(true) => {
                *groups.entry(taxonomy(key).to_string()).or_insert(0) += 1;
                migrated_keys.push(key.clone());
            }
            Ok(false) => {
                debug!(key, "Key vanished during migration, skipped");
                skipped += 1;
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to migrate key");
                failures.push(KeyFailure {
                    key: key.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let dest_count = dest.list("").await?.len();
    let count_mismatch = dest_count != migrated_keys.len();
    if count_mismatch {
        warn!(
            migrated = migrated_keys.len(),
            dest_count, "Destination key count does not match migrated keys"
        );
    }

    let sample_size = options.verify_sample_size.min(migrated_keys.len());
    let mut sample_mismatches = Vec::new();
    if sample_size > 0 {
        let mut rng = rand::thread_rng();
        for key in migrated_keys.choose_multiple(&mut rng, sample_size) {
            let matches = match (source.get(key).await, dest.get(key).await) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };
            if !matches {
                warn!(key, "Sampled key differs between source and destination");
                sample_mismatches.push(key.clone());
            }
        }
    }

    let report = MigrationReport {
        total_keys: keys.len(),
        migrated: migrated_keys.len(),
        skipped,
        failed: failures.len(),
        groups,
        failures,
        elapsed: started.elapsed(),
        dest_count,
        count_mismatch,
        sample_checked: sample_size,
        sample_mismatches,
    };
    info!(
        total = report.total_keys,
        migrated = report.migrated,
        skipped = report.skipped,
        failed = report.failed,
        elapsed_ms = report.elapsed.as_millis(),
        "Storage migration finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::storage::backend::ConnectionType;
    use crate::storage::memory::MemoryBackend;
    use crate::test_utils::{init_test_tracing, setup_relational_backend};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    async fn seeded_source() -> Result<MemoryBackend> {
        let source = MemoryBackend::new();
        source.set("guild:1:config", json!({ "prefix": "!" }), None).await?;
        source
            .set(
                "guild:1:birthdays",
                json!({ "7": { "month": 5, "day": 17 } }),
                None,
            )
            .await?;
        source.set("guild:2:economy:9", json!({ "balance": 10 }), None).await?;
        source.set("cache:invites:1", json!(4), None).await?;
        source
            .set("temp:vote:55", json!("yes"), Some(Duration::from_secs(120)))
            .await?;
        Ok(source)
    }

    #[tokio::test]
    async fn test_full_migration_with_ttl() -> Result<()> {
        init_test_tracing();
        let source = seeded_source().await?;
        let dest = MemoryBackend::new();

        let report = migrate_backend(&source, &dest, &MigrationConfig::default()).await?;

        assert_eq!(report.total_keys, 5);
        assert_eq!(report.migrated, 5);
        assert_eq!(report.failed, 0);
        assert_eq!(report.skipped, 0);
        assert!(report.is_clean());
        assert_eq!(report.groups.get("config"), Some(&1));
        assert_eq!(report.groups.get("birthdays"), Some(&1));
        assert_eq!(report.groups.get("economy"), Some(&1));

        assert_eq!(dest.get("guild:1:config").await?, Some(json!({ "prefix": "!" })));
        // The TTL travelled with the value.
        assert!(dest.ttl("temp:vote:55").await?.is_some());
        assert_eq!(dest.ttl("guild:1:config").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_migration_is_idempotent() -> Result<()> {
        init_test_tracing();
        let source = seeded_source().await?;
        let dest = MemoryBackend::new();

        migrate_backend(&source, &dest, &MigrationConfig::default()).await?;
        let second = migrate_backend(&source, &dest, &MigrationConfig::default()).await?;

        assert_eq!(second.migrated, 5);
        assert!(!second.count_mismatch);
        assert!(second.sample_mismatches.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_migration_into_relational_backend() -> Result<()> {
        init_test_tracing();
        let source = seeded_source().await?;
        let dest = setup_relational_backend().await?;

        let report = migrate_backend(&source, &dest, &MigrationConfig::default()).await?;

        assert!(report.is_clean());
        assert_eq!(
            dest.get("guild:1:birthdays").await?,
            Some(json!({ "7": { "month": 5, "day": 17 } }))
        );
        assert_eq!(dest.get("guild:2:economy:9").await?, Some(json!({ "balance": 10 })));
        assert_eq!(dest.get("cache:invites:1").await?, Some(json!(4)));
        Ok(())
    }

    /// Delegates to an inner memory store but refuses to read one key.
    #[derive(Debug)]
    struct FlakyBackend {
        inner: MemoryBackend,
        poison: String,
    }

    #[async_trait]
    impl StorageBackend for FlakyBackend {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            if key == self.poison {
                return Err(Error::Unavailable {
                    message: "injected read failure".to_string(),
                });
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<bool> {
            self.inner.delete(key).await
        }

        async fn list(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.list(prefix).await
        }

        async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
            self.inner.increment(key, amount).await
        }

        async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
            self.inner.ttl(key).await
        }

        fn connection_type(&self) -> ConnectionType {
            ConnectionType::Memory
        }
    }

    #[tokio::test]
    async fn test_one_bad_key_does_not_abort_the_run() -> Result<()> {
        init_test_tracing();
        let source = FlakyBackend {
            inner: seeded_source().await?,
            poison: "guild:1:config".to_string(),
        };
        let dest = MemoryBackend::new();

        let report = migrate_backend(&source, &dest, &MigrationConfig::default()).await?;

        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].key, "guild:1:config");
        assert_eq!(report.migrated, 4);
        // The healthy keys still made it across.
        assert_eq!(dest.get("cache:invites:1").await?, Some(json!(4)));
        assert!(!report.is_clean());
        Ok(())
    }

    #[tokio::test]
    async fn test_preexisting_destination_keys_flag_a_mismatch() -> Result<()> {
        init_test_tracing();
        let source = seeded_source().await?;
        let dest = MemoryBackend::new();
        dest.set("leftover:1", json!(0), None).await?;

        let report = migrate_backend(&source, &dest, &MigrationConfig::default()).await?;

        assert!(report.count_mismatch);
        assert!(!report.is_clean());
        Ok(())
    }

    #[tokio::test]
    async fn test_report_separates_user_levels_from_leveling_config() -> Result<()> {
        init_test_tracing();
        let source = MemoryBackend::new();
        source.set("guild:1:leveling", json!({ "enabled": true }), None).await?;
        source.set("guild:1:leveling:users:2", json!({ "xp": 40 }), None).await?;
        source.set("guild:1:ticket:3", json!({ "open": true }), None).await?;
        let dest = MemoryBackend::new();

        let report = migrate_backend(&source, &dest, &MigrationConfig::default()).await?;

        assert_eq!(report.groups.get("leveling"), Some(&1));
        assert_eq!(report.groups.get("user-level"), Some(&1));
        assert_eq!(report.groups.get("ticket"), Some(&1));
        Ok(())
    }

    #[test]
    fn test_taxonomy_groups() {
        assert_eq!(taxonomy("guild:1:config"), "config");
        assert_eq!(taxonomy("guild:1:leveling"), "leveling");
        assert_eq!(taxonomy("guild:1:leveling:config"), "leveling");
        assert_eq!(taxonomy("guild:1:leveling:users:7"), "user-level");
        assert_eq!(taxonomy("guild:1:ticket:42"), "ticket");
        assert_eq!(taxonomy("guild:1:jointocreate"), "other");
        assert_eq!(taxonomy("temp:anything"), "temp");
        assert_eq!(taxonomy("cache:anything"), "cache");
        assert_eq!(taxonomy("guild:1:mystery"), "other");
        assert_eq!(taxonomy("loose-key"), "other");
    }
}
