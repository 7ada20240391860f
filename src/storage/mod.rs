//! Storage layer - pluggable key-value backends behind one facade
//!
//! All persistent state in the application flows through [`StorageService`],
//! which speaks a flat string-key protocol regardless of what sits behind
//! it: Redis in production, a relational database for deployments that
//! prefer one, or a process-local map when nothing else is reachable. The
//! relational driver routes keys through the schema translator into
//! normalized tables; the other backends store them as-is.

/// Backend contract and connection kinds
pub mod backend;
/// Storage service facade with lazy connection and silent fallback
pub mod facade;
/// In-process fallback store
pub mod memory;
/// Keyspace migration between backends
pub mod migration;
/// Relational backend over `SeaORM`
pub mod postgres;
/// Redis backend
pub mod redis;
/// Key schema translator for the relational driver
pub mod translator;

pub use backend::{ConnectionType, StorageBackend};
pub use facade::StorageService;
pub use memory::MemoryBackend;
pub use migration::{MigrationReport, migrate_backend};
pub use postgres::RelationalBackend;
pub use redis::RedisBackend;
pub use translator::{KeyDescriptor, KeyKind, parse_key};
