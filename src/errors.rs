use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Storage backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("Missing permission: {message}")]
    Permission { message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures the storage facade converts into default-value
    /// returns instead of surfacing to command handlers.
    pub fn is_availability(&self) -> bool {
        matches!(
            self,
            Error::Unavailable { .. } | Error::Database(_) | Error::Redis(_)
        )
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
