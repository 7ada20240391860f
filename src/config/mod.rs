/// Storage backend selection and connection settings from the environment
pub mod storage;

/// Voice channel defaults loaded from config.toml
pub mod voice;
