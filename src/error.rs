use thiserror::Error;

/// Main error type for aslkit
#[derive(Debug, Error)]
pub enum AslError {
    // Native resource creation errors
    #[error("Failed to open log client (ident: {ident:?}, facility: {facility:?})")]
    ClientOpen { ident: String, facility: String },

    #[error("Failed to create query")]
    QueryCreate,

    #[error("Log store unavailable: {0}")]
    StoreUnavailable(String),

    // Query errors
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Missing required configuration field: {0}")]
    MissingConfigField(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    // Fixture files for the in-memory store
    #[error("Invalid fixture: {0}")]
    Fixture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for aslkit operations
pub type Result<T> = std::result::Result<T, AslError>;
