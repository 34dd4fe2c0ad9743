//! Error types for rino.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rino operations.
#[derive(Debug, Error)]
pub enum RinoError {
    /// Migration name does not follow `<operation>_<table_name>_table`.
    #[error("Migration name '{0}' must follow the <operation>_<table_name>_table convention")]
    NamingConvention(String),

    /// Writing a generated migration file failed.
    #[error("Failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration's SQL was rejected by the database.
    #[error("Migration '{migration}' failed: {message}")]
    MigrationExecution { migration: String, message: String },

    /// A file in the migrations directory could not be loaded.
    #[error("Invalid migration {}: {message}", path.display())]
    InvalidMigration { path: PathBuf, message: String },

    /// A migration template cannot produce loadable migrations.
    #[error("Invalid template: {0}")]
    Template(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RinoError {
    /// Create an execution error for the named migration.
    pub fn execution(migration: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MigrationExecution {
            migration: migration.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-migration error for the given file.
    pub fn invalid(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidMigration {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The underlying database message, without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Database(msg) | Self::Connection(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for rino operations.
pub type RinoResult<T> = Result<T, RinoError>;
