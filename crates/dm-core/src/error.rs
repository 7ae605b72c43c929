//! Error types for dm-core

use thiserror::Error;

/// Core error type for docmigrate
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Migrations directory not found
    #[error("[E004] Migrations directory not found: {path}")]
    MigrationsDirNotFound { path: String },

    /// E005: Migration file not found in the migrations directory
    #[error("[E005] Migration file not found: {name}")]
    MigrationNotFound { name: String },

    /// E006: Invalid migration description passed to `create`
    #[error("[E006] Invalid migration description '{description}': {reason}")]
    InvalidDescription { description: String, reason: String },

    /// E007: Migration file already exists
    #[error("[E007] Migration file already exists: {path}")]
    MigrationExists { path: String },

    /// E014: IO error
    #[error("[E014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
