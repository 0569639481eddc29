//! Migration-specific error types

use std::path::PathBuf;

/// Errors raised while discovering or registering migrations
#[derive(Debug)]
pub enum MigrationError {
    /// Migrations directory not found or unreadable
    DirectoryNotFound(String),
    /// Invalid migration file name or content
    InvalidFormat(String),
    /// Migration file could not be read for checksumming
    Io { path: PathBuf, error: String },
    /// Invalid migration version
    InvalidVersion(String),
    /// A different migration already claims this version
    AlreadyRegistered {
        version: i64,
        name: String,
        existing: PathBuf,
    },
    /// Configuration file could not be parsed
    InvalidConfigurationFile { path: PathBuf, error: String },
}

impl std::fmt::Display for MigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationError::DirectoryNotFound(path) => {
                write!(f, "Migrations directory not found: {}", path)
            }
            MigrationError::InvalidFormat(msg) => write!(f, "Invalid migration format: {}", msg),
            MigrationError::Io { path, error } => {
                write!(f, "Failed to read migration file {}: {}", path.display(), error)
            }
            MigrationError::InvalidVersion(version) => {
                write!(f, "Invalid migration version: {}", version)
            }
            MigrationError::AlreadyRegistered {
                version,
                name,
                existing,
            } => {
                write!(
                    f,
                    "Migration '{}' (version {}) is already registered from {}\n\
                     Suggestion: Each version must appear exactly once across the migrations directory tree",
                    name,
                    version,
                    existing.display()
                )
            }
            MigrationError::InvalidConfigurationFile { path, error } => {
                write!(
                    f,
                    "Invalid migrations configuration file {}: {}",
                    path.display(),
                    error
                )
            }
        }
    }
}

impl std::error::Error for MigrationError {}
