use crate::migration::MigrationError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigureError>;

/// Errors raised while resolving a migration configuration
#[derive(Error, Debug)]
pub enum ConfigureError {
    /// No parameter set exists for the requested connection
    #[error("There is no migrations configuration available for the {} connection", .connection.as_deref().unwrap_or("default"))]
    ConfigurationNotFound { connection: Option<String> },

    #[error("{message}")]
    DirectoryCreation { path: PathBuf, message: String },

    #[error("Invalid value for \"{key}\" parameter.")]
    InvalidOrganizationValue { key: String, value: String },

    #[error("Invalid migrations parameters under \"{key}\": {message}")]
    InvalidParameters { key: String, message: String },

    /// Raised by the configuration's own directory registration
    #[error(transparent)]
    Migration(#[from] MigrationError),
}
