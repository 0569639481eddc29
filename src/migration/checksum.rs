//! Checksum calculation for migration files

use crate::migration::MigrationError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Calculate SHA-256 checksum of a migration file
///
/// The checksum identifies the exact file content a version was registered
/// from, so tooling can flag files edited after they were first seen.
///
/// # Errors
///
/// Returns `MigrationError::Io` if the file cannot be read
pub fn calculate_checksum(migration_file_path: &Path) -> Result<String, MigrationError> {
    let content = fs::read(migration_file_path).map_err(|e| MigrationError::Io {
        path: migration_file_path.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&content);
    let hash = hasher.finalize();

    Ok(format!("{:x}", hash))
}
