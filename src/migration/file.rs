//! Migration file discovery and parsing

use crate::migration::{calculate_checksum, MigrationError};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

// Pattern: m{14 digits}_{name}.rs
#[allow(clippy::expect_used)] // Literal pattern, covered by tests
static FILENAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^m(\d{14})_(.+)\.rs$").expect("migration filename pattern is valid"));

/// Represents a discovered migration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Path to the migration file
    pub path: PathBuf,

    /// Migration version (timestamp: YYYYMMDDHHMMSS)
    pub version: i64,

    /// Human-readable migration name
    pub name: String,

    /// SHA-256 checksum of the file content
    pub checksum: String,
}

impl MigrationFile {
    /// Create a new MigrationFile
    pub fn new(path: PathBuf, version: i64, name: String, checksum: String) -> Self {
        Self {
            path,
            version,
            name,
            checksum,
        }
    }

    /// Parse migration file name to extract version and name
    ///
    /// Expected format: `m{YYYYMMDDHHMMSS}_{name}.rs`
    ///
    /// # Example
    /// - `m20240120120000_create_users_table.rs` → version: 20240120120000, name: "create_users_table"
    pub fn parse_filename(filename: &str) -> Result<(i64, String), MigrationError> {
        let caps = FILENAME_PATTERN.captures(filename).ok_or_else(|| {
            MigrationError::InvalidFormat(format!(
                "Migration file name '{}' does not match expected pattern: m{{YYYYMMDDHHMMSS}}_{{name}}.rs",
                filename
            ))
        })?;

        let (Some(version_match), Some(name_match)) = (caps.get(1), caps.get(2)) else {
            return Err(MigrationError::InvalidFormat(filename.to_string()));
        };

        let version = version_match
            .as_str()
            .parse::<i64>()
            .map_err(|_| MigrationError::InvalidVersion(version_match.as_str().to_string()))?;

        Ok((version, name_match.as_str().to_string()))
    }

    /// Canonical file name for a version, the inverse of [`parse_filename`](Self::parse_filename)
    pub fn filename_for(version: i64, name: &str) -> String {
        format!("m{}_{}.rs", version, name)
    }
}

/// Discover all migration files under a directory
///
/// Walks the migrations directory recursively (organized layouts keep files
/// in `YYYY/` or `YYYY/MM/` subdirectories) for files matching
/// `m{YYYYMMDDHHMMSS}_{name}.rs` and returns them sorted by version
/// (oldest first). Files without an `.rs` extension are ignored.
///
/// # Errors
///
/// Returns errors if:
/// - The directory doesn't exist or can't be read
/// - An `.rs` file has an invalid name
/// - Checksum calculation fails
pub fn discover_migrations(migrations_dir: &Path) -> Result<Vec<MigrationFile>, MigrationError> {
    if !migrations_dir.exists() {
        return Err(MigrationError::DirectoryNotFound(
            migrations_dir.to_string_lossy().to_string(),
        ));
    }

    if !migrations_dir.is_dir() {
        return Err(MigrationError::InvalidFormat(format!(
            "Path is not a directory: {}",
            migrations_dir.display()
        )));
    }

    let mut migrations = Vec::new();
    collect_migrations(migrations_dir, &mut migrations)?;

    migrations.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.path.cmp(&b.path)));

    Ok(migrations)
}

fn collect_migrations(dir: &Path, migrations: &mut Vec<MigrationFile>) -> Result<(), MigrationError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        MigrationError::DirectoryNotFound(format!(
            "Failed to read migrations directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            MigrationError::DirectoryNotFound(format!("Failed to read directory entry: {}", e))
        })?;

        let path = entry.path();

        if path.is_dir() {
            collect_migrations(&path, migrations)?;
            continue;
        }

        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }

        let filename = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            MigrationError::InvalidFormat(format!("Invalid filename: {}", path.display()))
        })?;

        // Module files that group organized migrations are not migrations
        if filename == "mod.rs" {
            continue;
        }

        let (version, name) = MigrationFile::parse_filename(filename)?;
        let checksum = calculate_checksum(&path)?;

        migrations.push(MigrationFile::new(path, version, name, checksum));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_filename() {
        let (version, name) =
            MigrationFile::parse_filename("m20240120120000_create_users_table.rs").unwrap();
        assert_eq!(version, 20_240_120_120_000);
        assert_eq!(name, "create_users_table");
    }

    #[test]
    fn test_parse_filename_rejects_bad_names() {
        assert!(MigrationFile::parse_filename("create_users_table.rs").is_err());
        assert!(MigrationFile::parse_filename("m2024_create_users.rs").is_err());
        assert!(MigrationFile::parse_filename("m20240120120000_create_users.sql").is_err());
    }

    #[test]
    fn test_filename_for_round_trips() {
        let filename = MigrationFile::filename_for(20_240_301_090_000, "add_index");
        assert_eq!(filename, "m20240301090000_add_index.rs");
        let (version, name) = MigrationFile::parse_filename(&filename).unwrap();
        assert_eq!(version, 20_240_301_090_000);
        assert_eq!(name, "add_index");
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = discover_migrations(&dir.path().join("nope"));
        assert!(matches!(result, Err(MigrationError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_discover_sorted_and_recursive() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("2024").join("03");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.path().join("m20240301090000_second.rs"), "// second").unwrap();
        fs::write(nested.join("m20240120120000_first.rs"), "// first").unwrap();
        fs::write(dir.path().join("README.md"), "not a migration").unwrap();
        fs::write(dir.path().join("mod.rs"), "mod m20240301090000_second;").unwrap();

        let found = discover_migrations(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "first");
        assert_eq!(found[0].path, nested.join("m20240120120000_first.rs"));
        assert_eq!(found[1].version, 20_240_301_090_000);
    }

    #[test]
    fn test_discover_invalid_rs_file_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("helpers.rs"), "// not a migration").unwrap();
        assert!(matches!(
            discover_migrations(dir.path()),
            Err(MigrationError::InvalidFormat(_))
        ));
    }
}
