//! Migration configuration
//!
//! [`MigrationConfiguration`] is the settings object the migration engine
//! runs from. It is either built in code ([`ConfigurationSource::DirectoryBased`])
//! or loaded from a TOML file ([`ConfigurationSource::FileBased`]), in which
//! case the file owns the table name and migration registration.

use crate::migration::{MigrationCatalog, MigrationError, MigrationRegistry, MigrationVersion};
use chrono::{Datelike, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Parameter value selecting the year layout
pub const ORGANIZE_BY_YEAR: &str = "year";
/// Parameter value selecting the year/month layout
pub const ORGANIZE_BY_YEAR_AND_MONTH: &str = "year_and_month";

/// Directory layout for migration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Organization {
    /// All files directly in the migrations directory
    #[default]
    Flat,
    /// `<dir>/YYYY/`
    ByYear,
    /// `<dir>/YYYY/MM/`
    ByYearAndMonth,
}

impl Organization {
    /// Interpret an `organize_migrations` value
    ///
    /// `false`, `null` and `""` mean no organization. Returns `None` for
    /// anything unrecognized.
    pub fn from_parameter(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Bool(false) => Some(Organization::Flat),
            Value::String(s) if s.is_empty() => Some(Organization::Flat),
            Value::String(s) if s == ORGANIZE_BY_YEAR => Some(Organization::ByYear),
            Value::String(s) if s == ORGANIZE_BY_YEAR_AND_MONTH => {
                Some(Organization::ByYearAndMonth)
            }
            _ => None,
        }
    }
}

/// Where a configuration came from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigurationSource {
    /// Assembled in code; the resolver fills it and scans its directory
    #[default]
    DirectoryBased,
    /// Loaded from a configuration file, which registers its own migrations
    FileBased { path: PathBuf },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigurationFile {
    name: Option<String>,
    migrations_namespace: Option<String>,
    table_name: Option<String>,
    migrations_directory: Option<PathBuf>,
    #[serde(default)]
    organize_migrations: Value,
}

/// Settings the migration engine runs from
#[derive(Debug, Default)]
pub struct MigrationConfiguration {
    source: ConfigurationSource,
    migrations_directory: Option<PathBuf>,
    migrations_namespace: Option<String>,
    name: Option<String>,
    migrations_table_name: Option<String>,
    organized_by_year: bool,
    organized_by_year_and_month: bool,
    catalog: MigrationCatalog,
    registry: MigrationRegistry,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl MigrationConfiguration {
    /// Empty directory-based configuration with no compiled-in migrations
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory-based configuration pairing discovered files with `catalog`
    pub fn with_catalog(catalog: MigrationCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Load a file-based configuration from a TOML file
    ///
    /// `migrations_directory` is resolved relative to the file. When it names
    /// an existing directory its migrations are registered immediately.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::InvalidConfigurationFile` if the file cannot
    /// be read or parsed, and discovery errors from registration.
    pub fn from_file(
        path: impl AsRef<Path>,
        catalog: MigrationCatalog,
    ) -> Result<Self, MigrationError> {
        let path = path.as_ref();
        let invalid = |error: String| MigrationError::InvalidConfigurationFile {
            path: path.to_path_buf(),
            error,
        };

        let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let file: ConfigurationFile = toml::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        let mut configuration = Self {
            source: ConfigurationSource::FileBased {
                path: path.to_path_buf(),
            },
            catalog,
            name: file.name,
            migrations_namespace: file.migrations_namespace,
            migrations_table_name: file.table_name,
            ..Self::default()
        };

        match Organization::from_parameter(&file.organize_migrations) {
            Some(Organization::Flat) => {}
            Some(Organization::ByYear) => configuration.set_migrations_are_organized_by_year(true),
            Some(Organization::ByYearAndMonth) => {
                configuration.set_migrations_are_organized_by_year_and_month(true)
            }
            None => {
                return Err(invalid(format!(
                    "invalid organize_migrations value {}",
                    file.organize_migrations
                )))
            }
        }

        if let Some(dir) = file.migrations_directory {
            let dir = match path.parent() {
                Some(base) if dir.is_relative() => base.join(dir),
                _ => dir,
            };
            if dir.is_dir() {
                configuration.register_migrations_from_directory(&dir)?;
            }
            configuration.set_migrations_directory(dir);
        }

        log::debug!("Loaded migrations configuration from {}", path.display());
        Ok(configuration)
    }

    pub fn source(&self) -> &ConfigurationSource {
        &self.source
    }

    pub fn is_file_based(&self) -> bool {
        matches!(self.source, ConfigurationSource::FileBased { .. })
    }

    pub fn migrations_directory(&self) -> Option<&Path> {
        self.migrations_directory
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    pub fn set_migrations_directory(&mut self, dir: impl Into<PathBuf>) {
        self.migrations_directory = Some(dir.into());
    }

    pub fn migrations_namespace(&self) -> Option<&str> {
        non_empty(&self.migrations_namespace)
    }

    pub fn set_migrations_namespace(&mut self, namespace: impl Into<String>) {
        self.migrations_namespace = Some(namespace.into());
    }

    /// Display name
    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn migrations_table_name(&self) -> Option<&str> {
        non_empty(&self.migrations_table_name)
    }

    pub fn set_migrations_table_name(&mut self, table_name: impl Into<String>) {
        self.migrations_table_name = Some(table_name.into());
    }

    pub fn migrations_are_organized_by_year(&self) -> bool {
        self.organized_by_year
    }

    pub fn set_migrations_are_organized_by_year(&mut self, flag: bool) {
        self.organized_by_year = flag;
    }

    pub fn migrations_are_organized_by_year_and_month(&self) -> bool {
        self.organized_by_year_and_month
    }

    /// Year/month is a refinement of the year layout, so this sets both flags
    pub fn set_migrations_are_organized_by_year_and_month(&mut self, flag: bool) {
        self.organized_by_year = flag;
        self.organized_by_year_and_month = flag;
    }

    pub fn organization(&self) -> Organization {
        if self.organized_by_year_and_month {
            Organization::ByYearAndMonth
        } else if self.organized_by_year {
            Organization::ByYear
        } else {
            Organization::Flat
        }
    }

    /// Directory a new migration with `version` belongs in
    ///
    /// # Errors
    ///
    /// Fails if no migrations directory is set or `version` is not a
    /// `YYYYMMDDHHMMSS` timestamp.
    pub fn directory_for_version(&self, version: i64) -> Result<PathBuf, MigrationError> {
        let dir = self.migrations_directory().ok_or_else(|| {
            MigrationError::DirectoryNotFound("migrations directory is not configured".to_string())
        })?;

        let timestamp = NaiveDateTime::parse_from_str(&version.to_string(), "%Y%m%d%H%M%S")
            .map_err(|_| MigrationError::InvalidVersion(version.to_string()))?;

        Ok(match self.organization() {
            Organization::Flat => dir.to_path_buf(),
            Organization::ByYear => dir.join(format!("{:04}", timestamp.year())),
            Organization::ByYearAndMonth => dir
                .join(format!("{:04}", timestamp.year()))
                .join(format!("{:02}", timestamp.month())),
        })
    }

    pub fn catalog(&self) -> &MigrationCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Registered migrations, ordered by version
    pub fn migrations(&self) -> impl Iterator<Item = &MigrationVersion> {
        self.registry.iter()
    }

    pub fn migrations_mut(&mut self) -> impl Iterator<Item = &mut MigrationVersion> {
        self.registry.iter_mut()
    }

    /// Scan `dir` and register every migration found there
    pub fn register_migrations_from_directory(
        &mut self,
        dir: &Path,
    ) -> Result<usize, MigrationError> {
        self.registry.register_from_directory(dir, &self.catalog)
    }
}
