//! Migration catalog and per-configuration registry
//!
//! The [`MigrationCatalog`] lists the migrations compiled into an
//! application. The [`MigrationRegistry`] holds the versions a
//! configuration has registered, usually by scanning its directory.

use crate::migration::file::discover_migrations;
use crate::migration::{DiscoveredMigration, Migration, MigrationError, MigrationFile};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

type MigrationFactory = Box<dyn Fn() -> Box<dyn Migration> + Send + Sync>;

/// Compiled-in migrations, indexed by version
///
/// A build script or the application itself fills the catalog; scanning a
/// directory then pairs each discovered file with its compiled migration.
#[derive(Default)]
pub struct MigrationCatalog {
    factories: BTreeMap<i64, MigrationFactory>,
}

impl MigrationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a migration factory for `version`, replacing any previous one
    pub fn add<F>(&mut self, version: i64, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Migration> + Send + Sync + 'static,
    {
        self.factories.insert(version, Box::new(factory));
        self
    }

    /// Builder-style variant of [`add`](Self::add)
    #[must_use]
    pub fn with<F>(mut self, version: i64, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Migration> + Send + Sync + 'static,
    {
        self.add(version, factory);
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build a fresh instance of the migration registered for `version`
    pub fn instantiate(&self, version: i64) -> Option<Box<dyn Migration>> {
        self.factories.get(&version).map(|factory| factory())
    }
}

impl fmt::Debug for MigrationCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationCatalog")
            .field("versions", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A registered migration: the file it came from plus its instance
pub struct MigrationVersion {
    file: MigrationFile,
    migration: Box<dyn Migration>,
}

impl MigrationVersion {
    pub fn new(file: MigrationFile, migration: Box<dyn Migration>) -> Self {
        Self { file, migration }
    }

    pub fn version(&self) -> i64 {
        self.file.version
    }

    pub fn file(&self) -> &MigrationFile {
        &self.file
    }

    /// The underlying migration object
    pub fn migration(&self) -> &dyn Migration {
        self.migration.as_ref()
    }

    pub fn migration_mut(&mut self) -> &mut dyn Migration {
        self.migration.as_mut()
    }
}

impl fmt::Debug for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationVersion")
            .field("version", &self.file.version)
            .field("name", &self.migration.name())
            .field("path", &self.file.path)
            .finish()
    }
}

/// Versions registered on one configuration, ordered by version
#[derive(Debug, Default)]
pub struct MigrationRegistry {
    versions: BTreeMap<i64, MigrationVersion>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one discovered file
    ///
    /// Registering the same version from the same path again is a no-op and
    /// returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::AlreadyRegistered` if another path already
    /// claimed this version.
    pub fn register(
        &mut self,
        file: MigrationFile,
        catalog: &MigrationCatalog,
    ) -> Result<bool, MigrationError> {
        if let Some(existing) = self.versions.get(&file.version) {
            if existing.file.path == file.path {
                return Ok(false);
            }
            return Err(MigrationError::AlreadyRegistered {
                version: file.version,
                name: file.name,
                existing: existing.file.path.clone(),
            });
        }

        let migration = catalog.instantiate(file.version).unwrap_or_else(|| {
            Box::new(DiscoveredMigration::new(
                file.version,
                file.name.clone(),
                file.path.clone(),
            ))
        });

        self.versions
            .insert(file.version, MigrationVersion::new(file, migration));
        Ok(true)
    }

    /// Discover and register every migration file under `dir`
    ///
    /// Returns the number of newly registered versions.
    pub fn register_from_directory(
        &mut self,
        dir: &Path,
        catalog: &MigrationCatalog,
    ) -> Result<usize, MigrationError> {
        let mut added = 0;
        for file in discover_migrations(dir)? {
            if self.register(file, catalog)? {
                added += 1;
            }
        }
        log::debug!(
            "Registered {} new migration(s) from {}",
            added,
            dir.display()
        );
        Ok(added)
    }

    pub fn get(&self, version: i64) -> Option<&MigrationVersion> {
        self.versions.get(&version)
    }

    /// All registered versions, sorted ascending
    pub fn all_versions(&self) -> Vec<i64> {
        self.versions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MigrationVersion> {
        self.versions.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MigrationVersion> {
        self.versions.values_mut()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
