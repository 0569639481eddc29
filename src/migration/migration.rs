//! Migration trait definition

use crate::context::ServiceContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Trait that all migrations must implement
///
/// Applying and rolling back migrations belongs to the migration engine;
/// this crate only needs enough of a migration to register it and to hand it
/// the shared [`ServiceContext`] when it asks for one.
pub trait Migration: Send + Sync {
    /// Get the migration name (human-readable identifier)
    fn name(&self) -> &str;

    /// Get the migration version (timestamp: YYYYMMDDHHMMSS)
    fn version(&self) -> i64;

    /// Free-form description shown by tooling
    fn description(&self) -> &str {
        ""
    }

    /// Capability query for migrations that want the shared context.
    ///
    /// Migrations implementing [`AcceptsSharedContext`] override this to
    /// return `Some(self)`.
    fn as_context_aware(&mut self) -> Option<&mut dyn AcceptsSharedContext> {
        None
    }
}

/// Implemented by migrations that need access to application services
pub trait AcceptsSharedContext {
    /// Receive the application's shared context.
    ///
    /// The context outlives configuration; implementors keep the `Arc`.
    fn set_context(&mut self, context: Arc<ServiceContext>);
}

/// A migration known only from its file on disk
///
/// Used when a discovered version has no compiled-in counterpart in the
/// [`MigrationCatalog`](crate::migration::MigrationCatalog).
#[derive(Debug, Clone)]
pub struct DiscoveredMigration {
    version: i64,
    name: String,
    path: PathBuf,
}

impl DiscoveredMigration {
    pub fn new(version: i64, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            version,
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Migration for DiscoveredMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> i64 {
        self.version
    }
}
