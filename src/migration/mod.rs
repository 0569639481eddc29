//! Migration model for Harbormaster
//!
//! This module provides what the configuration layer needs to know about
//! migrations, without executing them:
//! - Migration trait definition and the shared-context capability
//! - Migration file discovery and checksums
//! - Compiled-in catalog and per-configuration registry
//!
//! # Example
//!
//! ```rust,no_run
//! use harbormaster::migration::{AcceptsSharedContext, Migration, MigrationCatalog};
//! use harbormaster::ServiceContext;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! pub struct SeedCurrencies {
//!     context: Option<Arc<ServiceContext>>,
//! }
//!
//! impl Migration for SeedCurrencies {
//!     fn name(&self) -> &str {
//!         "seed_currencies"
//!     }
//!
//!     fn version(&self) -> i64 {
//!         20240120120000
//!     }
//!
//!     fn as_context_aware(&mut self) -> Option<&mut dyn AcceptsSharedContext> {
//!         Some(self)
//!     }
//! }
//!
//! impl AcceptsSharedContext for SeedCurrencies {
//!     fn set_context(&mut self, context: Arc<ServiceContext>) {
//!         self.context = Some(context);
//!     }
//! }
//!
//! let catalog = MigrationCatalog::new()
//!     .with(20240120120000, || Box::new(SeedCurrencies::default()));
//! ```

pub mod checksum;
pub mod error;
pub mod file;
#[allow(clippy::module_inception)]
pub mod migration;
pub mod registry;

pub use checksum::calculate_checksum;
pub use error::MigrationError;
pub use file::{discover_migrations, MigrationFile};
pub use migration::{AcceptsSharedContext, DiscoveredMigration, Migration};
pub use registry::{MigrationCatalog, MigrationRegistry, MigrationVersion};
