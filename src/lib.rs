//! # Harbormaster
//!
//! Wires application parameters into a migration configuration: picks the
//! parameter set for a connection, creates the migrations directory, fills
//! the configuration and shares the application context with migrations
//! that ask for it. Running migrations is left to the migration engine.

pub mod config;
pub mod configuration;
pub mod context;
pub mod error;
pub mod migration;
pub mod parameters;
pub mod resolver;

pub use configuration::{ConfigurationSource, MigrationConfiguration, Organization};
pub use context::ServiceContext;
pub use error::ConfigureError;
pub use parameters::{ParameterStore, Parameters};
pub use resolver::{configure_migrations, inject_context_into_migrations, ParameterSet};
