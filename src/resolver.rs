//! Resolves application parameters into a [`MigrationConfiguration`]
//!
//! [`configure_migrations`] picks the parameter set for a connection, makes
//! sure the migrations directory exists, fills in whatever the configuration
//! does not already carry and finally hands the shared [`ServiceContext`] to
//! every migration that asks for it.
//!
//! # Example
//!
//! ```rust,no_run
//! use harbormaster::{configure_migrations, MigrationConfiguration, Parameters, ServiceContext};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let parameters = Parameters::new()
//!     .with("app.root_dir", json!("/srv/app"))
//!     .with("migrations.default_connection", json!({
//!         "dir_name": "/srv/app/migrations",
//!         "namespace": "app::migrations",
//!         "organize_migrations": "year",
//!     }));
//! let context = Arc::new(ServiceContext::new(parameters));
//!
//! let mut configuration = MigrationConfiguration::new();
//! configure_migrations(&context, &mut configuration, None)?;
//! # Ok::<(), harbormaster::ConfigureError>(())
//! ```

use crate::configuration::{MigrationConfiguration, Organization};
use crate::context::ServiceContext;
use crate::error::{ConfigureError, Result};
use crate::migration::MigrationVersion;
use crate::parameters::{scalar_to_string, ParameterStore};
use serde::Deserialize;
use serde_json::Value;
use std::fs::DirBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parameter set used regardless of the requested connection when present
pub const DEFAULT_PARAMETER_KEY: &str = "migrations.default_connection";

/// Prefix of per-connection parameter sets (`migrations.<connection>`)
pub const PARAMETER_PREFIX: &str = "migrations.";

/// Path parameters substituted into `dir_name` as `%<key>%`
pub const PATH_PLACEHOLDERS: [&str; 3] = ["app.root_dir", "app.cache_dir", "app.logs_dir"];

/// Migration settings for one connection
///
/// Missing fields take the defaults below. Fields present but empty are
/// rejected by [`resolve_parameter_set`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub dir_name: String,
    pub namespace: String,
    pub name: String,
    pub table_name: String,
    /// Raw value; interpreted by [`Organization::from_parameter`]
    pub organize_migrations: Value,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            dir_name: "%app.root_dir%/migrations".to_string(),
            namespace: "app::migrations".to_string(),
            name: "Application Migrations".to_string(),
            table_name: "migration_versions".to_string(),
            organize_migrations: Value::Bool(false),
        }
    }
}

/// Pick and decode the parameter set for `connection`
///
/// The default set wins whenever it exists; otherwise the set named after
/// the connection is used.
///
/// # Errors
///
/// `ConfigurationNotFound` when neither set exists, `InvalidParameters` when
/// the set is not a table of the expected shape or one of its text fields
/// is empty.
pub fn resolve_parameter_set<P>(parameters: &P, connection: Option<&str>) -> Result<(String, ParameterSet)>
where
    P: ParameterStore + ?Sized,
{
    let key = if parameters.has_parameter(DEFAULT_PARAMETER_KEY) {
        DEFAULT_PARAMETER_KEY.to_string()
    } else {
        match connection {
            Some(connection) if parameters.has_parameter(&format!("{PARAMETER_PREFIX}{connection}")) => {
                format!("{PARAMETER_PREFIX}{connection}")
            }
            _ => {
                return Err(ConfigureError::ConfigurationNotFound {
                    connection: connection.map(str::to_string),
                })
            }
        }
    };

    let value = parameters
        .parameter(&key)
        .cloned()
        .unwrap_or(Value::Null);
    let set = serde_json::from_value::<ParameterSet>(value).map_err(|e| {
        ConfigureError::InvalidParameters {
            key: key.clone(),
            message: e.to_string(),
        }
    })?;

    for (field, value) in [
        ("dir_name", &set.dir_name),
        ("namespace", &set.namespace),
        ("name", &set.name),
        ("table_name", &set.table_name),
    ] {
        if value.is_empty() {
            return Err(ConfigureError::InvalidParameters {
                key,
                message: format!("`{field}` must not be empty"),
            });
        }
    }

    log::debug!("Using migrations parameters from {}", key);
    Ok((key, set))
}

/// Replace `%app.root_dir%`-style placeholders in `dir`
///
/// Only the known path placeholders are substituted, and only when the
/// store defines them as scalars. Anything else is left untouched.
pub fn substitute_placeholders<P>(parameters: &P, dir: &str) -> String
where
    P: ParameterStore + ?Sized,
{
    let mut resolved = dir.to_string();
    for placeholder in PATH_PLACEHOLDERS {
        let token = format!("%{placeholder}%");
        if !resolved.contains(&token) {
            continue;
        }
        if let Some(value) = parameters.parameter(placeholder).and_then(scalar_to_string) {
            resolved = resolved.replace(&token, &value);
        }
    }
    resolved
}

/// Create `dir` (and parents) unless it already exists
///
/// A concurrent creator winning the race is not an error: creation failures
/// only count when the directory is still missing afterwards.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }

    creation_outcome(dir, builder.create(dir))
}

fn creation_outcome(dir: &Path, created: std::io::Result<()>) -> Result<()> {
    match created {
        Ok(()) => {
            log::info!("Created migrations directory {}", dir.display());
            Ok(())
        }
        Err(e) if dir.is_dir() => {
            log::debug!("{} appeared while creating it: {}", dir.display(), e);
            Ok(())
        }
        Err(e) => Err(ConfigureError::DirectoryCreation {
            path: dir.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

/// Configure `configuration` from the parameters in `context`
///
/// Explicit settings already on the configuration are kept; only unset
/// namespace, name and table name are filled. The migrations directory is
/// always (re)resolved and created, so calling this repeatedly is safe.
///
/// # Errors
///
/// - `ConfigurationNotFound` if no parameter set matches `connection`
/// - `DirectoryCreation` if the directory is missing and cannot be created
/// - `InvalidOrganizationValue` for an unknown `organize_migrations` value;
///   nothing past the directory is changed in that case
/// - `Migration` if the directory scan fails
pub fn configure_migrations(
    context: &Arc<ServiceContext>,
    configuration: &mut MigrationConfiguration,
    connection: Option<&str>,
) -> Result<()> {
    let (key, set) = resolve_parameter_set(context.as_ref(), connection)?;

    // Placeholders are only expanded when the configuration already names a directory
    let dir = if configuration.migrations_directory().is_some() {
        PathBuf::from(substitute_placeholders(context.as_ref(), &set.dir_name))
    } else {
        PathBuf::from(&set.dir_name)
    };
    ensure_directory(&dir)?;
    configuration.set_migrations_directory(dir.clone());

    let organization = Organization::from_parameter(&set.organize_migrations).ok_or_else(|| {
        ConfigureError::InvalidOrganizationValue {
            key: format!("{key}.organize_migrations"),
            value: set.organize_migrations.to_string(),
        }
    })?;

    if configuration.migrations_namespace().is_none() {
        configuration.set_migrations_namespace(&set.namespace);
    }
    if configuration.name().is_none() {
        configuration.set_name(&set.name);
    }
    // A file-based configuration owns its table name unless the file left it empty
    if configuration.migrations_table_name().is_none() {
        configuration.set_migrations_table_name(&set.table_name);
    }
    if !configuration.is_file_based() {
        configuration.register_migrations_from_directory(&dir)?;
    }

    match organization {
        Organization::ByYear => configuration.set_migrations_are_organized_by_year(true),
        Organization::ByYearAndMonth => {
            configuration.set_migrations_are_organized_by_year_and_month(true)
        }
        Organization::Flat => {}
    }

    inject_context_into_migrations(context, configuration.migrations_mut());
    Ok(())
}

/// Give `context` to every migration that accepts it
///
/// Migrations without the capability are skipped.
pub fn inject_context_into_migrations<'a, I>(context: &Arc<ServiceContext>, versions: I)
where
    I: IntoIterator<Item = &'a mut MigrationVersion>,
{
    for version in versions {
        if let Some(aware) = version.migration_mut().as_context_aware() {
            aware.set_context(Arc::clone(context));
        }
    }
}
