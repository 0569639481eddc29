//! Parameter loading
//!
//! Applications load their [`Parameters`] from `config/parameters.toml`
//! and `HARBORMASTER_*` environment variables using [`Parameters::load()`].

use crate::parameters::Parameters;
use config::{Config, ConfigError, Environment, File};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Default parameter file, relative to the working directory
pub const DEFAULT_PARAMETERS_FILE: &str = "config/parameters.toml";

/// Environment variable prefix; `HARBORMASTER_APP__ROOT_DIR` sets `app.root_dir`
///
/// Values that read as booleans or numbers are typed, so
/// `HARBORMASTER_MIGRATIONS__DEFAULT_CONNECTION__ORGANIZE_MIGRATIONS=false`
/// is the boolean `false`.
pub const ENV_PREFIX: &str = "HARBORMASTER";

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn into_parameters(settings: Config) -> Result<Parameters, ConfigError> {
    let tree: HashMap<String, Value> = settings.try_deserialize().map_err(|e| {
        ConfigError::Message(format!("Parameters could not be deserialized: {}", e))
    })?;
    Ok(Parameters::from_tree(tree))
}

impl Parameters {
    /// Load parameters from `config/parameters.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(DEFAULT_PARAMETERS_FILE).required(false))
            .add_source(environment());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // File existed but was unreadable: retry with env only
                if Path::new(DEFAULT_PARAMETERS_FILE).exists() {
                    log::warn!(
                        "Failed to load {}, falling back to env. Error: {}",
                        DEFAULT_PARAMETERS_FILE,
                        err
                    );
                }
                Config::builder()
                    .add_source(environment())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load parameters from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        into_parameters(settings)
    }

    /// Load parameters from an explicit file (required), then env vars.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(environment())
            .build()?;

        log::debug!("Loaded parameters from {}", path.display());
        into_parameters(settings)
    }
}
