//! Integration tests for configure_migrations
//!
//! Each test builds parameters and a configuration in a temporary
//! directory, resolves, and checks the configuration and the filesystem.

use harbormaster::migration::{AcceptsSharedContext, Migration, MigrationCatalog};
use harbormaster::{
    configure_migrations, inject_context_into_migrations, ConfigureError, MigrationConfiguration,
    Organization, Parameters, ServiceContext,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Migration that wants the shared context
#[derive(Default)]
struct SeedCurrencies {
    context: Option<Arc<ServiceContext>>,
}

impl Migration for SeedCurrencies {
    fn name(&self) -> &str {
        "seed_currencies"
    }

    fn version(&self) -> i64 {
        20_240_120_120_000
    }

    fn as_context_aware(&mut self) -> Option<&mut dyn AcceptsSharedContext> {
        Some(self)
    }
}

impl AcceptsSharedContext for SeedCurrencies {
    fn set_context(&mut self, context: Arc<ServiceContext>) {
        self.context = Some(context);
    }
}

/// Plain migration without the capability
struct AddIndex;

impl Migration for AddIndex {
    fn name(&self) -> &str {
        "add_index"
    }

    fn version(&self) -> i64 {
        20_240_121_120_000
    }
}

fn context_with(set_key: &str, set: Value) -> Arc<ServiceContext> {
    Arc::new(ServiceContext::new(Parameters::new().with(set_key, set)))
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn test_fresh_configuration_uses_dir_name_and_creates_it() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("db").join("migrations");
    let context = context_with(
        "migrations.default_connection",
        json!({
            "dir_name": path_str(&dir),
            "namespace": "billing::migrations",
            "name": "Billing",
            "table_name": "billing_versions",
        }),
    );

    let mut configuration = MigrationConfiguration::new();
    configure_migrations(&context, &mut configuration, None).unwrap();

    assert!(dir.is_dir());
    assert_eq!(configuration.migrations_directory(), Some(dir.as_path()));
    assert_eq!(configuration.migrations_namespace(), Some("billing::migrations"));
    assert_eq!(configuration.name(), Some("Billing"));
    assert_eq!(configuration.migrations_table_name(), Some("billing_versions"));
    assert_eq!(configuration.organization(), Organization::Flat);
}

#[test]
fn test_fresh_configuration_does_not_expand_placeholders() {
    let tmp = TempDir::new().unwrap();
    let raw = format!("{}/%app.root_dir%", path_str(tmp.path()));
    let parameters = Parameters::new()
        .with("app.root_dir", json!("expanded"))
        .with("migrations.default_connection", json!({ "dir_name": raw }));
    let context = Arc::new(ServiceContext::new(parameters));

    let mut configuration = MigrationConfiguration::new();
    configure_migrations(&context, &mut configuration, None).unwrap();

    assert_eq!(
        configuration.migrations_directory(),
        Some(tmp.path().join("%app.root_dir%").as_path())
    );
}

#[test]
fn test_preset_directory_expands_known_placeholders() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("app");
    let parameters = Parameters::new()
        .with("app.root_dir", json!(path_str(&root)))
        .with(
            "migrations.default_connection",
            json!({ "dir_name": "%app.root_dir%/migrations/%app.root_dir%/%app.vendor_dir%" }),
        );
    let context = Arc::new(ServiceContext::new(parameters));

    let mut configuration = MigrationConfiguration::new();
    configuration.set_migrations_directory("%app.root_dir%/migrations");
    configure_migrations(&context, &mut configuration, None).unwrap();

    let expected = format!(
        "{}/migrations/{}/%app.vendor_dir%",
        path_str(&root),
        path_str(&root)
    );
    assert_eq!(
        configuration.migrations_directory(),
        Some(Path::new(&expected))
    );
    assert!(Path::new(&expected).is_dir());
}

#[test]
fn test_organize_by_year() {
    let tmp = TempDir::new().unwrap();
    let context = context_with(
        "migrations.default_connection",
        json!({ "dir_name": path_str(tmp.path()), "organize_migrations": "year" }),
    );

    let mut configuration = MigrationConfiguration::new();
    configure_migrations(&context, &mut configuration, None).unwrap();

    assert!(configuration.migrations_are_organized_by_year());
    assert!(!configuration.migrations_are_organized_by_year_and_month());
}

#[test]
fn test_organize_by_year_and_month() {
    let tmp = TempDir::new().unwrap();
    let context = context_with(
        "migrations.default_connection",
        json!({ "dir_name": path_str(tmp.path()), "organize_migrations": "year_and_month" }),
    );

    let mut configuration = MigrationConfiguration::new();
    configure_migrations(&context, &mut configuration, None).unwrap();

    assert!(configuration.migrations_are_organized_by_year_and_month());
    assert_eq!(configuration.organization(), Organization::ByYearAndMonth);
}

#[test]
fn test_invalid_organization_stops_after_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("migrations");
    let context = context_with(
        "migrations.default_connection",
        json!({
            "dir_name": path_str(&dir),
            "namespace": "app::migrations",
            "organize_migrations": "invalid-value",
        }),
    );

    let mut configuration = MigrationConfiguration::new();
    let err = configure_migrations(&context, &mut configuration, None).unwrap_err();

    assert!(matches!(err, ConfigureError::InvalidOrganizationValue { .. }));
    assert!(err.to_string().contains("organize_migrations"));
    assert_eq!(configuration.migrations_directory(), Some(dir.as_path()));
    assert_eq!(configuration.migrations_namespace(), None);
    assert_eq!(configuration.name(), None);
    assert_eq!(configuration.migrations_table_name(), None);
    assert_eq!(configuration.organization(), Organization::Flat);
}

#[test]
fn test_missing_connection_configuration() {
    let context = context_with("migrations.billing", json!({ "dir_name": "/unused" }));

    let mut configuration = MigrationConfiguration::new();
    let err = configure_migrations(&context, &mut configuration, Some("reporting")).unwrap_err();

    assert!(matches!(err, ConfigureError::ConfigurationNotFound { .. }));
    assert!(err.to_string().contains("reporting"));
    assert_eq!(configuration.migrations_directory(), None);
}

#[test]
fn test_named_connection_configuration() {
    let tmp = TempDir::new().unwrap();
    let context = context_with(
        "migrations.reporting",
        json!({ "dir_name": path_str(tmp.path()), "name": "Reporting" }),
    );

    let mut configuration = MigrationConfiguration::new();
    configure_migrations(&context, &mut configuration, Some("reporting")).unwrap();
    assert_eq!(configuration.name(), Some("Reporting"));
}

#[test]
fn test_directory_creation_failure_surfaces_os_error() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();
    let context = context_with(
        "migrations.default_connection",
        json!({ "dir_name": path_str(&blocker.join("migrations")) }),
    );

    let mut configuration = MigrationConfiguration::new();
    match configure_migrations(&context, &mut configuration, None) {
        Err(ConfigureError::DirectoryCreation { message, .. }) => assert!(!message.is_empty()),
        other => panic!("Expected DirectoryCreation, got {:?}", other),
    }
    assert_eq!(configuration.migrations_directory(), None);
}

#[test]
fn test_second_resolve_keeps_explicit_values() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("migrations");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("m20240120120000_seed_currencies.rs"), "// seed").unwrap();

    let context = context_with(
        "migrations.default_connection",
        json!({
            "dir_name": path_str(&dir),
            "namespace": "from_params",
            "name": "From Params",
            "table_name": "from_params",
        }),
    );

    let mut configuration = MigrationConfiguration::new();
    configuration.set_migrations_namespace("explicit");
    configuration.set_name("Explicit");
    configuration.set_migrations_table_name("explicit_versions");

    configure_migrations(&context, &mut configuration, None).unwrap();
    fs::remove_dir_all(&dir).unwrap();
    configure_migrations(&context, &mut configuration, None).unwrap();

    assert!(dir.is_dir());
    assert_eq!(configuration.migrations_namespace(), Some("explicit"));
    assert_eq!(configuration.name(), Some("Explicit"));
    assert_eq!(configuration.migrations_table_name(), Some("explicit_versions"));
    assert_eq!(configuration.registry().len(), 1);
}

#[test]
fn test_directory_based_configuration_registers_and_injects() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("migrations");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("m20240120120000_seed_currencies.rs"), "// seed").unwrap();
    fs::write(dir.join("m20240121120000_add_index.rs"), "// index").unwrap();
    fs::write(dir.join("m20240122120000_not_compiled.rs"), "// disk only").unwrap();

    let catalog = MigrationCatalog::new()
        .with(20_240_120_120_000, || Box::new(SeedCurrencies::default()))
        .with(20_240_121_120_000, || Box::new(AddIndex));
    let context = context_with(
        "migrations.default_connection",
        json!({ "dir_name": path_str(&dir) }),
    );

    let mut configuration = MigrationConfiguration::with_catalog(catalog);
    configure_migrations(&context, &mut configuration, None).unwrap();

    let names: Vec<&str> = configuration
        .migrations()
        .map(|version| version.migration().name())
        .collect();
    assert_eq!(names, vec!["seed_currencies", "add_index", "not_compiled"]);

    // Only the context-aware migration holds a reference
    let aware = configuration
        .migrations_mut()
        .filter_map(|version| version.migration_mut().as_context_aware().map(|_| ()))
        .count();
    assert_eq!(aware, 1);
    assert_eq!(Arc::strong_count(&context), 2);
}

#[test]
fn test_inject_skips_migrations_without_capability() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("m20240120120000_seed_currencies.rs"), "// seed").unwrap();
    fs::write(tmp.path().join("m20240121120000_add_index.rs"), "// index").unwrap();

    let catalog = MigrationCatalog::new()
        .with(20_240_120_120_000, || Box::new(SeedCurrencies::default()))
        .with(20_240_121_120_000, || Box::new(AddIndex));
    let mut configuration = MigrationConfiguration::with_catalog(catalog);
    configuration
        .register_migrations_from_directory(tmp.path())
        .unwrap();

    let context = Arc::new(ServiceContext::default());
    inject_context_into_migrations(&context, configuration.migrations_mut());
    inject_context_into_migrations(&context, configuration.migrations_mut());

    // Re-injection replaces the held reference instead of adding one
    assert_eq!(Arc::strong_count(&context), 2);
}

#[test]
fn test_file_based_configuration_keeps_table_name_and_skips_scan() {
    let tmp = TempDir::new().unwrap();
    let file_dir = tmp.path().join("from_file");
    fs::create_dir_all(&file_dir).unwrap();
    fs::write(file_dir.join("m20240120120000_from_file.rs"), "// file").unwrap();

    let param_dir = tmp.path().join("from_params");
    fs::create_dir_all(&param_dir).unwrap();
    fs::write(param_dir.join("m20240301120000_from_params.rs"), "// params").unwrap();

    let config_path = tmp.path().join("migrations.toml");
    fs::write(
        &config_path,
        "table_name = \"file_versions\"\nmigrations_directory = \"from_file\"\n",
    )
    .unwrap();

    let context = context_with(
        "migrations.default_connection",
        json!({ "dir_name": path_str(&param_dir), "table_name": "param_versions" }),
    );

    let mut configuration =
        MigrationConfiguration::from_file(&config_path, MigrationCatalog::new()).unwrap();
    configure_migrations(&context, &mut configuration, None).unwrap();

    assert_eq!(configuration.migrations_table_name(), Some("file_versions"));
    assert_eq!(configuration.migrations_directory(), Some(param_dir.as_path()));
    assert_eq!(
        configuration.registry().all_versions(),
        vec![20_240_120_120_000]
    );
}

#[test]
fn test_file_based_configuration_without_table_name_is_filled() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("migrations.toml");
    fs::write(&config_path, "name = \"From File\"\n").unwrap();

    let context = context_with(
        "migrations.default_connection",
        json!({ "dir_name": path_str(&tmp.path().join("m")), "table_name": "param_versions" }),
    );

    let mut configuration =
        MigrationConfiguration::from_file(&config_path, MigrationCatalog::new()).unwrap();
    configure_migrations(&context, &mut configuration, None).unwrap();

    assert_eq!(configuration.name(), Some("From File"));
    assert_eq!(configuration.migrations_table_name(), Some("param_versions"));
}
