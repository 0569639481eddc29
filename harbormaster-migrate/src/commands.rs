//! Subcommand handlers
//!
//! Every handler receives a configuration that has already been resolved
//! by `configure_migrations`.

use crate::template::{is_valid_name, render_migration};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use harbormaster::configuration::ConfigurationSource;
use harbormaster::migration::MigrationFile;
use harbormaster::MigrationConfiguration;
use std::fs;
use std::path::PathBuf;

fn or_unset(value: Option<&str>) -> String {
    value.map_or_else(|| "(unset)".dimmed().to_string(), str::to_string)
}

/// Print the resolved configuration and the registered migrations
pub fn status(configuration: &MigrationConfiguration) -> Result<()> {
    println!("\n📊 Migration Configuration\n");
    print_settings(configuration);

    println!();
    if configuration.registry().is_empty() {
        println!("📁 Registered Migrations: None");
    } else {
        println!(
            "📁 Registered Migrations ({}):",
            configuration.registry().len()
        );
        for version in configuration.migrations() {
            let file = version.file();
            println!(
                "  {} m{}_{} ({})",
                "•".green(),
                file.version,
                version.migration().name(),
                file.path.display()
            );
        }
    }

    Ok(())
}

fn print_settings(configuration: &MigrationConfiguration) {
    let source = match configuration.source() {
        ConfigurationSource::DirectoryBased => "parameters".to_string(),
        ConfigurationSource::FileBased { path } => path.display().to_string(),
    };
    println!("Source: {}", source);
    println!("Name: {}", or_unset(configuration.name()));
    println!(
        "Directory: {}",
        configuration
            .migrations_directory()
            .map_or_else(|| "(unset)".dimmed().to_string(), |d| d.display().to_string())
    );
    println!("Namespace: {}", or_unset(configuration.migrations_namespace()));
    println!("Table: {}", or_unset(configuration.migrations_table_name()));
    println!("Organization: {:?}", configuration.organization());
}

/// Print details of the whole configuration or of one registered version
pub fn info(configuration: &MigrationConfiguration, version: Option<i64>) -> Result<()> {
    match version {
        Some(version) => {
            let Some(registered) = configuration.registry().get(version) else {
                bail!("Migration version {} is not registered", version);
            };
            let file = registered.file();
            println!("\n📋 Migration Information\n");
            println!("Version: {}", file.version);
            println!("Name: {}", registered.migration().name());
            let description = registered.migration().description();
            if !description.is_empty() {
                println!("Description: {}", description);
            }
            println!("Checksum: {}", file.checksum);
            println!("Path: {}", file.path.display());
        }
        None => {
            println!("\n📋 Migration System Information\n");
            print_settings(configuration);
            println!("Total Migrations: {}", configuration.registry().len());
            if let Some(latest) = configuration.registry().all_versions().last() {
                println!("Latest Version: {}", latest);
            }
        }
    }
    Ok(())
}

/// Write a new migration file for `name` into the organized directory
///
/// Returns the path of the created file.
pub fn generate(
    configuration: &MigrationConfiguration,
    name: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    if !is_valid_name(name) {
        bail!(
            "Invalid migration name '{}': use letters, digits and underscores, starting with a letter",
            name
        );
    }

    let timestamp = now.format("%Y%m%d%H%M%S").to_string();
    let version: i64 = timestamp
        .parse()
        .with_context(|| format!("Invalid timestamp {}", timestamp))?;

    let dir = configuration.directory_for_version(version)?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create migrations directory {}", dir.display()))?;

    let path = dir.join(MigrationFile::filename_for(version, name));
    if path.exists() {
        bail!("Migration file {} already exists", path.display());
    }
    fs::write(&path, render_migration(name, version, now))
        .with_context(|| format!("Failed to write migration file {}", path.display()))?;

    log::info!("Generated migration {}", path.display());
    Ok(path)
}
