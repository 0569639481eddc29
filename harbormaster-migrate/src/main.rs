//! Harbormaster Migration CLI Tool
//!
//! Resolves the migration configuration for a connection from application
//! parameters and inspects or extends the migrations directory.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use harbormaster::migration::MigrationCatalog;
use harbormaster::{configure_migrations, MigrationConfiguration, Parameters, ServiceContext};
use harbormaster_migrate::commands;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "harbormaster-migrate")]
#[command(about = "Migration configuration tool for Harbormaster")]
#[command(version = "0.1.0")]
struct Cli {
    /// Parameter file (defaults to config/parameters.toml plus environment)
    #[arg(long)]
    parameters: Option<PathBuf>,

    /// Connection whose migration settings to use
    #[arg(long)]
    connection: Option<String>,

    /// File-based migrations configuration (TOML)
    #[arg(long)]
    configuration: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration and registered migrations
    Status,

    /// Generate a new migration file
    Generate {
        /// Migration name (e.g., "create_users_table")
        name: String,
    },

    /// Show detailed configuration or migration information
    Info {
        /// Show information for a specific migration version
        #[arg(long)]
        version: Option<i64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => {
            if !cli.quiet {
                println!("✅ Success");
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let parameters = match &cli.parameters {
        Some(path) => Parameters::load_from(path)?,
        None => Parameters::load()?,
    };
    let context = Arc::new(ServiceContext::new(parameters));

    // The standalone binary has no compiled-in migrations; files are registered as discovered
    let mut configuration = match &cli.configuration {
        Some(path) => MigrationConfiguration::from_file(path, MigrationCatalog::new())?,
        None => MigrationConfiguration::new(),
    };
    configure_migrations(&context, &mut configuration, cli.connection.as_deref())?;

    match &cli.command {
        Commands::Status => commands::status(&configuration),
        Commands::Generate { name } => {
            let path = commands::generate(&configuration, name, Utc::now())?;
            println!("✅ Generated migration: {}", path.display());
            println!("   Add it to your migration catalog to compile it in");
            Ok(())
        }
        Commands::Info { version } => commands::info(&configuration, *version),
    }
}
