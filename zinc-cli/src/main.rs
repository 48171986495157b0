use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::Level;

use zinc_cli::commands;
use zinc_cli::config::ConfigManager;
use zinc_cli::error::CliError;

#[derive(Parser)]
#[command(
    name = "zinc",
    about = "Content-addressed, deduplicated asset catalog",
    version,
    author
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Path to the TOML configuration file (default: platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Lock acquisition timeout in seconds (default: wait indefinitely)
    #[arg(long, global = true)]
    lock_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a new bundle version from a source directory
    Publish {
        /// Catalog reference: a bookmark alias, bare path, or file:// URL
        catalog: String,
        /// Catalog id (e.g. com.example.test)
        #[arg(long)]
        catalog_id: String,
        /// Bundle name
        bundle: String,
        /// Source directory to scan
        src: PathBuf,
        /// Skip the dedup-against-latest check and always publish a new version
        #[arg(long)]
        force: bool,
        /// Skip building the master tar archive
        #[arg(long)]
        skip_master_archive: bool,
    },
    /// Verify catalog consistency
    Verify {
        catalog: String,
        #[arg(long)]
        catalog_id: String,
        /// Also detect orphaned objects (slower, walks the whole object store)
        #[arg(long)]
        full: bool,
    },
    /// List bundle names
    Bundles {
        catalog: String,
        #[arg(long)]
        catalog_id: String,
    },
    /// Manage named distributions
    #[command(subcommand)]
    Distro(DistroCommands),
    /// Manage the CLI configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum DistroCommands {
    /// Show the version a distribution currently points at
    Show {
        catalog: String,
        #[arg(long)]
        catalog_id: String,
        bundle: String,
        distro: String,
    },
    /// Point a distribution at a bundle version
    Set {
        catalog: String,
        #[arg(long)]
        catalog_id: String,
        bundle: String,
        distro: String,
        version: u32,
    },
    /// Remove a distribution (its `prev:` record is kept)
    Delete {
        catalog: String,
        #[arg(long)]
        catalog_id: String,
        bundle: String,
        distro: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the current configuration
    Show,
    /// Add or replace a bookmark alias
    Bookmark { alias: String, url: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(Level::from(cli.log_level)).with_target(false).init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32, CliError> {
    let mut manager = ConfigManager::load_or_create(cli.config)?;
    let lock_timeout = cli.lock_timeout_secs.map(Duration::from_secs);

    match cli.command {
        Commands::Publish { catalog, catalog_id, bundle, src, force, skip_master_archive } => {
            commands::publish(manager.config(), &catalog, &catalog_id, &bundle, src, force, skip_master_archive, lock_timeout)
                .await
        }
        Commands::Verify { catalog, catalog_id, full } => {
            commands::verify(manager.config(), &catalog, &catalog_id, full).await
        }
        Commands::Bundles { catalog, catalog_id } => commands::bundles(manager.config(), &catalog, &catalog_id).await,
        Commands::Distro(DistroCommands::Show { catalog, catalog_id, bundle, distro }) => {
            commands::distro_show(manager.config(), &catalog, &catalog_id, &bundle, &distro).await
        }
        Commands::Distro(DistroCommands::Set { catalog, catalog_id, bundle, distro, version }) => {
            commands::distro_set(manager.config(), &catalog, &catalog_id, &bundle, &distro, version).await
        }
        Commands::Distro(DistroCommands::Delete { catalog, catalog_id, bundle, distro }) => {
            commands::distro_delete(manager.config(), &catalog, &catalog_id, &bundle, &distro).await
        }
        Commands::Config(ConfigCommands::Show) => commands::config_show(manager.config()),
        Commands::Config(ConfigCommands::Bookmark { alias, url }) => {
            let code = commands::config_bookmark(manager.config_mut(), &alias, &url)?;
            manager.save()?;
            Ok(code)
        }
    }
}
