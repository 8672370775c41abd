//! macrosnap CLI: capture, inspect and list the tracked macro quotes.
//!
//! Commands:
//! - `run`: fetch every ticker, append one row to the stored table, upload
//! - `show`: print the most recent rows of the stored table
//! - `tickers`: list the tracked instruments by asset group

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use macrosnap_core::quotes::QuoteValue;
use macrosnap_core::registry::AssetGroup;
use macrosnap_core::store::Credentials;
use macrosnap_core::table::HistoricalTable;
use macrosnap_runner::{run_from_config, Overrides, SnapshotConfig, StdoutProgress};

#[derive(Parser)]
#[command(
    name = "macrosnap",
    about = "macrosnap: periodic macro quote snapshots kept in object storage"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all quotes, append a row to the stored table and upload it.
    Run {
        #[command(flatten)]
        storage: StorageArgs,

        /// Fetch symbols concurrently.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Fetch and merge but do not upload.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the run summary as JSON after the progress output.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the most recent rows of the stored table.
    Show {
        #[command(flatten)]
        storage: StorageArgs,

        /// Number of rows to print.
        #[arg(long, default_value_t = 5)]
        tail: usize,
    },
    /// List the tracked instruments.
    Tickers {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Storage selection shared by `run` and `show`.
#[derive(Args)]
struct StorageArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// S3 bucket name.
    #[arg(long)]
    bucket: Option<String>,

    /// Object key of the table artifact.
    #[arg(long)]
    key: Option<String>,

    /// AWS region.
    #[arg(long)]
    region: Option<String>,

    /// S3-compatible endpoint URL (path-style addressing).
    #[arg(long)]
    endpoint: Option<String>,

    /// Keep the table in a local file instead of S3.
    #[arg(long)]
    local: Option<PathBuf>,
}

impl StorageArgs {
    fn load(&self, parallel: bool) -> Result<SnapshotConfig> {
        let mut config = SnapshotConfig::load(self.config.as_deref())?;
        config.apply_overrides(&Overrides {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            local_path: self.local.clone(),
            parallel,
        })?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            storage,
            parallel,
            dry_run,
            json,
        } => run_capture(&storage, parallel, dry_run, json),
        Commands::Show { storage, tail } => run_show(&storage, tail),
        Commands::Tickers { config } => run_tickers(config),
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn run_capture(storage: &StorageArgs, parallel: bool, dry_run: bool, json: bool) -> Result<()> {
    let config = storage.load(parallel)?;
    let summary = run_from_config(&config, dry_run, &StdoutProgress)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn run_show(storage: &StorageArgs, tail: usize) -> Result<()> {
    let config = storage.load(false)?;
    let store = config.build_store(Credentials::from_env())?;
    info!("reading {}", store.location());

    let table = store
        .try_download()
        .with_context(|| format!("failed to read table from {}", store.location()))?;
    print_table(&table, tail);
    Ok(())
}

fn run_tickers(config_path: Option<PathBuf>) -> Result<()> {
    let config = SnapshotConfig::load(config_path.as_deref())?;
    let registry = config.registry()?;

    println!("{} tickers", registry.len());
    for group in AssetGroup::ALL {
        let entries: Vec<_> = registry.group(group).collect();
        if entries.is_empty() {
            continue;
        }
        println!();
        println!("{}:", group.label());
        for entry in entries {
            println!("  {:<22} {}", entry.name, entry.symbol);
        }
    }
    Ok(())
}

fn print_table(table: &HistoricalTable, tail: usize) {
    println!(
        "{} rows x {} columns",
        table.len(),
        table.columns().len()
    );

    let width = table
        .columns()
        .iter()
        .map(|c| c.len())
        .max()
        .unwrap_or(0);

    for row in table.tail(tail) {
        println!();
        println!("=== {} ===", row.timestamp);
        for (name, value) in table.columns().iter().zip(&row.values) {
            println!("  {name:<width$}  {}", format_value(*value));
        }
    }
}

fn format_value(value: QuoteValue) -> String {
    match value {
        QuoteValue::Price(p) => format!("{p}"),
        QuoteValue::Unavailable => "-".to_string(),
    }
}
