//! macrosnap runner: configuration and run orchestration.
//!
//! This crate builds on `macrosnap-core` to provide:
//! - TOML configuration with CLI overrides and validation
//! - Construction of the provider and table store from configuration
//! - The capture pipeline (fetch, merge with history, upload)
//! - Console progress reporting

pub mod config;
pub mod pipeline;
pub mod progress;

pub use config::{Backend, ConfigError, FetchConfig, Overrides, SnapshotConfig, StorageConfig};
pub use pipeline::{
    run_from_config, run_snapshot, run_snapshot_with_table, RunError, RunOptions, RunSummary,
};
pub use progress::{RunProgress, StdoutProgress};
