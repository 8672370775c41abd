//! Capture pipeline: fetch, merge with history, upload.
//!
//! Two entry points:
//! - `run_snapshot()`: takes already-built collaborators. Used by tests and by
//!   anything that wants its own provider or store.
//! - `run_from_config()`: builds registry, Yahoo provider and store from a
//!   `SnapshotConfig`, then runs. Used by the CLI.

use chrono::NaiveDateTime;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use macrosnap_core::quotes::{fetch_all, FetchMode, QuoteProvider};
use macrosnap_core::registry::Registry;
use macrosnap_core::snapshot::Snapshot;
use macrosnap_core::store::{Credentials, StoreError, TableStore, UploadReceipt};
use macrosnap_core::table::HistoricalTable;

use crate::config::{ConfigError, SnapshotConfig};
use crate::progress::RunProgress;

/// Errors that end a run. Per-symbol and download failures never get here.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("upload failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub fetch_mode: FetchMode,
    /// Fetch and merge, but leave the stored artifact untouched.
    pub dry_run: bool,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub fetched: usize,
    pub unavailable: usize,
    /// Rows read back from storage; `None` when there was no readable history.
    pub prior_rows: Option<usize>,
    pub total_rows: usize,
    pub location: String,
    /// `None` for dry runs.
    pub receipt: Option<UploadReceipt>,
}

/// Run one capture with the given collaborators.
///
/// Sequence: fetch every symbol, label the snapshot with `clock()` read once
/// the fetch loop has finished, download the prior table (absent on any
/// failure), append, upload. Only the upload step can fail the run.
pub fn run_snapshot<P, C>(
    registry: &Registry,
    provider: &dyn QuoteProvider,
    store: &TableStore,
    clock: C,
    options: &RunOptions,
    progress: &P,
) -> Result<RunSummary, RunError>
where
    P: RunProgress,
    C: FnOnce() -> NaiveDateTime,
{
    run_snapshot_with_table(registry, provider, store, clock, options, progress)
        .map(|(summary, _)| summary)
}

/// Same as `run_snapshot`, also returning the merged table.
pub fn run_snapshot_with_table<P, C>(
    registry: &Registry,
    provider: &dyn QuoteProvider,
    store: &TableStore,
    clock: C,
    options: &RunOptions,
    progress: &P,
) -> Result<(RunSummary, HistoricalTable), RunError>
where
    P: RunProgress,
    C: FnOnce() -> NaiveDateTime,
{
    let location = store.location();
    info!(
        "capturing {} symbols via {} into {location}",
        registry.len(),
        provider.name()
    );

    progress.on_run_start(registry.len());
    let quotes = fetch_all(provider, registry, options.fetch_mode, progress);
    let snapshot = Snapshot::build(quotes, clock());

    let prior = store.download();
    let prior_rows = prior.as_ref().map(HistoricalTable::len);
    progress.on_history(&location, prior_rows);

    let merged = HistoricalTable::merge(prior, &snapshot);

    let receipt = if options.dry_run {
        progress.on_dry_run(&location, &merged);
        None
    } else {
        let receipt = store.upload(&merged)?;
        progress.on_uploaded(&receipt);
        Some(receipt)
    };

    let summary = RunSummary {
        timestamp: snapshot.timestamp().to_string(),
        fetched: snapshot.quotes().available_count(),
        unavailable: snapshot.quotes().unavailable_count(),
        prior_rows,
        total_rows: merged.len(),
        location,
        receipt,
    };
    progress.on_finish(&summary);
    Ok((summary, merged))
}

/// Build everything from `config` and run one capture labelled with the local
/// time at which the fetch loop finished.
///
/// Credentials are read from the environment once, here.
pub fn run_from_config<P: RunProgress>(
    config: &SnapshotConfig,
    dry_run: bool,
    progress: &P,
) -> Result<RunSummary, RunError> {
    let registry = config.registry()?;
    let provider = config.build_provider()?;
    let store = config.build_store(Credentials::from_env())?;
    let options = RunOptions {
        fetch_mode: config.fetch_mode(),
        dry_run,
    };
    run_snapshot(
        &registry,
        &provider,
        &store,
        || chrono::Local::now().naive_local(),
        &options,
        progress,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use macrosnap_core::quotes::{FetchProgress, QuoteError, StaticProvider};
    use macrosnap_core::store::MemoryStore;
    use macrosnap_core::table::TableFormat;

    struct Quiet;

    impl FetchProgress for Quiet {
        fn on_start(&self, _: &str, _: &str, _: usize, _: usize) {}
        fn on_complete(&self, _: &str, _: usize, _: usize, _: &Result<f64, QuoteError>) {}
    }

    impl RunProgress for Quiet {
        fn on_run_start(&self, _: usize) {}
        fn on_history(&self, _: &str, _: Option<usize>) {}
        fn on_uploaded(&self, _: &UploadReceipt) {}
        fn on_dry_run(&self, _: &str, _: &HistoricalTable) {}
        fn on_finish(&self, _: &RunSummary) {}
    }

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn dry_run_leaves_store_untouched() {
        let mem = MemoryStore::new();
        let store = TableStore::new(Box::new(mem.clone()), TableFormat::Csv);
        let provider = StaticProvider::new().with_price("GC=F", 2400.5);
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };

        let (summary, table) = run_snapshot_with_table(
            &Registry::default_macro(),
            &provider,
            &store,
            now,
            &options,
            &Quiet,
        )
        .unwrap();

        assert_eq!(mem.writes(), 0);
        assert!(mem.object().is_none());
        assert!(summary.receipt.is_none());
        assert_eq!(summary.total_rows, 1);
        assert_eq!(table.columns().len(), 20);
    }

    #[test]
    fn summary_counts() {
        let mem = MemoryStore::new();
        let store = TableStore::new(Box::new(mem.clone()), TableFormat::Csv);
        let provider = StaticProvider::new()
            .with_price("GC=F", 2400.5)
            .with_price("^VIX", 13.0);

        let summary = run_snapshot(
            &Registry::default_macro(),
            &provider,
            &store,
            now,
            &RunOptions::default(),
            &Quiet,
        )
        .unwrap();

        assert_eq!(summary.timestamp, "2024-01-01 09:00:00");
        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.unavailable, 18);
        assert_eq!(summary.prior_rows, None);
        assert_eq!(summary.location, "memory://table");
        assert_eq!(mem.writes(), 1);
    }

    #[test]
    fn dry_run_summary_serializes_without_receipt() {
        let table_store = TableStore::new(Box::new(MemoryStore::new()), TableFormat::Json);
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };
        let summary = run_snapshot(
            &Registry::default_macro(),
            &StaticProvider::new(),
            &table_store,
            now,
            &options,
            &Quiet,
        )
        .unwrap();

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["timestamp"], "2024-01-01 09:00:00");
        assert_eq!(json["unavailable"], 20);
        assert!(json["receipt"].is_null());
        assert!(json["prior_rows"].is_null());
    }
}
