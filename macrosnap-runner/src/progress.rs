//! Console progress for a capture run.

use macrosnap_core::quotes::{FetchProgress, QuoteError};
use macrosnap_core::store::UploadReceipt;
use macrosnap_core::table::HistoricalTable;

use crate::pipeline::RunSummary;

/// Progress callbacks for the whole run: the fetch loop plus the storage steps.
pub trait RunProgress: FetchProgress {
    /// Called once before any symbol is fetched.
    fn on_run_start(&self, total: usize);

    /// Called after the download step. `prior_rows` is `None` when there was no
    /// readable history.
    fn on_history(&self, location: &str, prior_rows: Option<usize>);

    /// Called after the merged table has been written.
    fn on_uploaded(&self, receipt: &UploadReceipt);

    /// Called instead of `on_uploaded` when the upload is skipped.
    fn on_dry_run(&self, location: &str, table: &HistoricalTable);

    /// Called when the run is complete.
    fn on_finish(&self, summary: &RunSummary);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, name: &str, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {name} ({symbol})...", index + 1, total);
    }

    fn on_complete(
        &self,
        name: &str,
        _index: usize,
        _total: usize,
        result: &Result<f64, QuoteError>,
    ) {
        match result {
            Ok(price) => println!("  OK: {name} = {price}"),
            Err(e) => println!("  FAIL: {name}: {e}"),
        }
    }
}

impl RunProgress for StdoutProgress {
    fn on_run_start(&self, total: usize) {
        println!("Fetching {total} quotes...");
    }

    fn on_history(&self, location: &str, prior_rows: Option<usize>) {
        match prior_rows {
            Some(n) => println!("Loaded {n} prior rows from {location}"),
            None => println!("No readable history at {location}; starting a new table"),
        }
    }

    fn on_uploaded(&self, receipt: &UploadReceipt) {
        println!(
            "Wrote {} rows ({} bytes, blake3 {}) to {}",
            receipt.rows,
            receipt.bytes,
            &receipt.digest[..receipt.digest.len().min(12)],
            receipt.location
        );
    }

    fn on_dry_run(&self, location: &str, table: &HistoricalTable) {
        println!(
            "Dry run: {} rows x {} columns NOT written to {location}",
            table.len(),
            table.columns().len()
        );
    }

    fn on_finish(&self, summary: &RunSummary) {
        println!(
            "\nCapture {} complete: {}/{} quotes, {} unavailable",
            summary.timestamp,
            summary.fetched,
            summary.fetched + summary.unavailable,
            summary.unavailable
        );
        if summary.receipt.is_some() {
            println!("Table updated and saved to {}", summary.location);
        }
    }
}
