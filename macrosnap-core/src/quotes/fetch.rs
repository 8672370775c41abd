//! Fetch loop: prices every registry entry with per-symbol fault isolation.

use super::provider::{FetchProgress, QuoteProvider, QuoteValue, Quotes};
use crate::registry::{Registry, RegistryEntry};
use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How the registry is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// One symbol at a time, in registry order.
    #[default]
    Sequential,
    /// Symbols fetched on the rayon pool; output order is still registry order.
    Parallel,
}

/// Price every entry of the registry, one attempt each.
///
/// A failed symbol becomes `QuoteValue::Unavailable` and never affects the
/// others. The result always has exactly one value per registry entry.
pub fn fetch_all(
    provider: &dyn QuoteProvider,
    registry: &Registry,
    mode: FetchMode,
    progress: &dyn FetchProgress,
) -> Quotes {
    let total = registry.len();

    let fetch_one = |(index, entry): (usize, &RegistryEntry)| -> (String, QuoteValue) {
        progress.on_start(&entry.name, &entry.symbol, index, total);
        let result = provider.latest_close(&entry.symbol);
        progress.on_complete(&entry.name, index, total, &result);

        if let Err(e) = &result {
            warn!(
                "{}: failed to fetch {} ({}): {e}",
                provider.name(),
                entry.name,
                entry.symbol
            );
        }
        (entry.name.clone(), QuoteValue::from(result))
    };

    match mode {
        FetchMode::Sequential => registry.iter().enumerate().map(fetch_one).collect(),
        FetchMode::Parallel => registry
            .entries()
            .par_iter()
            .enumerate()
            .map(fetch_one)
            .collect::<Vec<_>>()
            .into_iter()
            .collect(),
    }
}
