//! Quote provider trait, per-symbol results and structured error types.
//!
//! The QuoteProvider trait abstracts over market-data vendors so the fetch loop
//! can be driven by Yahoo Finance in production and by a static table in tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Why a single symbol could not be priced.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no closing price returned for {symbol}")]
    NoData { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),
}

/// A captured price, or an explicit marker that the fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum QuoteValue {
    Price(f64),
    Unavailable,
}

impl QuoteValue {
    pub fn price(&self) -> Option<f64> {
        match self {
            QuoteValue::Price(p) => Some(*p),
            QuoteValue::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, QuoteValue::Price(_))
    }
}

impl From<Option<f64>> for QuoteValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(p) => QuoteValue::Price(p),
            None => QuoteValue::Unavailable,
        }
    }
}

impl From<QuoteValue> for Option<f64> {
    fn from(value: QuoteValue) -> Self {
        value.price()
    }
}

impl<E> From<Result<f64, E>> for QuoteValue {
    fn from(result: Result<f64, E>) -> Self {
        result.ok().into()
    }
}

/// Quote values keyed by display name, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quotes {
    values: Vec<(String, QuoteValue)>,
}

impl Quotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value. A repeated name replaces the earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: QuoteValue) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<QuoteValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, QuoteValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn available_count(&self) -> usize {
        self.values.iter().filter(|(_, v)| v.is_available()).count()
    }

    pub fn unavailable_count(&self) -> usize {
        self.len() - self.available_count()
    }
}

impl<S: Into<String>> FromIterator<(S, QuoteValue)> for Quotes {
    fn from_iter<I: IntoIterator<Item = (S, QuoteValue)>>(iter: I) -> Self {
        let mut quotes = Quotes::new();
        for (name, value) in iter {
            quotes.insert(name, value);
        }
        quotes
    }
}

/// Trait for market-data vendors.
///
/// One call prices one symbol. Implementations make a single attempt; the
/// fetch loop decides what a failure means for the run.
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Most recent daily closing price for a vendor symbol.
    fn latest_close(&self, symbol: &str) -> Result<f64, QuoteError>;
}

/// In-memory provider answering from a fixed symbol → outcome table.
///
/// Unknown symbols fail with `SymbolNotFound`.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    outcomes: HashMap<String, Result<f64, QuoteError>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.outcomes.insert(symbol.to_string(), Ok(price));
        self
    }

    pub fn with_error(mut self, symbol: &str, error: QuoteError) -> Self {
        self.outcomes.insert(symbol.to_string(), Err(error));
        self
    }
}

impl QuoteProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn latest_close(&self, symbol: &str) -> Result<f64, QuoteError> {
        self.outcomes
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| {
                Err(QuoteError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            })
    }
}

/// Progress callback for the per-symbol fetch loop.
///
/// `Sync` because parallel fetches report from worker threads.
pub trait FetchProgress: Sync {
    /// Called before a symbol is requested.
    fn on_start(&self, name: &str, symbol: &str, index: usize, total: usize);

    /// Called once a symbol's outcome is known.
    fn on_complete(&self, name: &str, index: usize, total: usize, result: &Result<f64, QuoteError>);
}

/// Progress sink that discards everything.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _name: &str, _symbol: &str, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _name: &str,
        _index: usize,
        _total: usize,
        _result: &Result<f64, QuoteError>,
    ) {
    }
}
