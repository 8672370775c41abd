//! Quote fetching: provider trait, Yahoo Finance provider, fetch loop.

pub mod fetch;
pub mod provider;
pub mod yahoo;

pub use fetch::{fetch_all, FetchMode};
pub use provider::{
    FetchProgress, QuoteError, QuoteProvider, QuoteValue, Quotes, SilentProgress, StaticProvider,
};
pub use yahoo::YahooProvider;
