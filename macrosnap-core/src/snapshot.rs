//! Snapshot: one timestamped row of quote values.

use crate::quotes::{QuoteValue, Quotes};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Row label format: local wall clock, second precision, no zone marker.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One observation of every tracked quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    timestamp: String,
    quotes: Quotes,
}

impl Snapshot {
    /// Label `quotes` with `now`. Pure: same inputs, same snapshot.
    pub fn build(quotes: Quotes, now: NaiveDateTime) -> Self {
        Self {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            quotes,
        }
    }

    /// Label `quotes` with the current local time.
    pub fn capture(quotes: Quotes) -> Self {
        Self::build(quotes, chrono::Local::now().naive_local())
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn quotes(&self) -> &Quotes {
        &self.quotes
    }

    pub fn get(&self, name: &str) -> Option<QuoteValue> {
        self.quotes.get(name)
    }
}
