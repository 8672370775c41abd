//! Historical table: every snapshot ever captured, one row each.
//!
//! Columns are the ordered union of display names seen so far (first
//! appearance wins the position). A row written before a column existed reads
//! as `Unavailable` in that column. Rows are append-only and never deduplicated.

pub mod codec;

pub use codec::{CodecError, TableFormat};

use crate::quotes::QuoteValue;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One row: the snapshot timestamp plus values aligned to the table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub timestamp: String,
    pub values: Vec<QuoteValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalTable {
    columns: Vec<String>,
    rows: Vec<TableRow>,
}

impl HistoricalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-row table holding just `snapshot`.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut table = Self::new();
        table.append(snapshot);
        table
    }

    /// Assemble a table from decoded parts, checking column uniqueness and row width.
    pub fn from_parts(columns: Vec<String>, rows: Vec<TableRow>) -> Result<Self, CodecError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(CodecError::DuplicateColumn(column.clone()));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.values.len() != columns.len() {
                return Err(CodecError::RowWidth {
                    row: i,
                    expected: columns.len(),
                    found: row.values.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Append `snapshot` as the last row, widening the table for unseen names.
    pub fn append(&mut self, snapshot: &Snapshot) {
        for name in snapshot.quotes().names() {
            if !self.columns.iter().any(|c| c == name) {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.values.push(QuoteValue::Unavailable);
                }
            }
        }

        let values = self
            .columns
            .iter()
            .map(|c| snapshot.get(c).unwrap_or(QuoteValue::Unavailable))
            .collect();
        self.rows.push(TableRow {
            timestamp: snapshot.timestamp().to_string(),
            values,
        });
    }

    /// Prior history plus the new row; with no history the row is the whole table.
    pub fn merge(prior: Option<Self>, snapshot: &Snapshot) -> Self {
        match prior {
            Some(mut table) => {
                table.append(snapshot);
                table
            }
            None => Self::from_snapshot(snapshot),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last_row(&self) -> Option<&TableRow> {
        self.rows.last()
    }

    /// The last `n` rows (all rows if there are fewer).
    pub fn tail(&self, n: usize) -> &[TableRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at (`row`, `column`), `None` if either is out of range.
    pub fn value(&self, row: usize, column: &str) -> Option<QuoteValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r.values[col])
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.timestamp.as_str())
    }
}
