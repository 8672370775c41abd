//! Artifact encodings for the historical table.
//!
//! - **CSV** (default): header `timestamp,<column>...`, one line per row,
//!   `Unavailable` as an empty cell, prices in shortest round-trip form.
//! - **JSON**: `{"columns": [...], "rows": [{"timestamp": ..., "values": [...]}]}`
//!   with `null` for `Unavailable`.
//!
//! Both satisfy `decode(encode(t)) == t` for finite prices.

use super::{HistoricalTable, TableRow};
use crate::quotes::QuoteValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header cell of the index column in CSV artifacts.
pub const INDEX_HEADER: &str = "timestamp";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact has no header row")]
    MissingHeader,

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("row {row}: '{value}' in column '{column}' is not a number")]
    BadPrice {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Tabular encoding of the remote artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    Json,
}

impl TableFormat {
    /// Pick the format from an object key or file name; anything but `.json` is CSV.
    pub fn from_path(path: &str) -> Self {
        if path.to_ascii_lowercase().ends_with(".json") {
            TableFormat::Json
        } else {
            TableFormat::Csv
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            TableFormat::Csv => "text/csv",
            TableFormat::Json => "application/json",
        }
    }

    pub fn encode(&self, table: &HistoricalTable) -> Result<Vec<u8>, CodecError> {
        match self {
            TableFormat::Csv => encode_csv(table),
            TableFormat::Json => encode_json(table),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<HistoricalTable, CodecError> {
        match self {
            TableFormat::Csv => decode_csv(bytes),
            TableFormat::Json => decode_json(bytes),
        }
    }
}

// ─── CSV ────────────────────────────────────────────────────────────

fn format_cell(value: QuoteValue) -> String {
    match value {
        QuoteValue::Price(p) => p.to_string(),
        QuoteValue::Unavailable => String::new(),
    }
}

fn parse_cell(row: usize, column: &str, field: &str) -> Result<QuoteValue, CodecError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(QuoteValue::Unavailable);
    }
    field
        .parse::<f64>()
        .map(QuoteValue::Price)
        .map_err(|_| CodecError::BadPrice {
            row,
            column: column.to_string(),
            value: field.to_string(),
        })
}

pub fn encode_csv(table: &HistoricalTable) -> Result<Vec<u8>, CodecError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push(INDEX_HEADER);
    header.extend(table.columns().iter().map(String::as_str));
    wtr.write_record(&header)?;

    for row in table.rows() {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.timestamp.clone());
        record.extend(row.values.iter().map(|v| format_cell(*v)));
        wtr.write_record(&record)?;
    }

    wtr.into_inner().map_err(|e| CodecError::Io(e.into_error()))
}

pub fn decode_csv(bytes: &[u8]) -> Result<HistoricalTable, CodecError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(CodecError::MissingHeader);
    }
    let columns: Vec<String> = headers.iter().skip(1).map(String::from).collect();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let timestamp = record.get(0).unwrap_or_default().to_string();
        let values = columns
            .iter()
            .zip(record.iter().skip(1))
            .map(|(column, field)| parse_cell(i, column, field))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(TableRow { timestamp, values });
    }

    HistoricalTable::from_parts(columns, rows)
}

// ─── JSON ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TableDocumentRef<'a> {
    columns: &'a [String],
    rows: &'a [TableRow],
}

#[derive(Deserialize)]
struct TableDocument {
    columns: Vec<String>,
    rows: Vec<TableRow>,
}

pub fn encode_json(table: &HistoricalTable) -> Result<Vec<u8>, CodecError> {
    let doc = TableDocumentRef {
        columns: table.columns(),
        rows: table.rows(),
    };
    Ok(serde_json::to_vec_pretty(&doc)?)
}

pub fn decode_json(bytes: &[u8]) -> Result<HistoricalTable, CodecError> {
    let doc: TableDocument = serde_json::from_slice(bytes)?;
    HistoricalTable::from_parts(doc.columns, doc.rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quotes::Quotes;
    use crate::snapshot::Snapshot;
    use chrono::NaiveDate;

    fn sample() -> HistoricalTable {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let first: Quotes = [("Gold", QuoteValue::Price(2400.5)), ("S&P 500", QuoteValue::Unavailable)]
            .into_iter()
            .collect();
        let second: Quotes = [("Gold", QuoteValue::Unavailable), ("VIX, spot", QuoteValue::Price(13.25))]
            .into_iter()
            .collect();
        let mut table =
            HistoricalTable::from_snapshot(&Snapshot::build(first, day.and_hms_opt(9, 0, 0).unwrap()));
        table.append(&Snapshot::build(second, day.and_hms_opt(10, 0, 0).unwrap()));
        table
    }

    #[test]
    fn csv_layout() {
        let csv = String::from_utf8(encode_csv(&sample()).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], r#"timestamp,Gold,S&P 500,"VIX, spot""#);
        assert_eq!(lines[1], "2024-01-01 09:00:00,2400.5,,");
        assert_eq!(lines[2], "2024-01-01 10:00:00,,,13.25");
    }

    #[test]
    fn csv_round_trip() {
        let table = sample();
        let decoded = decode_csv(&encode_csv(&table).unwrap()).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn json_round_trip() {
        let table = sample();
        let bytes = encode_json(&table).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("null"));
        assert_eq!(decode_json(&bytes).unwrap(), table);
    }

    #[test]
    fn empty_table_round_trips_with_header_only() {
        let empty = HistoricalTable::new();
        let bytes = encode_csv(&empty).unwrap();
        assert_eq!(String::from_utf8(bytes.clone()).unwrap(), "timestamp\n");
        assert_eq!(decode_csv(&bytes).unwrap(), empty);
    }

    #[test]
    fn empty_artifact_is_missing_header() {
        assert!(matches!(decode_csv(b""), Err(CodecError::MissingHeader)));
    }

    #[test]
    fn non_numeric_cell_is_rejected() {
        let err = decode_csv(b"timestamp,Gold\n2024-01-01 09:00:00,abc\n").unwrap_err();
        assert!(matches!(err, CodecError::BadPrice { row: 0, ref column, .. } if column == "Gold"));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = decode_csv(b"timestamp,Gold,VIX\n2024-01-01 09:00:00,1\n").unwrap_err();
        assert!(matches!(err, CodecError::Csv(_)));
    }

    #[test]
    fn format_from_path() {
        assert_eq!(TableFormat::from_path("macroresult.csv"), TableFormat::Csv);
        assert_eq!(TableFormat::from_path("history/MACRO.JSON"), TableFormat::Json);
        assert_eq!(TableFormat::from_path("macroresult.xlsx"), TableFormat::Csv);
    }
}
