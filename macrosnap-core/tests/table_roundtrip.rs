//! Property tests for the artifact codecs and the merge step.
//!
//! Uses proptest to verify:
//! 1. decode(encode(table)) == table for CSV and JSON
//! 2. Appending a snapshot to N rows yields N + 1 rows with the new row last
//!    and every prior row unchanged

use chrono::NaiveDate;
use macrosnap_core::quotes::{QuoteValue, Quotes};
use macrosnap_core::snapshot::Snapshot;
use macrosnap_core::table::{HistoricalTable, TableFormat, TableRow};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_value() -> impl Strategy<Value = QuoteValue> {
    prop_oneof![
        1 => Just(QuoteValue::Unavailable),
        4 => (-1.0e6..1.0e6_f64).prop_map(QuoteValue::Price),
    ]
}

fn arb_columns() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[A-Za-z][A-Za-z0-9 &,.=^\"]{0,12}", 1..6)
        .prop_map(|set| set.into_iter().collect())
}

fn arb_timestamp() -> impl Strategy<Value = String> {
    (0u32..28, 0u32..24, 0u32..60, 0u32..60).prop_map(|(d, h, m, s)| {
        NaiveDate::from_ymd_opt(2024, 1, d + 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
}

fn arb_table() -> impl Strategy<Value = HistoricalTable> {
    arb_columns().prop_flat_map(|columns| {
        let width = columns.len();
        let row = (arb_timestamp(), prop::collection::vec(arb_value(), width))
            .prop_map(|(timestamp, values)| TableRow { timestamp, values });
        prop::collection::vec(row, 0..8).prop_map(move |rows| {
            HistoricalTable::from_parts(columns.clone(), rows).unwrap()
        })
    })
}

// ── 1. Codec round-trip ──────────────────────────────────────────────

proptest! {
    #[test]
    fn csv_round_trip(table in arb_table()) {
        let bytes = TableFormat::Csv.encode(&table).unwrap();
        let decoded = TableFormat::Csv.decode(&bytes).unwrap();
        prop_assert_eq!(decoded, table);
    }

    #[test]
    fn json_round_trip(table in arb_table()) {
        let bytes = TableFormat::Json.encode(&table).unwrap();
        let decoded = TableFormat::Json.decode(&bytes).unwrap();
        prop_assert_eq!(decoded, table);
    }
}

// ── 2. Merge appends exactly one row ─────────────────────────────────

proptest! {
    #[test]
    fn merge_adds_one_row_last(
        table in arb_table(),
        gold in arb_value(),
        ts in arb_timestamp(),
    ) {
        let quotes: Quotes = [("Gold", gold)].into_iter().collect();
        let now = chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S").unwrap();
        let snapshot = Snapshot::build(quotes, now);

        let merged = HistoricalTable::merge(Some(table.clone()), &snapshot);

        prop_assert_eq!(merged.len(), table.len() + 1);
        let last = merged.last_row().unwrap();
        prop_assert_eq!(&last.timestamp, &ts);
        prop_assert_eq!(merged.value(merged.len() - 1, "Gold"), Some(gold));

        // Prior cells keep their values; a newly added column reads Unavailable.
        for (i, row) in table.rows().iter().enumerate() {
            prop_assert_eq!(&merged.rows()[i].timestamp, &row.timestamp);
            for (c, column) in table.columns().iter().enumerate() {
                prop_assert_eq!(merged.value(i, column), Some(row.values[c]));
            }
            if table.column_index("Gold").is_none() {
                prop_assert_eq!(merged.value(i, "Gold"), Some(QuoteValue::Unavailable));
            }
        }
    }
}
