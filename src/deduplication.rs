// 🔍 Deduplication Engine - one reading per meter
// Keeps, for each meter, the most recent reading that actually has a value.

use crate::config::{DATE_COLUMN, INDEX_COLUMN, METER_COLUMN};
use crate::dates;
use crate::schema::{SchemaCheck, SchemaError, Side};
use crate::table::{compare_keys, Cell, Table};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

// ============================================================================
// COLUMNS
// ============================================================================

/// Column names the engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupColumns {
    /// Meter identifier (default: "N° compteur")
    pub key: String,

    /// Reading date (default: "Date")
    pub date: String,

    /// Reading value (default: "Index")
    pub value: String,
}

impl Default for DedupColumns {
    fn default() -> Self {
        DedupColumns {
            key: METER_COLUMN.to_string(),
            date: DATE_COLUMN.to_string(),
            value: INDEX_COLUMN.to_string(),
        }
    }
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

pub struct DeduplicationEngine {
    pub columns: DedupColumns,
}

impl DeduplicationEngine {
    /// Create engine with default column names
    pub fn new() -> Self {
        DeduplicationEngine {
            columns: DedupColumns::default(),
        }
    }

    pub fn with_columns(columns: DedupColumns) -> Self {
        DeduplicationEngine { columns }
    }

    /// Keep the most recent valid reading of every meter.
    ///
    /// 1. rows whose date does not parse are dropped
    /// 2. rows are stably sorted by key ascending, date descending
    /// 3. rows with an empty or whitespace-only value are dropped
    /// 4. the first remaining row of each key is kept
    ///
    /// A later reading without a value never hides an older one with a value.
    /// The date cell of every kept row is replaced by the parsed date.
    pub fn dedupe(&self, table: &Table) -> Result<Table, SchemaError> {
        let cols = &self.columns;
        let indices = SchemaCheck::new()
            .require(
                table,
                Side::Left,
                &[cols.key.as_str(), cols.date.as_str(), cols.value.as_str()],
            )
            .finish()
            .inspect_err(|e| warn!(error = %e, "deduplication skipped"))?;
        let (key_idx, date_idx, value_idx) = (indices[0], indices[1], indices[2]);

        // Step 1-2: keep rows with a readable date
        let mut dated: Vec<(&Vec<Cell>, String, NaiveDateTime)> = table
            .rows()
            .iter()
            .filter_map(|row| {
                dates::parse_cell(&row[date_idx]).map(|d| (row, row[key_idx].key(), d))
            })
            .collect();
        let bad_dates = table.len() - dated.len();

        // Step 3: sort and group on the same key string; sort_by is stable,
        // equal (key, date) pairs keep input order
        dated.sort_by(|(_, ka, da), (_, kb, db)| compare_keys(ka, kb).then_with(|| db.cmp(da)));

        // Steps 4-5
        let mut seen: HashSet<String> = HashSet::new();
        let mut empty_values = 0;
        let mut rows = Vec::new();
        for (row, key, date) in dated {
            if row[value_idx].is_blank() {
                empty_values += 1;
                continue;
            }
            if !seen.insert(key) {
                continue;
            }
            let mut kept = row.clone();
            kept[date_idx] = Cell::Date(date);
            rows.push(kept);
        }

        debug!(
            rows_in = table.len(),
            bad_dates,
            empty_values,
            rows_out = rows.len(),
            "deduplicated readings"
        );

        Ok(Table::from_parts(table.columns().to_vec(), rows))
    }
}

impl Default for DeduplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the most recent reading with a non-empty value for every meter.
///
/// See [`DeduplicationEngine::dedupe`].
pub fn dedupe_latest_valid(
    table: &Table,
    key_col: &str,
    date_col: &str,
    value_col: &str,
) -> Result<Table, SchemaError> {
    DeduplicationEngine::with_columns(DedupColumns {
        key: key_col.to_string(),
        date: date_col.to_string(),
        value: value_col.to_string(),
    })
    .dedupe(table)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_table(rows: &[(&str, &str, &str)]) -> Table {
        Table::from_rows(
            vec![
                "N° compteur".to_string(),
                "Date".to_string(),
                "Index".to_string(),
                "Réf. abonné".to_string(),
            ],
            rows.iter()
                .enumerate()
                .map(|(i, (key, date, index))| {
                    vec![
                        Cell::from(*key),
                        Cell::from(*date),
                        Cell::from(*index),
                        Cell::text(format!("{:05}", i)),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> Cell {
        Cell::Date(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_most_recent_valid_selected() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[
            ("K1", "10/01/2024", "100"),
            ("K1", "05/02/2024", ""),
            ("K1", "01/12/2023", "50"),
        ]);

        let result = engine.dedupe(&table).unwrap();

        // The February reading has no value, so January wins
        assert_eq!(result.len(), 1);
        assert_eq!(result.cell(0, "Date"), Some(&date(2024, 1, 10)));
        assert_eq!(result.cell(0, "Index"), Some(&Cell::text("100")));
    }

    #[test]
    fn test_older_reading_wins_when_newer_ones_are_empty() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[
            ("K1", "05/02/2024", ""),
            ("K1", "10/01/2024", "   "),
            ("K1", "01/12/2023", "50"),
        ]);

        let result = engine.dedupe(&table).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.cell(0, "Date"), Some(&date(2023, 12, 1)));
        assert_eq!(result.cell(0, "Index"), Some(&Cell::text("50")));
    }

    #[test]
    fn test_invalid_date_dropped() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[
            ("K1", "not-a-date", "999"),
            ("K1", "01/12/2023", "50"),
            ("K2", "not-a-date", "10"),
        ]);

        let result = engine.dedupe(&table).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.cell(0, "Index"), Some(&Cell::text("50")));
    }

    #[test]
    fn test_key_without_valid_reading_absent() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[
            ("K1", "01/12/2023", "50"),
            ("K2", "01/12/2023", ""),
            ("K2", "", "12"),
        ]);

        let result = engine.dedupe(&table).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.cell(0, "N° compteur"), Some(&Cell::text("K1")));
    }

    #[test]
    fn test_key_uniqueness_and_sorted_keys() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[
            ("B", "01/01/2024", "1"),
            ("A", "02/01/2024", "2"),
            ("B", "03/01/2024", "3"),
            ("C", "04/01/2024", "4"),
            ("A", "05/01/2024", "5"),
            ("a", "06/01/2024", "6"),
        ]);

        let result = engine.dedupe(&table).unwrap();

        let keys: Vec<String> = result
            .column("N° compteur")
            .unwrap()
            .iter()
            .map(|c| c.key())
            .collect();
        assert_eq!(keys, vec!["A", "B", "C", "a"]);
        assert_eq!(result.cell(0, "Index"), Some(&Cell::text("5")));
        assert_eq!(result.cell(1, "Index"), Some(&Cell::text("3")));
    }

    #[test]
    fn test_same_date_keeps_first_in_input_order() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[
            ("K1", "10/01/2024", "first"),
            ("K1", "10/01/2024", "second"),
        ]);

        let result = engine.dedupe(&table).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.cell(0, "Index"), Some(&Cell::text("first")));
    }

    #[test]
    fn test_keys_are_whitespace_sensitive() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[
            ("K1", "10/01/2024", "1"),
            ("K1 ", "11/01/2024", "2"),
        ]);

        let result = engine.dedupe(&table).unwrap();

        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_numeric_keys_sort_numerically() {
        let engine = DeduplicationEngine::new();
        let table = Table::from_rows(
            vec!["N° compteur".to_string(), "Date".to_string(), "Index".to_string()],
            vec![
                vec![Cell::Integer(10), Cell::text("10/01/2024"), Cell::Integer(5)],
                vec![Cell::Integer(9), Cell::text("10/01/2024"), Cell::Integer(7)],
                vec![Cell::Integer(10), Cell::text("11/01/2024"), Cell::Integer(0)],
            ],
        )
        .unwrap();

        let result = engine.dedupe(&table).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.cell(0, "N° compteur"), Some(&Cell::Integer(9)));
        assert_eq!(result.cell(1, "Index"), Some(&Cell::Integer(0)));
    }

    #[test]
    fn test_mixed_cell_types_share_one_key() {
        let engine = DeduplicationEngine::new();
        let table = Table::from_rows(
            vec!["N° compteur".to_string(), "Date".to_string(), "Index".to_string()],
            vec![
                vec![Cell::text("7"), Cell::text("10/02/2024"), Cell::text("newer")],
                vec![Cell::Integer(7), Cell::text("10/01/2020"), Cell::text("older")],
                vec![Cell::Integer(7), Cell::text("10/03/2024"), Cell::Empty],
            ],
        )
        .unwrap();

        let result = engine.dedupe(&table).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.cell(0, "N° compteur"), Some(&Cell::text("7")));
        assert_eq!(result.cell(0, "Index"), Some(&Cell::text("newer")));
        assert_eq!(result.cell(0, "Date"), Some(&date(2024, 2, 10)));
    }

    #[test]
    fn test_other_columns_preserved() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[("K1", "10/01/2024", "100")]);

        let result = engine.dedupe(&table).unwrap();

        assert_eq!(result.columns(), table.columns());
        assert_eq!(result.cell(0, "Réf. abonné"), Some(&Cell::text("00000")));
    }

    #[test]
    fn test_idempotent() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[
            ("K2", "10/01/2024", "7"),
            ("K1", "10/01/2024", "100"),
            ("K1", "05/02/2024", ""),
            ("K1", "01/12/2023", "50"),
            ("K3", "garbage", "1"),
            ("K2", "10/01/2025", "8"),
        ]);

        let once = engine.dedupe(&table).unwrap();
        let twice = engine.dedupe(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_not_modified() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[("K1", "10/01/2024", "100")]);
        let before = table.clone();

        engine.dedupe(&table).unwrap();

        assert_eq!(table, before);
    }

    #[test]
    fn test_missing_columns() {
        let table = Table::from_rows(
            vec!["N° compteur".to_string(), "Valeur".to_string()],
            vec![vec![Cell::text("K1"), Cell::text("1")]],
        )
        .unwrap();

        let result = dedupe_latest_valid(&table, "N° compteur", "Date", "Index");

        let err = result.clone().unwrap_err();
        assert_eq!(err.columns(), vec!["Date", "Index"]);
        assert!(result.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_custom_column_names() {
        let table = Table::from_rows(
            vec!["meter".to_string(), "when".to_string(), "reading".to_string()],
            vec![
                vec![Cell::text("M"), Cell::text("2024-01-01"), Cell::text("1")],
                vec![Cell::text("M"), Cell::text("2024-03-01"), Cell::text("3")],
            ],
        )
        .unwrap();

        let result = dedupe_latest_valid(&table, "meter", "when", "reading").unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.cell(0, "reading"), Some(&Cell::text("3")));
    }

    #[test]
    fn test_empty_table() {
        let engine = DeduplicationEngine::new();
        let table = create_test_table(&[]);

        let result = engine.dedupe(&table).unwrap();

        assert!(result.is_empty());
        assert_eq!(result.columns(), table.columns());
    }
}
