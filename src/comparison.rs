// 🔄 Comparison Engine - meters present in one file but not the other
// Single pass over each table: a key set of the right side, a filter over the left.

use crate::config::METER_COLUMN;
use crate::schema::{SchemaCheck, SchemaError, Side};
use crate::table::Table;
use std::collections::HashSet;
use tracing::{debug, warn};

pub struct SetComparator {
    /// Key column, looked up by the same name in both tables (default: "N° compteur")
    pub key_column: String,
}

impl SetComparator {
    pub fn new() -> Self {
        SetComparator {
            key_column: METER_COLUMN.to_string(),
        }
    }

    pub fn with_key_column(key_column: &str) -> Self {
        SetComparator {
            key_column: key_column.to_string(),
        }
    }

    /// Rows of `reference` whose key appears nowhere in `candidate`.
    ///
    /// Every such row is returned, duplicates included, in `reference` order.
    pub fn find_missing(&self, reference: &Table, candidate: &Table) -> Result<Table, SchemaError> {
        let key = self.key_column.as_str();
        let indices = SchemaCheck::new()
            .require(reference, Side::Left, &[key])
            .require(candidate, Side::Right, &[key])
            .finish()
            .inspect_err(|e| warn!(error = %e, "comparison skipped"))?;
        let (left_idx, right_idx) = (indices[0], indices[1]);

        let present: HashSet<String> = candidate
            .rows()
            .iter()
            .map(|row| row[right_idx].key())
            .collect();

        let rows: Vec<_> = reference
            .rows()
            .iter()
            .filter(|row| !present.contains(&row[left_idx].key()))
            .cloned()
            .collect();

        debug!(
            reference_rows = reference.len(),
            candidate_keys = present.len(),
            missing_rows = rows.len(),
            "compared meter sets"
        );

        Ok(Table::from_parts(reference.columns().to_vec(), rows))
    }
}

impl Default for SetComparator {
    fn default() -> Self {
        Self::new()
    }
}

/// Rows of `table_a` whose `key_col` value is absent from `table_b`.
///
/// See [`SetComparator::find_missing`].
pub fn find_missing(table_a: &Table, table_b: &Table, key_col: &str) -> Result<Table, SchemaError> {
    SetComparator::with_key_column(key_col).find_missing(table_a, table_b)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn create_test_table(keys: &[Cell]) -> Table {
        Table::from_rows(
            vec!["N° compteur".to_string(), "Adresse".to_string()],
            keys.iter()
                .enumerate()
                .map(|(i, k)| vec![k.clone(), Cell::text(format!("{} rue des Lilas", i))])
                .collect(),
        )
        .unwrap()
    }

    fn keys_of(table: &Table) -> Vec<String> {
        table
            .column("N° compteur")
            .unwrap()
            .iter()
            .map(|c| c.key())
            .collect()
    }

    #[test]
    fn test_set_difference() {
        let comparator = SetComparator::new();
        let a = create_test_table(&[Cell::Integer(1), Cell::Integer(2), Cell::Integer(3)]);
        let b = create_test_table(&[Cell::Integer(2), Cell::Integer(3), Cell::Integer(4)]);

        let result = comparator.find_missing(&a, &b).unwrap();

        assert_eq!(keys_of(&result), vec!["1"]);
        assert_eq!(result.cell(0, "Adresse"), Some(&Cell::text("0 rue des Lilas")));
    }

    #[test]
    fn test_multiplicity_and_order_preserved() {
        let comparator = SetComparator::new();
        let a = create_test_table(&[
            Cell::text("C9"),
            Cell::text("A1"),
            Cell::text("B2"),
            Cell::text("A1"),
        ]);
        let b = create_test_table(&[Cell::text("B2")]);

        let result = comparator.find_missing(&a, &b).unwrap();

        assert_eq!(keys_of(&result), vec!["C9", "A1", "A1"]);
        assert_eq!(result.cell(1, "Adresse"), Some(&Cell::text("1 rue des Lilas")));
        assert_eq!(result.cell(2, "Adresse"), Some(&Cell::text("3 rue des Lilas")));
    }

    #[test]
    fn test_keys_compared_as_strings() {
        let comparator = SetComparator::new();
        let a = create_test_table(&[Cell::Integer(7), Cell::text("007"), Cell::text("x")]);
        let b = create_test_table(&[Cell::text("7"), Cell::text("X")]);

        let result = comparator.find_missing(&a, &b).unwrap();

        assert_eq!(keys_of(&result), vec!["007", "x"]);
    }

    #[test]
    fn test_nothing_missing_is_empty_not_error() {
        let comparator = SetComparator::new();
        let a = create_test_table(&[Cell::Integer(1)]);
        let b = create_test_table(&[Cell::Integer(1), Cell::Integer(2)]);

        let result = comparator.find_missing(&a, &b).unwrap();

        assert!(result.is_empty());
        assert_eq!(result.columns(), a.columns());
    }

    #[test]
    fn test_empty_candidate_returns_everything() {
        let comparator = SetComparator::new();
        let a = create_test_table(&[Cell::Integer(1), Cell::Integer(2)]);
        let b = create_test_table(&[]);

        let result = comparator.find_missing(&a, &b).unwrap();

        assert_eq!(result, a);
    }

    #[test]
    fn test_candidate_with_different_columns() {
        let a = create_test_table(&[Cell::Integer(1), Cell::Integer(2)]);
        let b = Table::from_rows(
            vec!["Autre".to_string(), "N° compteur".to_string()],
            vec![vec![Cell::Empty, Cell::Integer(2)]],
        )
        .unwrap();

        let result = find_missing(&a, &b, "N° compteur").unwrap();

        assert_eq!(keys_of(&result), vec!["1"]);
    }

    #[test]
    fn test_missing_key_column_on_right() {
        let a = create_test_table(&[Cell::Integer(1)]);
        let b = Table::new(vec!["Compteur".to_string()]).unwrap();

        let result = find_missing(&a, &b, "N° compteur");

        let err = result.clone().unwrap_err();
        assert_eq!(err.columns(), vec!["N° compteur"]);
        assert_eq!(err.columns_on(Side::Right), vec!["N° compteur"]);
        assert!(err.columns_on(Side::Left).is_empty());
        assert!(result.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_missing_key_column_on_both_sides() {
        let a = Table::new(vec!["Compteur".to_string()]).unwrap();
        let b = Table::new(vec!["Compteur".to_string()]).unwrap();

        let err = find_missing(&a, &b, "N° compteur").unwrap_err();

        assert_eq!(err.missing.len(), 2);
        assert_eq!(err.columns_on(Side::Left), vec!["N° compteur"]);
        assert_eq!(err.columns_on(Side::Right), vec!["N° compteur"]);
    }
}
