// 📐 Shape Layer - required column checks
// Every transformation checks its inputs here before touching a row.

use crate::table::Table;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// ============================================================================
// SIDE
// ============================================================================

/// Which input of an operation a column was expected in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    /// The only input, the reference file, or the primary table of a join
    Left,
    /// The file compared against, or the lookup table of a join
    Right,
}

impl Side {
    pub fn name(&self) -> &str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

// ============================================================================
// SCHEMA ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingColumn {
    pub side: Side,
    pub column: String,
}

impl fmt::Display for MissingColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({} table)", self.column, self.side.name())
    }
}

/// One or more required columns are absent from an input table
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("missing required columns: {}", display_list(.missing))]
pub struct SchemaError {
    pub missing: Vec<MissingColumn>,
}

fn display_list(missing: &[MissingColumn]) -> String {
    missing
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl SchemaError {
    /// Names of the missing columns, in the order they were checked
    pub fn columns(&self) -> Vec<&str> {
        self.missing.iter().map(|m| m.column.as_str()).collect()
    }

    /// Names of the columns missing from one side
    pub fn columns_on(&self, side: Side) -> Vec<&str> {
        self.missing
            .iter()
            .filter(|m| m.side == side)
            .map(|m| m.column.as_str())
            .collect()
    }
}

// ============================================================================
// SCHEMA CHECK
// ============================================================================

/// Resolves required columns across one or two tables, collecting every
/// missing one before failing
#[derive(Debug, Default)]
pub struct SchemaCheck {
    found: Vec<usize>,
    missing: Vec<MissingColumn>,
}

impl SchemaCheck {
    pub fn new() -> Self {
        SchemaCheck::default()
    }

    /// Require every column in `columns` to exist in `table`.
    /// A column listed twice is reported once.
    pub fn require(mut self, table: &Table, side: Side, columns: &[&str]) -> Self {
        for &column in columns {
            match table.column_index(column) {
                Some(idx) => self.found.push(idx),
                None => {
                    let already = self
                        .missing
                        .iter()
                        .any(|m| m.side == side && m.column == column);
                    if !already {
                        self.missing.push(MissingColumn {
                            side,
                            column: column.to_string(),
                        });
                    }
                }
            }
        }
        self
    }

    /// Column indices in the order they were required, or every missing column
    pub fn finish(self) -> Result<Vec<usize>, SchemaError> {
        if self.missing.is_empty() {
            Ok(self.found)
        } else {
            Err(SchemaError {
                missing: self.missing,
            })
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
