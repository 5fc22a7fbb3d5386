// 📊 Run Reports - what went in, what came out
// Display code gets a table in every case: the result, or an empty one next to the error.

use crate::schema::SchemaError;
use crate::table::Table;
use serde::Serialize;

// ============================================================================
// OPERATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    Dedupe,
    Compare,
    Enrich,
}

impl Operation {
    pub fn name(&self) -> &str {
        match self {
            Operation::Dedupe => "dedupe",
            Operation::Compare => "compare",
            Operation::Enrich => "enrich",
        }
    }
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub operation: Operation,

    /// Rows of the main input (the file to clean, the reference file, the primary table)
    pub rows_in: usize,

    pub rows_out: usize,

    /// Missing columns, when the operation could not run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_error: Option<SchemaError>,
}

impl RunSummary {
    /// Rows removed by the operation (zero when it added rows)
    pub fn rows_removed(&self) -> usize {
        self.rows_in.saturating_sub(self.rows_out)
    }

    pub fn succeeded(&self) -> bool {
        self.schema_error.is_none()
    }

    pub fn summary(&self) -> String {
        match &self.schema_error {
            Some(e) => format!("{}: not run, {}", self.operation.name(), e),
            None => format!(
                "{}: {} rows in, {} rows out ({} removed)",
                self.operation.name(),
                self.rows_in,
                self.rows_out,
                self.rows_removed()
            ),
        }
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of one operation, shaped for display code: `table` is always usable
#[derive(Debug, Clone)]
pub struct Outcome {
    pub table: Table,
    pub summary: RunSummary,
}

impl Outcome {
    /// Wrap an operation result. A schema failure becomes an empty table
    /// with the error kept in the summary.
    pub fn from_result(
        operation: Operation,
        rows_in: usize,
        result: Result<Table, SchemaError>,
    ) -> Self {
        let (table, schema_error) = match result {
            Ok(table) => (table, None),
            Err(e) => (Table::default(), Some(e)),
        };

        Outcome {
            summary: RunSummary {
                operation,
                rows_in,
                rows_out: table.len(),
                schema_error,
            },
            table,
        }
    }

    pub fn error(&self) -> Option<&SchemaError> {
        self.summary.schema_error.as_ref()
    }
}

// ============================================================================
// TESTS
// ============================================================================
