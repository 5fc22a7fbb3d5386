// Meter Toolkit - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod table;          // Table model - cells, rows, named columns
pub mod loader;         // Delimited text in and out
pub mod schema;         // Required column checks
pub mod dates;          // Lenient day-first date parsing
pub mod deduplication;  // One reading per meter
pub mod comparison;     // Meters missing from a second file
pub mod enrichment;     // Diameter join
pub mod report;         // Rows in / rows out

// Re-export commonly used types
pub use table::{Cell, Table, TableError};
pub use loader::{
    LoadOptions,
    load_table, read_table, save_table, write_table, to_csv_bytes,
};
pub use schema::{
    SchemaCheck, SchemaError, MissingColumn, Side,
};
pub use deduplication::{
    DeduplicationEngine, DedupColumns, dedupe_latest_valid,
};
pub use comparison::{
    SetComparator, find_missing,
};
pub use enrichment::{
    Enricher, JoinPolicy, enrich_with_diameter,
};
pub use report::{
    Operation, Outcome, RunSummary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
