// 📂 Loader - delimited text in, delimited text out
// Column types are inferred per column unless a hint forces text or dates.

use crate::config::{DEFAULT_DELIMITER, DEFAULT_TEXT_COLUMNS};
use crate::dates;
use crate::table::{Cell, Table};
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

// ============================================================================
// LOAD OPTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field delimiter (default: ';')
    pub delimiter: u8,

    /// Columns kept as text, never converted to numbers
    pub text_columns: Vec<String>,

    /// Columns converted to dates where the value parses
    pub date_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            delimiter: DEFAULT_DELIMITER,
            text_columns: DEFAULT_TEXT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            date_columns: Vec::new(),
        }
    }
}

impl LoadOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_text_columns(mut self, columns: Vec<String>) -> Self {
        self.text_columns = columns;
        self
    }

    pub fn with_date_columns(mut self, columns: Vec<String>) -> Self {
        self.date_columns = columns;
        self
    }
}

/// How one column's raw fields become cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Date,
    Integer,
    Float,
}

// ============================================================================
// READING
// ============================================================================

/// Load a table from a delimited text file
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let table = read_table(file, options)
        .with_context(|| format!("Failed to read table from {}", path.display()))?;

    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "loaded table"
    );
    Ok(table)
}

/// Read a table from any reader. The first record is the header.
pub fn read_table<R: Read>(reader: R, options: &LoadOptions) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read header row")?.clone();
    let columns = unique_column_names(headers.iter());
    let width = columns.len();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse line {}", line_num + 2))?;

        if record.len() > width {
            bail!(
                "Line {} has {} fields, expected at most {}",
                line_num + 2, // +2 because: 1-indexed + header row
                record.len(),
                width
            );
        }

        let mut fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        fields.resize(width, String::new());
        raw_rows.push(fields);
    }

    let kinds: Vec<ColumnKind> = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| column_kind(name, idx, &raw_rows, options))
        .collect();

    let rows: Vec<Vec<Cell>> = raw_rows
        .into_iter()
        .map(|fields| {
            fields
                .into_iter()
                .zip(&kinds)
                .map(|(field, kind)| to_cell(field, *kind))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(columns, rows)?)
}

/// Strip a byte-order mark and make repeated header names unique
/// (`Date`, `Date.1`, `Date.2`, ...)
fn unique_column_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for (i, header) in headers.enumerate() {
        let base = if i == 0 {
            header.trim_start_matches('\u{feff}')
        } else {
            header
        };

        let mut name = base.to_string();
        let mut suffix = 1;
        while columns.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        columns.push(name);
    }
    columns
}

fn column_kind(name: &str, idx: usize, rows: &[Vec<String>], options: &LoadOptions) -> ColumnKind {
    if options.text_columns.iter().any(|c| c == name) {
        return ColumnKind::Text;
    }
    if options.date_columns.iter().any(|c| c == name) {
        return ColumnKind::Date;
    }

    let mut fields = rows.iter().map(|r| r[idx].as_str()).filter(|f| !f.is_empty()).peekable();
    if fields.peek().is_none() {
        return ColumnKind::Text;
    }

    let mut kind = ColumnKind::Integer;
    for field in fields {
        if kind == ColumnKind::Integer && field.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && !is_plain_float(field) {
            return ColumnKind::Text;
        }
    }
    kind
}

/// Finite decimal numbers only: "inf", "NaN" and friends stay text
fn is_plain_float(field: &str) -> bool {
    field.parse::<f64>().map(|v| v.is_finite()).unwrap_or(false)
        && field.chars().any(|c| c.is_ascii_digit())
}

fn to_cell(field: String, kind: ColumnKind) -> Cell {
    if field.is_empty() {
        return Cell::Empty;
    }

    match kind {
        ColumnKind::Text => Cell::Text(field),
        ColumnKind::Date => match dates::parse_date(&field) {
            Some(d) => Cell::Date(d),
            None => Cell::Text(field),
        },
        ColumnKind::Integer => match field.parse::<i64>() {
            Ok(v) => Cell::Integer(v),
            Err(_) => Cell::Text(field),
        },
        ColumnKind::Float => match field.parse::<f64>() {
            Ok(v) => Cell::Float(v),
            Err(_) => Cell::Text(field),
        },
    }
}

// ============================================================================
// WRITING
// ============================================================================

/// Write a table as delimited text: header row first, columns in table order
pub fn write_table<W: Write>(writer: W, table: &Table, delimiter: u8) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(writer);

    wtr.write_record(table.columns())
        .context("Failed to write header row")?;

    for (i, row) in table.rows().iter().enumerate() {
        wtr.write_record(row.iter().map(|cell| cell.to_string()))
            .with_context(|| format!("Failed to write row {}", i + 1))?;
    }

    wtr.flush().context("Failed to flush output")?;
    Ok(())
}

/// Write a table to a file, replacing it if it exists
pub fn save_table(path: &Path, table: &Table, delimiter: u8) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    write_table(file, table, delimiter)?;

    debug!(path = %path.display(), rows = table.len(), "saved table");
    Ok(())
}

/// The bytes of a table as a UTF-8 delimited text file
pub fn to_csv_bytes(table: &Table, delimiter: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_table(&mut buffer, table, delimiter)?;
    Ok(buffer)
}

// ============================================================================
// TESTS
// ============================================================================
