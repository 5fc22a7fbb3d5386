// 🔗 Enrichment Engine - attach a diameter to every meter reading
// Left outer join on meter keys whose column names differ between the two files.

use crate::config::{DIAMETER_COLUMN, LOOKUP_METER_COLUMN, METER_COLUMN};
use crate::schema::{SchemaCheck, SchemaError, Side};
use crate::table::{Cell, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

// ============================================================================
// JOIN POLICY
// ============================================================================

/// What to do when several lookup rows share a key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinPolicy {
    /// The first lookup row (in lookup order) wins; output has exactly one
    /// row per primary row
    #[default]
    FirstMatch,

    /// One output row per matching lookup row, in lookup order; unmatched
    /// primary rows still appear once
    FanOut,
}

// ============================================================================
// ENRICHER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enricher {
    /// Key column of the primary table (default: "N° compteur")
    pub primary_key: String,

    /// Key column of the lookup table (default: "Numéro de compteur")
    pub lookup_key: String,

    /// Attribute copied from the lookup table (default: "Diametre")
    pub diameter: String,

    pub policy: JoinPolicy,
}

impl Enricher {
    pub fn new() -> Self {
        Enricher {
            primary_key: METER_COLUMN.to_string(),
            lookup_key: LOOKUP_METER_COLUMN.to_string(),
            diameter: DIAMETER_COLUMN.to_string(),
            policy: JoinPolicy::FirstMatch,
        }
    }

    pub fn with_columns(primary_key: &str, lookup_key: &str, diameter: &str) -> Self {
        Enricher {
            primary_key: primary_key.to_string(),
            lookup_key: lookup_key.to_string(),
            diameter: diameter.to_string(),
            policy: JoinPolicy::FirstMatch,
        }
    }

    /// Builder pattern: choose the duplicate-key policy
    pub fn with_policy(mut self, policy: JoinPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Name of the appended column: the diameter column's own name, or
    /// `{diameter}_lookup`, `{diameter}_lookup.1`, ... when already taken
    pub fn output_column(&self, primary: &Table) -> String {
        if !primary.has_column(&self.diameter) {
            return self.diameter.clone();
        }

        let base = format!("{}_lookup", self.diameter);
        let mut name = base.clone();
        let mut suffix = 1;
        while primary.has_column(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        name
    }

    /// Left outer join of the lookup's diameter onto `primary`.
    ///
    /// All primary columns are kept in order and the diameter is appended.
    /// Rows without a match get an empty diameter. The lookup key column is
    /// not copied.
    pub fn enrich(&self, primary: &Table, lookup: &Table) -> Result<Table, SchemaError> {
        let indices = SchemaCheck::new()
            .require(primary, Side::Left, &[self.primary_key.as_str()])
            .require(
                lookup,
                Side::Right,
                &[self.lookup_key.as_str(), self.diameter.as_str()],
            )
            .finish()
            .inspect_err(|e| warn!(error = %e, "enrichment skipped"))?;
        let (primary_idx, lookup_idx, diameter_idx) = (indices[0], indices[1], indices[2]);

        // Matches per key, in lookup order
        let mut matches: HashMap<String, Vec<&Cell>> = HashMap::new();
        for row in lookup.rows() {
            matches
                .entry(row[lookup_idx].key())
                .or_default()
                .push(&row[diameter_idx]);
        }

        let mut columns = primary.columns().to_vec();
        columns.push(self.output_column(primary));

        let mut rows = Vec::with_capacity(primary.len());
        let mut unmatched = 0;
        for row in primary.rows() {
            let found = matches.get(&row[primary_idx].key());
            let diameters: Vec<Cell> = match (found, self.policy) {
                (None, _) => {
                    unmatched += 1;
                    vec![Cell::Empty]
                }
                (Some(cells), JoinPolicy::FirstMatch) => vec![cells[0].clone()],
                (Some(cells), JoinPolicy::FanOut) => cells.iter().map(|c| (*c).clone()).collect(),
            };

            for diameter in diameters {
                let mut out = row.clone();
                out.push(diameter);
                rows.push(out);
            }
        }

        debug!(
            primary_rows = primary.len(),
            lookup_rows = lookup.len(),
            unmatched,
            rows_out = rows.len(),
            policy = ?self.policy,
            "joined diameters"
        );

        Ok(Table::from_parts(columns, rows))
    }
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new()
    }
}

/// Left-join `diameter_col` from `lookup` onto `primary`, first match wins.
///
/// See [`Enricher::enrich`].
pub fn enrich_with_diameter(
    primary: &Table,
    lookup: &Table,
    primary_key_col: &str,
    lookup_key_col: &str,
    diameter_col: &str,
) -> Result<Table, SchemaError> {
    Enricher::with_columns(primary_key_col, lookup_key_col, diameter_col).enrich(primary, lookup)
}

// ============================================================================
// TESTS
// ============================================================================
