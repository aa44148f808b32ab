//! Union of wide tables over keys and sample columns.

use crate::data::{HierarchicalKey, WideTable};
use crate::error::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Cell written for a (key, sample) pair no input table provides.
pub const MISSING_CELL: &str = "0";

/// What to do when two inputs give different values for the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// The value read later replaces the earlier one.
    #[default]
    LastWins,
    /// The first value read is kept.
    FirstWins,
    /// Any disagreement aborts the merge.
    Error,
}

/// Options for merging wide tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Number of leading columns that make up the key.
    pub key_columns: usize,
    #[serde(default)]
    pub conflict: ConflictPolicy,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            key_columns: 1,
            conflict: ConflictPolicy::default(),
        }
    }
}

/// Merge two or more wide tables into one.
///
/// Key columns are named after the first table. Output rows are sorted by
/// key and sample columns are the sorted union of every table's samples;
/// pairs absent from all inputs are filled with [`MISSING_CELL`].
pub fn merge_tables(tables: &[WideTable], options: &MergeOptions) -> Result<WideTable> {
    if tables.len() < 2 {
        return Err(TableError::InvalidParameter(format!(
            "Merging needs at least two tables, got {}",
            tables.len()
        )));
    }
    let cut = options.key_columns;
    if cut == 0 {
        return Err(TableError::InvalidParameter(
            "At least one key column is required".to_string(),
        ));
    }

    let key_header = key_schema(tables, cut)?;

    let mut cells: BTreeMap<HierarchicalKey, HashMap<&str, &str>> = BTreeMap::new();
    let mut samples: BTreeSet<&str> = BTreeSet::new();
    let mut n_overwritten = 0usize;

    for table in tables {
        let sample_columns = &table.header()[cut..];
        samples.extend(sample_columns.iter().map(String::as_str));

        for row in table.rows() {
            let key = HierarchicalKey::new(row[..cut].to_vec());
            let by_sample = cells.entry(key.clone()).or_default();

            for (column, value) in sample_columns.iter().zip(&row[cut..]) {
                match by_sample.entry(column.as_str()) {
                    Entry::Vacant(slot) => {
                        slot.insert(value.as_str());
                    }
                    Entry::Occupied(mut slot) => {
                        if *slot.get() == value.as_str() {
                            continue;
                        }
                        match options.conflict {
                            ConflictPolicy::LastWins => {
                                log::debug!(
                                    "Overwriting {}/{}: '{}' -> '{}'",
                                    key,
                                    column,
                                    slot.get(),
                                    value
                                );
                                slot.insert(value.as_str());
                                n_overwritten += 1;
                            }
                            ConflictPolicy::FirstWins => {}
                            ConflictPolicy::Error => {
                                return Err(TableError::MergeConflict {
                                    key: key.to_string(),
                                    column: column.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    if n_overwritten > 0 {
        log::warn!("{} merged cells were overwritten by later inputs", n_overwritten);
    }

    let header: Vec<String> = key_header
        .iter()
        .cloned()
        .chain(samples.iter().map(|s| s.to_string()))
        .collect();

    let rows: Vec<Vec<String>> = cells
        .into_iter()
        .map(|(key, by_sample)| {
            let mut row = key.into_labels();
            row.extend(samples.iter().map(|s| {
                by_sample
                    .get(s)
                    .copied()
                    .unwrap_or(MISSING_CELL)
                    .to_string()
            }));
            row
        })
        .collect();

    log::info!(
        "Merged {} tables into {} keys x {} samples",
        tables.len(),
        rows.len(),
        samples.len()
    );

    WideTable::new(header, rows)
}

/// Read wide tables from disk, merge them and write the result.
pub fn merge_files<P: AsRef<Path>, Q: AsRef<Path>>(
    inputs: &[P],
    output: Q,
    options: &MergeOptions,
) -> Result<WideTable> {
    let mut tables = Vec::with_capacity(inputs.len());
    for path in inputs {
        let table = WideTable::from_tsv(path)?;
        if table.n_rows() == 0 {
            return Err(TableError::EmptyData(format!(
                "cannot determine key schema: {:?} has no data rows",
                path.as_ref()
            )));
        }
        tables.push(table);
    }
    let merged = merge_tables(&tables, options)?;
    merged.to_tsv(output)?;
    Ok(merged)
}

/// Key column names taken from the first table, checked against the rest.
fn key_schema(tables: &[WideTable], cut: usize) -> Result<Vec<String>> {
    let mut key_header: Option<&[String]> = None;

    for (idx, table) in tables.iter().enumerate() {
        if table.n_rows() == 0 {
            return Err(TableError::EmptyData(format!(
                "cannot determine key schema: table {} has no data rows",
                idx + 1
            )));
        }
        if table.n_columns() <= cut {
            return Err(TableError::SchemaMismatch(format!(
                "table {} has {} columns, which leaves no sample columns after {} key columns",
                idx + 1,
                table.n_columns(),
                cut
            )));
        }
        let names = &table.header()[..cut];
        match key_header {
            None => key_header = Some(names),
            Some(expected) if expected != names => {
                return Err(TableError::SchemaMismatch(format!(
                    "table {} key columns {:?} differ from {:?}",
                    idx + 1,
                    names,
                    expected
                )));
            }
            Some(_) => {}
        }
    }

    Ok(key_header.map(<[String]>::to_vec).unwrap_or_default())
}
