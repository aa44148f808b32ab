//! Long-format abundance records: one row per (sample, category) observation.

use super::key::{HierarchicalKey, MAX_DEPTH};
use super::tsv::read_tsv;
use crate::error::{Result, TableError};
use std::path::Path;

/// Header name that marks a leaf identifier column (e.g. a KO id).
pub const LEAF_ID_COLUMN: &str = "id";

/// Zero-based position of the leaf identifier column when present.
pub const LEAF_ID_INDEX: usize = 5;

/// A single observation of a category in a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRecord {
    pub sample_id: String,
    pub key: HierarchicalKey,
    /// Terminal identifier, only carried at maximum depth.
    pub leaf_id: Option<String>,
    pub abundance: u64,
}

/// A parsed long-format table, keyed at a fixed depth.
#[derive(Debug, Clone)]
pub struct LongTable {
    records: Vec<LongRecord>,
    depth: usize,
    has_leaf_ids: bool,
}

impl LongTable {
    /// Wrap already-built records.
    ///
    /// Every record key must have exactly `depth` levels.
    pub fn new(records: Vec<LongRecord>, depth: usize) -> Result<Self> {
        validate_depth(depth)?;
        if let Some(bad) = records.iter().find(|r| r.key.depth() != depth) {
            return Err(TableError::InvalidParameter(format!(
                "Key '{}' has {} levels, expected {}",
                bad.key,
                bad.key.depth(),
                depth
            )));
        }
        let has_leaf_ids = records.iter().any(|r| r.leaf_id.is_some());
        Ok(Self {
            records,
            depth,
            has_leaf_ids,
        })
    }

    /// Load a long-format table from a TSV file.
    ///
    /// Expected format:
    /// - Header row; a sixth column named `id` marks a leaf identifier scheme
    /// - Rows: sample id, hierarchy levels (optionally quoted), [id], ..., count
    ///
    /// The key is built from the `depth` columns after the sample id and the
    /// abundance is always the last field.
    pub fn from_tsv<P: AsRef<Path>>(path: P, depth: usize) -> Result<Self> {
        validate_depth(depth)?;
        let tsv = read_tsv(path.as_ref())?;

        let leaf_schema = tsv
            .header
            .get(LEAF_ID_INDEX)
            .is_some_and(|h| h == LEAF_ID_COLUMN);
        let keep_leaf = leaf_schema && depth == MAX_DEPTH;
        if leaf_schema {
            log::debug!(
                "Leaf identifier column detected in {:?} (kept: {})",
                tsv.path,
                keep_leaf
            );
        }

        // sample id + levels + count, plus the id column when it is read
        let min_fields = if keep_leaf {
            LEAF_ID_INDEX + 2
        } else {
            depth + 2
        };

        let mut records = Vec::with_capacity(tsv.rows.len());
        for row in &tsv.rows {
            let fields = &row.fields;
            if fields.len() < min_fields {
                return Err(tsv.malformed(
                    row.line,
                    format!(
                        "expected at least {} fields for depth {}, found {}",
                        min_fields,
                        depth,
                        fields.len()
                    ),
                ));
            }

            let raw_count = &fields[fields.len() - 1];
            let abundance: u64 = raw_count
                .trim()
                .parse()
                .map_err(|_| TableError::InvalidCount {
                    value: raw_count.clone(),
                    line: row.line,
                    column: fields.len(),
                })?;

            records.push(LongRecord {
                sample_id: fields[0].clone(),
                key: HierarchicalKey::from_raw(&fields[1..=depth]),
                leaf_id: keep_leaf.then(|| fields[LEAF_ID_INDEX].clone()),
                abundance,
            });
        }

        Ok(Self {
            records,
            depth,
            has_leaf_ids: keep_leaf,
        })
    }

    #[inline]
    pub fn records(&self) -> &[LongRecord] {
        &self.records
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether records carry leaf identifiers for display.
    #[inline]
    pub fn has_leaf_ids(&self) -> bool {
        self.has_leaf_ids
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of every record's abundance.
    pub fn total_abundance(&self) -> u64 {
        self.records.iter().map(|r| r.abundance).sum()
    }
}

pub(crate) fn validate_depth(depth: usize) -> Result<()> {
    if !(1..=MAX_DEPTH).contains(&depth) {
        return Err(TableError::InvalidParameter(format!(
            "Key depth must be between 1 and {}, got {}",
            MAX_DEPTH, depth
        )));
    }
    Ok(())
}
