//! Sparse integer abundance matrix keyed by hierarchical categories.

use super::key::HierarchicalKey;
use super::wide_table::WideTable;
use crate::error::{Result, TableError};
use sprs::CsMat;
use std::path::Path;

/// Summed abundances of categories across samples.
///
/// Rows are hierarchical keys, columns are samples. Stored in CSR format,
/// so a (key, sample) pair that was never observed costs nothing and reads
/// back as zero.
#[derive(Debug, Clone)]
pub struct AbundanceMatrix {
    /// Sparse matrix in CSR format (keys × samples)
    data: CsMat<u64>,
    /// Row keys, all of the same depth
    keys: Vec<HierarchicalKey>,
    /// Column names
    sample_ids: Vec<String>,
    /// Display-only leaf identifier per row
    leaf_ids: Vec<Option<String>>,
    depth: usize,
}

impl AbundanceMatrix {
    /// Create a new matrix from sparse data and identifiers.
    pub fn new(
        data: CsMat<u64>,
        keys: Vec<HierarchicalKey>,
        sample_ids: Vec<String>,
        depth: usize,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != keys.len() {
            return Err(TableError::SchemaMismatch(format!(
                "matrix has {} rows but {} keys were given",
                nrows,
                keys.len()
            )));
        }
        if ncols != sample_ids.len() {
            return Err(TableError::SchemaMismatch(format!(
                "matrix has {} columns but {} sample ids were given",
                ncols,
                sample_ids.len()
            )));
        }
        if let Some(key) = keys.iter().find(|k| k.depth() != depth) {
            return Err(TableError::SchemaMismatch(format!(
                "key '{}' has {} levels, expected {}",
                key,
                key.depth(),
                depth
            )));
        }
        let leaf_ids = vec![None; keys.len()];
        Ok(Self {
            data,
            keys,
            sample_ids,
            leaf_ids,
            depth,
        })
    }

    /// Attach display-only leaf identifiers, one per row.
    pub fn with_leaf_ids(mut self, leaf_ids: Vec<Option<String>>) -> Result<Self> {
        if leaf_ids.len() != self.keys.len() {
            return Err(TableError::SchemaMismatch(format!(
                "{} leaf ids given for {} rows",
                leaf_ids.len(),
                self.keys.len()
            )));
        }
        self.leaf_ids = leaf_ids;
        Ok(self)
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data.get(row, col).copied().unwrap_or(0)
    }

    /// Look up a value by key and sample id.
    pub fn value(&self, key: &HierarchicalKey, sample_id: &str) -> Option<u64> {
        let row = self.keys.iter().position(|k| k == key)?;
        let col = self.sample_ids.iter().position(|s| s == sample_id)?;
        Some(self.get(row, col))
    }

    #[inline]
    pub fn n_keys(&self) -> usize {
        self.data.rows()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    #[inline]
    pub fn keys(&self) -> &[HierarchicalKey] {
        &self.keys
    }

    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn leaf_id(&self, row: usize) -> Option<&str> {
        self.leaf_ids.get(row).and_then(|l| l.as_deref())
    }

    /// Dense counts for one row.
    pub fn row_dense(&self, row: usize) -> Vec<u64> {
        let mut dense = vec![0u64; self.n_samples()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Sum of every cell.
    pub fn total(&self) -> u64 {
        self.data.data().iter().sum()
    }

    /// Key labels as written out, with the leaf id folded into the deepest level.
    pub fn display_labels(&self, row: usize) -> Vec<String> {
        let mut labels = self.keys[row].labels().to_vec();
        if let (Some(leaf), Some(deepest)) = (self.leaf_id(row), labels.last_mut()) {
            deepest.push_str(&format!(" ({})", leaf));
        }
        labels
    }

    /// Header for the wide output: one column per level, then samples.
    pub fn header(&self) -> Vec<String> {
        (1..=self.depth)
            .map(|lvl| format!("Level {}", lvl))
            .chain(self.sample_ids.iter().cloned())
            .collect()
    }

    /// Render as a string-cell wide table.
    pub fn to_wide_table(&self) -> Result<WideTable> {
        let rows = (0..self.n_keys())
            .map(|row| {
                let mut cells = self.display_labels(row);
                cells.extend(self.row_dense(row).into_iter().map(|v| v.to_string()));
                cells
            })
            .collect();
        WideTable::new(self.header(), rows)
    }

    /// Write the matrix to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_wide_table()?.to_tsv(path)
    }
}
