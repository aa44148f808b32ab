//! Pivot long-format records into a keys × samples abundance matrix.

use crate::data::{validate_depth, AbundanceMatrix, HierarchicalKey, LongTable, MAX_DEPTH};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sprs::TriMat;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Options for transposing a long-format table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransposeOptions {
    /// Number of hierarchy levels folded into the key (1..=4).
    pub depth: usize,
}

impl Default for TransposeOptions {
    fn default() -> Self {
        Self { depth: MAX_DEPTH }
    }
}

/// Sum abundances per (key, sample).
///
/// Rows come out in key order; samples in the order they were first seen.
/// Pairs never observed read back as zero.
pub fn transpose(table: &LongTable) -> Result<AbundanceMatrix> {
    let depth = table.depth();
    validate_depth(depth)?;

    let mut sample_ids: Vec<String> = Vec::new();
    let mut sample_index: HashMap<&str, usize> = HashMap::new();
    // key -> last leaf id seen for it
    let mut distinct: BTreeMap<&HierarchicalKey, Option<&str>> = BTreeMap::new();

    for record in table.records() {
        if !sample_index.contains_key(record.sample_id.as_str()) {
            sample_index.insert(record.sample_id.as_str(), sample_ids.len());
            sample_ids.push(record.sample_id.clone());
        }
        let leaf = distinct.entry(&record.key).or_insert(None);
        if record.leaf_id.is_some() {
            *leaf = record.leaf_id.as_deref();
        }
    }

    let row_index: HashMap<&HierarchicalKey, usize> = distinct
        .keys()
        .enumerate()
        .map(|(row, &key)| (key, row))
        .collect();

    // Duplicate (row, col) triplets are summed when converting to CSR.
    let mut tri_mat = TriMat::new((distinct.len(), sample_ids.len()));
    for record in table.records() {
        if record.abundance > 0 {
            tri_mat.add_triplet(
                row_index[&record.key],
                sample_index[record.sample_id.as_str()],
                record.abundance,
            );
        }
    }

    let keys: Vec<HierarchicalKey> = distinct.keys().map(|&k| k.clone()).collect();
    let leaf_ids: Vec<Option<String>> = distinct
        .values()
        .map(|leaf| leaf.map(str::to_string))
        .collect();

    log::info!(
        "Transposed {} records (total abundance {}) into {} keys x {} samples",
        table.len(),
        table.total_abundance(),
        keys.len(),
        sample_ids.len()
    );
    if table.has_leaf_ids() {
        log::debug!("Leaf identifiers attached to the deepest level");
    }

    AbundanceMatrix::new(tri_mat.to_csr(), keys, sample_ids, depth)?.with_leaf_ids(leaf_ids)
}

/// Read a long-format file, transpose it and write the wide table.
pub fn transpose_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &TransposeOptions,
) -> Result<AbundanceMatrix> {
    let table = LongTable::from_tsv(input, options.depth)?;
    let matrix = transpose(&table)?;
    matrix.to_tsv(output)?;
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LongRecord, WideTable};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record(sample: &str, labels: &[&str], abundance: u64) -> LongRecord {
        LongRecord {
            sample_id: sample.to_string(),
            key: HierarchicalKey::from_raw(labels),
            leaf_id: None,
            abundance,
        }
    }

    fn key(labels: &[&str]) -> HierarchicalKey {
        HierarchicalKey::from_raw(labels)
    }

    #[test]
    fn test_two_level_pivot() {
        let table = LongTable::new(
            vec![
                record("S1", &["A", "B"], 5),
                record("S2", &["A", "B"], 3),
                record("S1", &["A", "C"], 2),
            ],
            2,
        )
        .unwrap();

        let mat = transpose(&table).unwrap();
        assert_eq!(mat.n_keys(), 2);
        assert_eq!(mat.sample_ids(), &["S1", "S2"]);
        assert_eq!(mat.value(&key(&["A", "B"]), "S1"), Some(5));
        assert_eq!(mat.value(&key(&["A", "B"]), "S2"), Some(3));
        assert_eq!(mat.value(&key(&["A", "C"]), "S1"), Some(2));
        assert_eq!(mat.value(&key(&["A", "C"]), "S2"), Some(0));
    }

    #[test]
    fn test_repeated_pairs_are_summed() {
        let table = LongTable::new(
            vec![
                record("S1", &["A"], 4),
                record("S1", &["A"], 6),
                record("S2", &["A"], 0),
            ],
            1,
        )
        .unwrap();

        let mat = transpose(&table).unwrap();
        assert_eq!(mat.value(&key(&["A"]), "S1"), Some(10));
        // a zero count still registers the sample column
        assert_eq!(mat.sample_ids(), &["S1", "S2"]);
        assert_eq!(mat.total(), table.total_abundance());
    }

    #[test]
    fn test_order_independent() {
        let records = vec![
            record("S1", &["X", ""], 1),
            record("S2", &["A", "B"], 2),
            record("S1", &["A", "B"], 3),
            record("S2", &["X", ""], 4),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let forward = transpose(&LongTable::new(records, 2).unwrap()).unwrap();
        let backward = transpose(&LongTable::new(reversed, 2).unwrap()).unwrap();

        assert_eq!(forward.keys(), backward.keys());
        for k in forward.keys() {
            for s in forward.sample_ids() {
                assert_eq!(forward.value(k, s), backward.value(k, s));
            }
        }
    }

    #[test]
    fn test_empty_label_kept_as_level() {
        let table = LongTable::new(
            vec![record("S1", &["A", ""], 1), record("S1", &["A", "B"], 1)],
            2,
        )
        .unwrap();
        let mat = transpose(&table).unwrap();
        assert_eq!(mat.n_keys(), 2);
    }

    #[test]
    fn test_transpose_file_with_leaf_ids() {
        let mut input = NamedTempFile::new().unwrap();
        writeln!(input, "mgid\tlevel1\tlevel2\tlevel3\tfunction\tid\tabundance").unwrap();
        writeln!(input, "mgm1\t\"Amino\"\t\"Lys\"\t\"Bio\"\t\"LysA\"\tK01586\t4").unwrap();
        writeln!(input, "mgm2\t\"Amino\"\t\"Lys\"\t\"Bio\"\t\"LysA\"\tK01586\t1").unwrap();
        input.flush().unwrap();
        let output = NamedTempFile::new().unwrap();

        let mat = transpose_file(input.path(), output.path(), &TransposeOptions::default())
            .unwrap();
        assert_eq!(mat.n_keys(), 1);

        let wide = WideTable::from_tsv(output.path()).unwrap();
        assert_eq!(
            wide.header(),
            &["Level 1", "Level 2", "Level 3", "Level 4", "mgm1", "mgm2"]
        );
        assert_eq!(
            wide.rows()[0],
            vec!["Amino", "Lys", "Bio", "LysA (K01586)", "4", "1"]
        );
    }

    #[test]
    fn test_failed_parse_writes_nothing() {
        let mut input = NamedTempFile::new().unwrap();
        writeln!(input, "mgid\tlevel1\tabundance").unwrap();
        writeln!(input, "mgm1\tA\tnot-a-number").unwrap();
        input.flush().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("wide.tsv");

        let result = transpose_file(input.path(), &output, &TransposeOptions { depth: 1 });
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
