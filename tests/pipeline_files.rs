//! Integration tests for the file-based transpose → merge → core pipeline.

use abundance_tables::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Rows of a wide table keyed by their leading `key_columns` cells.
fn rows_by_key(
    table: &WideTable,
    key_columns: usize,
) -> HashMap<Vec<String>, HashMap<String, String>> {
    let samples = &table.header()[key_columns..];
    table
        .rows()
        .iter()
        .map(|row| {
            let values = samples
                .iter()
                .cloned()
                .zip(row[key_columns..].iter().cloned())
                .collect();
            (row[..key_columns].to_vec(), values)
        })
        .collect()
}

fn key(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

#[test]
fn transpose_two_levels_from_file() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "long.tsv",
        "mgid\tlevel1\tlevel2\tlevel3\tabundance\n\
         S1\tA\tB\t\t5\n\
         S2\tA\tB\t\t3\n\
         S1\tA\tC\t\t2\n",
    );
    let output = dir.path().join("wide.tsv");

    transpose_file(&input, &output, &TransposeOptions { depth: 2 }).unwrap();
    let wide = WideTable::from_tsv(&output).unwrap();

    assert_eq!(&wide.header()[..2], &["Level 1", "Level 2"]);
    let rows = rows_by_key(&wide, 2);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[&key(&["A", "B"])]["S1"], "5");
    assert_eq!(rows[&key(&["A", "B"])]["S2"], "3");
    assert_eq!(rows[&key(&["A", "C"])]["S1"], "2");
    assert_eq!(rows[&key(&["A", "C"])]["S2"], "0");
}

#[test]
fn merge_fills_absent_pairs() {
    let dir = TempDir::new().unwrap();
    let t1 = write(&dir, "t1.tsv", "Level 1\tLevel 2\tS1\nA\tB\t5\n");
    let t2 = write(&dir, "t2.tsv", "Level 1\tLevel 2\tS2\nA\tB\t3\nA\tC\t2\n");
    let output = dir.path().join("merged.tsv");

    let options = MergeOptions {
        key_columns: 2,
        ..MergeOptions::default()
    };
    merge_files(&[&t1, &t2], &output, &options).unwrap();

    let merged = WideTable::from_tsv(&output).unwrap();
    assert_eq!(merged.header(), &["Level 1", "Level 2", "S1", "S2"]);
    let rows = rows_by_key(&merged, 2);
    let keys: HashSet<_> = rows.keys().cloned().collect();
    assert_eq!(keys, HashSet::from([key(&["A", "B"]), key(&["A", "C"])]));
    assert_eq!(rows[&key(&["A", "C"])]["S1"], MISSING_CELL);
    assert_eq!(rows[&key(&["A", "B"])]["S1"], "5");
}

#[test]
fn workflow_merges_three_tables() {
    let dir = TempDir::new().unwrap();
    write(&dir, "gut.tsv", "Level 1\tmgm9\nAmino\t4\nCarbs\t1\n");
    write(&dir, "soil.tsv", "Level 1\tmgm2\nCarbs\t7\n");
    write(&dir, "water.tsv", "Level 1\tmgm5\tmgm1\nCarbs\t2\t0\nVirulence\t3\t6\n");

    let reports = Workflow::new()
        .name("three-sites")
        .base_dir(dir.path())
        .merge(
            vec!["gut.tsv".into(), "soil.tsv".into(), "water.tsv".into()],
            "merged.tsv",
            MergeOptions::default(),
        )
        .run()
        .unwrap();
    assert_eq!(reports[0].n_rows, 3);

    let merged = WideTable::from_tsv(dir.path().join("merged.tsv")).unwrap();
    assert_eq!(merged.header(), &["Level 1", "mgm1", "mgm2", "mgm5", "mgm9"]);
    let rows = rows_by_key(&merged, 1);
    let carbs = &rows[&key(&["Carbs"])];
    assert_eq!(carbs["mgm1"], "0");
    assert_eq!(carbs["mgm2"], "7");
    assert_eq!(carbs["mgm5"], "2");
    assert_eq!(carbs["mgm9"], "1");
    // a key from a single table is zero in the other two tables' samples
    let virulence = &rows[&key(&["Virulence"])];
    assert_eq!(virulence["mgm2"], MISSING_CELL);
    assert_eq!(virulence["mgm9"], MISSING_CELL);
    assert_eq!(virulence["mgm1"], "6");
    let amino = &rows[&key(&["Amino"])];
    assert_eq!(amino["mgm9"], "4");
    assert_eq!(amino["mgm5"], MISSING_CELL);
}

#[test]
fn merge_rejects_table_without_rows() {
    let dir = TempDir::new().unwrap();
    let t1 = write(&dir, "t1.tsv", "id\tS1\nk\t1\n");
    let t2 = write(&dir, "t2.tsv", "id\tS2\n");
    let output = dir.path().join("merged.tsv");

    let err = merge_files(&[&t1, &t2], &output, &MergeOptions::default()).unwrap_err();
    assert!(matches!(err, TableError::EmptyData(_)));
    assert!(!output.exists());
}

#[test]
fn core_with_default_fraction_on_four_samples() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "wide.tsv",
        "ko\tS1\tS2\tS3\tS4\n\
         K3\t1\t1\t1\t0\n\
         K2\t1\t1\t0\t0\n\
         K4\t1\t1\t1\t1\n",
    );
    let output = dir.path().join("core.tsv");

    let options =
        CoreOptions::from_column_number(2, None, Some(0.8), PresenceRule::Literal).unwrap();
    let summary = filter_core_file(&input, &output, &options).unwrap();

    assert_eq!(summary.min_samples, 3);
    assert_eq!(summary.n_samples, 4);
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written, "ko\tS1\tS2\tS3\tS4\nK3\t1\t1\t1\t0\nK4\t1\t1\t1\t1\n");
}

fn long_file(samples: &[&str]) -> String {
    let mut contents = String::from("mgid\tlevel1\tlevel2\tlevel3\tabundance\n");
    for (i, sample) in samples.iter().enumerate() {
        // "Core" is everywhere, "Rare" only in the first sample
        contents.push_str(&format!("{sample}\t\"Carbs\"\t\"Core\"\t\"x\"\t{}\n", i + 1));
        contents.push_str(&format!("{sample}\t\"Carbs\"\t\"Core\"\t\"y\"\t1\n"));
        if i == 0 {
            contents.push_str(&format!("{sample}\t\"Carbs\"\t\"Rare\"\t\"z\"\t9\n"));
        }
    }
    contents
}

#[test]
fn workflow_runs_all_three_stages() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.tsv", &long_file(&["mgm1", "mgm2"]));
    write(&dir, "b.tsv", &long_file(&["mgm3", "mgm4", "mgm5"]));
    let yaml = "\
name: two-projects
steps:
  - step: transpose
    input: a.tsv
    output: a_wide.tsv
    depth: 2
  - step: transpose
    input: b.tsv
    output: b_wide.tsv
    depth: 2
  - step: merge
    inputs: [a_wide.tsv, b_wide.tsv]
    output: merged.tsv
    key_columns: 2
  - step: core
    input: merged.tsv
    output: core.tsv
    sample_start_column: 3
";
    let config_path = write(&dir, "workflow.yaml", yaml);

    let config = WorkflowConfig::from_path(&config_path).unwrap();
    let reports = Workflow::from_config(&config)
        .base_dir(dir.path())
        .run()
        .unwrap();

    assert_eq!(reports.len(), 4);
    assert_eq!(reports[2].n_rows, 2);
    assert_eq!(reports[3].n_rows, 1);

    let merged = WideTable::from_tsv(dir.path().join("merged.tsv")).unwrap();
    assert_eq!(
        merged.header(),
        &["Level 1", "Level 2", "mgm1", "mgm2", "mgm3", "mgm4", "mgm5"]
    );

    let core = WideTable::from_tsv(dir.path().join("core.tsv")).unwrap();
    assert_eq!(core.n_rows(), 1);
    // levels 3 were summed away: x + y per sample
    assert_eq!(core.rows()[0], vec!["Carbs", "Core", "2", "3", "2", "3", "4"]);
}

#[test]
fn workflow_stops_at_first_failure() {
    let dir = TempDir::new().unwrap();
    let workflow = Workflow::new()
        .base_dir(dir.path())
        .transpose("missing.tsv", "wide.tsv", 2)
        .core("wide.tsv", "core.tsv", 3, 0.8);

    assert!(workflow.run().is_err());
    assert!(!Path::new(&dir.path().join("core.tsv")).exists());
}
