//! Hierarchical Abundance Table Toolkit
//!
//! Transformations over the abundance tables a metagenomics annotation
//! service hands out: long lists of (sample, category path, count) records
//! and the wide category × sample matrices built from them.
//!
//! # Overview
//!
//! - **data**: Core data structures (HierarchicalKey, LongTable, AbundanceMatrix, WideTable)
//! - **transpose**: Pivot long records into a wide matrix, summing per key and sample
//! - **merge**: Union independently built wide tables on their composite key
//! - **filter**: Extract the core set of rows present in enough samples
//! - **pipeline**: Chain the three stages through intermediate files from a YAML config
//!
//! # Example
//!
//! ```no_run
//! use abundance_tables::prelude::*;
//!
//! let long = LongTable::from_tsv("subsystems.tsv", 3).unwrap();
//! let wide = transpose(&long).unwrap();
//! wide.to_tsv("subsystems_wide.tsv").unwrap();
//!
//! let merged = merge_files(
//!     &["subsystems_wide.tsv", "other_wide.tsv"],
//!     "merged.tsv",
//!     &MergeOptions { key_columns: 3, ..MergeOptions::default() },
//! )
//! .unwrap();
//!
//! let options = CoreOptions { sample_start: 3, ..CoreOptions::default() };
//! let (core, summary) = filter_core_with_stats(&merged, &options).unwrap();
//! core.to_tsv("core.tsv").unwrap();
//! println!("{}", summary);
//! ```

pub mod data;
pub mod error;
pub mod filter;
pub mod merge;
pub mod pipeline;
pub mod transpose;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{
        AbundanceMatrix, HierarchicalKey, LongRecord, LongTable, WideTable, MAX_DEPTH,
    };
    pub use crate::error::{Result, TableError};
    pub use crate::filter::{
        filter_core, filter_core_file, filter_core_with_stats, presence_counts, CoreOptions,
        CoreSummary, CoreThreshold, PresenceRule,
    };
    pub use crate::merge::{merge_files, merge_tables, ConflictPolicy, MergeOptions, MISSING_CELL};
    pub use crate::pipeline::{StepReport, Workflow, WorkflowConfig, WorkflowStep};
    pub use crate::transpose::{transpose, transpose_file, TransposeOptions};
}
