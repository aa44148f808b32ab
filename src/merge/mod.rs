//! Merging independently produced wide tables on their composite keys.

pub mod union;

pub use union::{merge_files, merge_tables, ConflictPolicy, MergeOptions, MISSING_CELL};
