//! Shared data model for long and wide abundance tables.

mod abundance_matrix;
mod key;
mod long_table;
mod tsv;
mod wide_table;

pub use abundance_matrix::AbundanceMatrix;
pub use key::{strip_quotes, HierarchicalKey, MAX_DEPTH};
pub use long_table::{LongRecord, LongTable, LEAF_ID_COLUMN, LEAF_ID_INDEX};
pub(crate) use long_table::validate_depth;
pub use wide_table::WideTable;
