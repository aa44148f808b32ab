//! Filtering primitives for wide abundance tables.

pub mod core_set;

pub use core_set::{
    filter_core, filter_core_file, filter_core_with_stats, presence_counts, CoreOptions,
    CoreSummary, CoreThreshold, PresenceRule, DEFAULT_CORE_FRACTION,
};
