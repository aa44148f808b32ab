//! Long-to-wide pivoting of abundance records.

pub mod pivot;

pub use pivot::{transpose, transpose_file, TransposeOptions};
