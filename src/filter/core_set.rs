//! Core-set extraction: rows present in enough samples.

use crate::data::WideTable;
use crate::error::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fraction of samples a row must be present in when no count is given.
pub const DEFAULT_CORE_FRACTION: f64 = 0.8;

/// Minimum presence a row needs to be part of the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreThreshold {
    /// Absolute number of samples.
    MinSamples(usize),
    /// Fraction of sample columns, truncated to a whole count.
    MinFraction(f64),
}

impl Default for CoreThreshold {
    fn default() -> Self {
        CoreThreshold::MinFraction(DEFAULT_CORE_FRACTION)
    }
}

impl CoreThreshold {
    /// Effective sample count for a table with `n_samples` sample columns.
    ///
    /// A row absent from every sample is never core, so the result is at
    /// least 1.
    pub fn resolve(&self, n_samples: usize) -> Result<usize> {
        let min = match *self {
            CoreThreshold::MinSamples(n) => n,
            CoreThreshold::MinFraction(f) => {
                if !(0.0..=1.0).contains(&f) {
                    return Err(TableError::InvalidParameter(format!(
                        "Core fraction must be between 0 and 1, got {}",
                        f
                    )));
                }
                // truncation, not rounding: 0.8 * 4 samples -> 3
                (f * n_samples as f64) as usize
            }
        };
        Ok(min.max(1))
    }
}

/// How a cell is judged present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceRule {
    /// Anything other than the literal text `0` is present ("0.0" counts).
    #[default]
    Literal,
    /// Present when the value parses as a non-zero number.
    Numeric,
}

/// Options for core-set extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreOptions {
    /// Zero-based index of the first sample column. Everything before it is
    /// identifier or metadata.
    pub sample_start: usize,
    #[serde(default)]
    pub threshold: CoreThreshold,
    #[serde(default)]
    pub presence: PresenceRule,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            sample_start: 1,
            threshold: CoreThreshold::default(),
            presence: PresenceRule::default(),
        }
    }
}

impl CoreOptions {
    /// Build options from a 1-based sample start column and at most one of
    /// an absolute or fractional threshold.
    pub fn from_column_number(
        sample_start_column: usize,
        min_samples: Option<usize>,
        min_fraction: Option<f64>,
        presence: PresenceRule,
    ) -> Result<Self> {
        if sample_start_column < 2 {
            return Err(TableError::InvalidParameter(format!(
                "Sample start column must be 2 or greater, got {}",
                sample_start_column
            )));
        }
        let threshold = match (min_samples, min_fraction) {
            (Some(_), Some(_)) => {
                return Err(TableError::InvalidParameter(
                    "Give either a minimum sample count or a minimum fraction, not both"
                        .to_string(),
                ))
            }
            (Some(n), None) => CoreThreshold::MinSamples(n),
            (None, Some(f)) => CoreThreshold::MinFraction(f),
            (None, None) => CoreThreshold::default(),
        };
        Ok(Self {
            sample_start: sample_start_column - 1,
            threshold,
            presence,
        })
    }
}

/// Statistics from a core extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreSummary {
    /// Number of sample columns.
    pub n_samples: usize,
    /// Rows before filtering.
    pub n_rows_before: usize,
    /// Effective minimum number of samples.
    pub min_samples: usize,
    /// Rows in the core.
    pub n_core: usize,
    /// Rows removed.
    pub n_removed: usize,
    /// Proportion of rows retained.
    pub retention_rate: f64,
}

impl std::fmt::Display for CoreSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Core Set")?;
        writeln!(f, "  Input samples:   {}", self.n_samples)?;
        writeln!(f, "  Input rows:      {}", self.n_rows_before)?;
        writeln!(f, "  Samples in core: {}", self.min_samples)?;
        writeln!(f, "  Rows in core:    {}", self.n_core)?;
        writeln!(f, "  Retained:        {:.1}%", self.retention_rate * 100.0)?;
        Ok(())
    }
}

/// Number of present sample cells in each row.
pub fn presence_counts(table: &WideTable, options: &CoreOptions) -> Result<Vec<usize>> {
    let start = sample_start(table, options)?;

    table
        .rows()
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let mut present = 0;
            for (offset, value) in row[start..].iter().enumerate() {
                let hit = match options.presence {
                    PresenceRule::Literal => value != "0",
                    PresenceRule::Numeric => {
                        let parsed: f64 = value
                            .trim()
                            .parse()
                            .map_err(|_| TableError::InvalidCount {
                                value: value.clone(),
                                line: table.line(row_idx),
                                column: start + offset + 1,
                            })?;
                        parsed != 0.0
                    }
                };
                if hit {
                    present += 1;
                }
            }
            Ok::<_, TableError>(present)
        })
        .collect()
}

/// Keep rows whose presence count meets the threshold.
///
/// Row order and every column, metadata included, are preserved.
pub fn filter_core(table: &WideTable, options: &CoreOptions) -> Result<WideTable> {
    filter_core_with_stats(table, options).map(|(core, _)| core)
}

/// Core extraction with statistics about what was kept.
pub fn filter_core_with_stats(
    table: &WideTable,
    options: &CoreOptions,
) -> Result<(WideTable, CoreSummary)> {
    let n_samples = table.n_columns().saturating_sub(sample_start(table, options)?);
    let min_samples = options.threshold.resolve(n_samples)?;
    let presence = presence_counts(table, options)?;

    let keep: Vec<usize> = presence
        .iter()
        .enumerate()
        .filter(|(_, &count)| count >= min_samples)
        .map(|(row, _)| row)
        .collect();

    let core = table.subset_rows(&keep)?;
    let n_rows_before = table.n_rows();
    let summary = CoreSummary {
        n_samples,
        n_rows_before,
        min_samples,
        n_core: core.n_rows(),
        n_removed: n_rows_before - core.n_rows(),
        retention_rate: if n_rows_before > 0 {
            core.n_rows() as f64 / n_rows_before as f64
        } else {
            0.0
        },
    };

    log::info!(
        "{} of {} rows present in at least {} of {} samples",
        summary.n_core,
        summary.n_rows_before,
        summary.min_samples,
        summary.n_samples
    );

    Ok((core, summary))
}

/// Read a wide table, extract its core and write it out.
pub fn filter_core_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &CoreOptions,
) -> Result<CoreSummary> {
    let table = WideTable::from_tsv(input)?;
    let (core, summary) = filter_core_with_stats(&table, options)?;
    core.to_tsv(output)?;
    Ok(summary)
}

fn sample_start(table: &WideTable, options: &CoreOptions) -> Result<usize> {
    let start = options.sample_start;
    if start == 0 {
        return Err(TableError::InvalidParameter(
            "An identifier column must precede the sample columns".to_string(),
        ));
    }
    if start >= table.n_columns() {
        return Err(TableError::SchemaMismatch(format!(
            "sample columns start at index {} but the table has {} columns",
            start,
            table.n_columns()
        )));
    }
    Ok(start)
}
