//! Wide-format tables with verbatim string cells.
//!
//! Merge and core filtering operate on this representation so that cell
//! values pass through exactly as written by whatever produced them.

use super::tsv::read_tsv;
use crate::error::{Result, TableError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A header plus rows of equal width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    /// 1-based source line of each row
    lines: Vec<u64>,
}

impl WideTable {
    /// Create a table, checking every row against the header width.
    ///
    /// Rows are numbered as if written directly under the header.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != header.len())
        {
            return Err(TableError::SchemaMismatch(format!(
                "row {} has {} columns, header has {}",
                idx,
                row.len(),
                header.len()
            )));
        }
        let lines = (0..rows.len()).map(|idx| idx as u64 + 2).collect();
        Ok(Self {
            header,
            rows,
            lines,
        })
    }

    /// Load a wide table from a TSV file.
    ///
    /// Every data row must have exactly as many fields as the header.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let tsv = read_tsv(path.as_ref())?;
        let width = tsv.header.len();

        let mut rows = Vec::with_capacity(tsv.rows.len());
        let mut lines = Vec::with_capacity(tsv.rows.len());
        for row in &tsv.rows {
            if row.fields.len() != width {
                return Err(tsv.malformed(
                    row.line,
                    format!("expected {} fields, found {}", width, row.fields.len()),
                ));
            }
            rows.push(row.fields.clone());
            lines.push(row.line);
        }

        Ok(Self {
            header: tsv.header,
            rows,
            lines,
        })
    }

    /// Write the table to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_tsv(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the table as tab-separated text.
    pub fn write_tsv<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{}", self.header.join("\t"))?;
        for row in &self.rows {
            writeln!(writer, "{}", row.join("\t"))?;
        }
        Ok(())
    }

    #[inline]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.header.len()
    }

    /// Source line of a row, for error messages.
    pub fn line(&self, row: usize) -> u64 {
        self.lines.get(row).copied().unwrap_or(row as u64 + 2)
    }

    /// Keep only the given rows, in the given order, with every column.
    pub fn subset_rows(&self, indices: &[usize]) -> Result<Self> {
        let mut rows = Vec::with_capacity(indices.len());
        let mut lines = Vec::with_capacity(indices.len());
        for &idx in indices {
            let row = self.rows.get(idx).ok_or_else(|| {
                TableError::InvalidParameter(format!("Row index {} out of bounds", idx))
            })?;
            rows.push(row.clone());
            lines.push(self.line(idx));
        }
        Ok(Self {
            header: self.header.clone(),
            rows,
            lines,
        })
    }
}
