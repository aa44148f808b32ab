//! Tab-separated reader shared by the long and wide table loaders.

use crate::error::{Result, TableError};
use std::path::{Path, PathBuf};

/// One non-blank data line.
#[derive(Debug, Clone)]
pub(crate) struct TsvRow {
    /// 1-based line number in the source file.
    pub line: u64,
    pub fields: Vec<String>,
}

/// A whole tab-separated file: header plus data rows.
#[derive(Debug, Clone)]
pub(crate) struct TsvFile {
    pub path: PathBuf,
    pub header: Vec<String>,
    pub rows: Vec<TsvRow>,
}

impl TsvFile {
    /// Build a malformed-input error pointing into this file.
    pub fn malformed(&self, line: u64, reason: impl Into<String>) -> TableError {
        TableError::MalformedInput {
            path: self.path.clone(),
            line,
            reason: reason.into(),
        }
    }
}

/// Read a tab-separated file into memory.
///
/// Quote characters are kept verbatim; callers decide whether to strip them.
/// Blank lines are skipped. The first non-blank line is the header.
pub(crate) fn read_tsv(path: &Path) -> Result<TsvFile> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path)?;

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        match header {
            None => header = Some(fields.iter().map(|f| f.trim().to_string()).collect()),
            Some(_) => rows.push(TsvRow { line, fields }),
        }
    }

    let header = header.ok_or_else(|| TableError::MalformedInput {
        path: path.to_path_buf(),
        line: 1,
        reason: "missing header row".to_string(),
    })?;

    log::debug!("Read {} data rows from {:?}", rows.len(), path);

    Ok(TsvFile {
        path: path.to_path_buf(),
        header,
        rows,
    })
}
