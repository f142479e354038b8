//! Error taxonomy for writing and re-reading reports.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by report generation and report parsing.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The output file could not be created.
    #[error("ERROR(report) : Cannot open {} in write mode: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input file could not be opened.
    #[error("Cannot open file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read/write failure on an already open stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A header line is malformed (e.g. lacks the `:` delimiter).
    #[error("Format error during loading cafe file (line {line_no}): {line}")]
    Format { line_no: usize, line: String },

    /// Newick text could not be turned into a CAFE tree.
    #[error("tree error: {0}")]
    Tree(String),

    /// Bad arguments (empty option list, missing data).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A statistical routine is not available to this engine.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ReportError>;
