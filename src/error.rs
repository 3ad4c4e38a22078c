//! Error types for the import pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while converting a dump into the node table.
///
/// Only [`ImportError::Decode`] is recoverable: the driver counts it and moves
/// on to the next line. Every other variant aborts the run.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The input file could not be opened
    #[error("failed to open input '{path}': {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The byte stream is not validly compressed or is truncated
    #[error("decompression failed after {lines} lines: {source}")]
    Decompression {
        lines: u64,
        #[source]
        source: io::Error,
    },

    /// A line is not a well-formed entity object
    #[error("malformed record: {0}")]
    Decode(#[from] serde_json::Error),

    /// The filter rule file is missing or not a relation-to-ids map
    #[error("invalid filter rules in '{path}': {reason}")]
    FilterRules { path: PathBuf, reason: String },

    /// Unknown, duplicate or missing column in the output schema
    #[error("invalid column list: {0}")]
    Schema(String),

    /// A run parameter is out of range
    #[error("configuration error: {0}")]
    Config(String),

    /// The output sink could not be opened or written
    #[error("failed to write output '{path}': {source}")]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ImportError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ImportError::Decode(_))
    }
}
