//! Demodulator error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all `lrpt-core` operations.
#[derive(Debug, Error)]
pub enum DemodError {
    /// A configuration parameter was out of range. Reported before any work
    /// begins; the offending field and value are included for diagnostics.
    #[error("invalid configuration: {field} = {value}")]
    ConfigInvalid { field: &'static str, value: String },

    /// The sample source file could not be opened.
    #[error("could not open input {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sample source file was opened but its contents could not be
    /// parsed as the expected format.
    #[error("could not parse input as {format}: {reason}")]
    InputFormat { format: &'static str, reason: String },

    /// The input uses a bit depth this demodulator does not support.
    #[error("unsupported bits-per-sample: {bits} (only 8 and 16 are supported)")]
    Unsupported { bits: u16 },

    /// The output file could not be created.
    #[error("could not open output {path}: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A write to the output failed mid-run. The worker stops; `status()`
    /// reflects the early termination.
    #[error("write failure: {0}")]
    WriteFailure(#[source] std::io::Error),
}

/// Result type alias for `lrpt-core` operations.
pub type Result<T> = std::result::Result<T, DemodError>;
