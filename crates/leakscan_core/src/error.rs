//! Error types for pattern compilation and scanning, plus the top-level
//! union that also covers configuration failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when compiling the effective pattern set.
///
/// A broken detector is a silent security gap, so compilation failures are
/// fatal: no file is scanned when any configured pattern is invalid.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A single pattern source failed to compile as a regular expression.
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        /// The pattern source that failed to compile.
        pattern: String,
        /// The underlying regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// The combined alternation failed to compile even though every pattern
    /// compiled standalone (e.g. the joined expression exceeds size limits).
    #[error("failed to compile combined pattern expression: {source}")]
    Combined {
        /// The underlying regex compilation error.
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while scanning candidate files.
///
/// Any file that cannot be read or stat-ed fails the whole run; silently
/// skipping it would be a false negative.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A file could not be read or stat-ed.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Path of the file that could not be accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error type for the leakscan pipeline.
///
/// Unifies configuration resolution, pattern compilation, and scan I/O
/// failures into one type for callers that orchestrate the full run.
#[derive(Debug, Error)]
pub enum LeakError {
    /// The configuration file is malformed or contains invalid values.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A configured pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// A candidate file could not be read or stat-ed.
    #[error(transparent)]
    Scan(#[from] ScanError),
}
