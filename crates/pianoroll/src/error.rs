//! Fatal conversion errors.
//!
//! Anything in here aborts the whole document. Recoverable problems are
//! reported through [`crate::feedback`] instead.

use std::path::PathBuf;

/// Errors that abort a document conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("chord marker in part {part:?} must come before the note's duration")]
    ChordAfterDuration { part: String },

    #[error("{context} in part {part:?} has no duration")]
    MissingDuration {
        context: &'static str,
        part: String,
    },

    #[error("wedge stop at step {step} in part {part:?} has no matching start")]
    UnbalancedWedge { part: String, step: i64 },

    #[error("divisions not set in part {part:?} before a time conversion")]
    DivisionsUnknown { part: String },

    #[error("time in part {part:?} left the representable range")]
    TimeOverflow { part: String },

    #[error("invalid integer {text:?} in <{element}>")]
    InvalidNumber { element: String, text: String },

    #[error("part {id:?} ended but no part-name was declared for it")]
    UnnamedPart { id: String },

    #[error("smoother returned {actual} steps, expected {expected}")]
    SmootherLength { expected: usize, actual: usize },

    #[error("document ended inside part {part:?}")]
    Truncated { part: String },

    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Invalid(#[from] Error),
}
