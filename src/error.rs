//! Error types for the treemirror library
//!
//! Every fallible operation returns [`Result<T>`], whose error side is
//! [`MirrorError`]. Errors fall into four groups:
//!
//! - **Argument errors** are detected before anything on disk is touched
//!   (missing source, populated destination, unusable restore target).
//! - **Traversal errors** come from listing a directory or moving a file.
//!   Most components count these and keep going; the flattener aborts.
//! - **Conflicts** (a restore destination already occupied) are never
//!   errors at this level; they are counted in the operation's report.
//! - **Contract violations** such as combining an empty path panic instead
//!   of producing a `MirrorError`.
//!
//! Each variant maps onto one of the process exit codes in
//! [`crate::types::status`] through [`MirrorError::status_code`].

use std::path::PathBuf;
use thiserror::Error;

use crate::types::status;

/// Type alias for Results in the treemirror library
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Main error type for all treemirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors while serializing reports
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Malformed or missing arguments
    #[error("Bad arguments: {0}")]
    BadArguments(String),

    /// Source path is missing, not a directory, or unreadable
    #[error("Not a readable directory: {0:?}")]
    UnreadableDirectory(PathBuf),

    /// Mirror destination exists and already has contents
    #[error("Destination is not empty: {0:?}")]
    DestinationNotEmpty(PathBuf),

    /// Path is not an existing, writable directory
    #[error("Not a writable directory: {0:?}")]
    NotWritableDirectory(PathBuf),

    /// Restore target cannot be created
    #[error("Invalid rewrite target: {0:?}")]
    InvalidRewriteTarget(PathBuf),

    /// A file could not be moved; aborts a flatten
    #[error("Unable to move {from:?} to {to:?}: {source}")]
    MoveFailed {
        /// File being moved
        from: PathBuf,
        /// Intended destination
        to: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be listed
    #[error("Unable to descend into {path:?}: {source}")]
    DescendFailed {
        /// Directory that failed to list
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl MirrorError {
    /// Create a bad-arguments error with a custom message
    pub fn bad_arguments(msg: impl Into<String>) -> Self {
        MirrorError::BadArguments(msg.into())
    }

    /// Create a configuration error with a custom message
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        MirrorError::InvalidConfiguration(msg.into())
    }

    /// Check if this error was raised before any filesystem mutation
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            MirrorError::BadArguments(_)
                | MirrorError::UnreadableDirectory(_)
                | MirrorError::DestinationNotEmpty(_)
                | MirrorError::NotWritableDirectory(_)
                | MirrorError::InvalidRewriteTarget(_)
                | MirrorError::InvalidConfiguration(_)
        )
    }

    /// Exit status a launcher should report for this error
    pub fn status_code(&self) -> i32 {
        match self {
            MirrorError::InvalidRewriteTarget(_) => status::REWRITE_PATH_INVALID,
            MirrorError::DescendFailed { .. } | MirrorError::WalkDir(_) => {
                status::EXCEPTION_DESCENDING
            }
            MirrorError::MoveFailed { .. } => status::FLATTEN_FAILED,
            MirrorError::Io(_) | MirrorError::Json(_) => status::EXCEPTION_RESTORING,
            MirrorError::BadArguments(_)
            | MirrorError::UnreadableDirectory(_)
            | MirrorError::DestinationNotEmpty(_)
            | MirrorError::NotWritableDirectory(_)
            | MirrorError::InvalidConfiguration(_) => status::BAD_ARGUMENTS,
        }
    }
}
