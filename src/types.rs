//! Result records and status codes shared across the library
//!
//! Each top-level operation returns a small serializable summary of what it
//! did. The summaries are plain data: the launcher decides how to render them
//! and which exit status to report.
//!
//! ## Examples
//!
//! ```rust
//! use treemirror::types::{status, RestoreReport};
//!
//! let report = RestoreReport::default();
//! assert_eq!(report.status_code(), status::SUCCESS);
//! ```

use serde::{Deserialize, Serialize};

/// Process exit statuses
///
/// Zero always means full success; every failure is a small negative number.
pub mod status {
    /// Full success
    pub const SUCCESS: i32 = 0;
    /// Missing or malformed paths, populated destination, missing source
    pub const BAD_ARGUMENTS: i32 = -65;
    /// Restore target cannot be created
    pub const REWRITE_PATH_INVALID: i32 = -66;
    /// At least one directory could not be listed
    pub const EXCEPTION_DESCENDING: i32 = -67;
    /// At least one file could not be restored
    pub const EXCEPTION_RESTORING: i32 = -68;
    /// Mirror finished but some entries could not be created
    pub const MIRROR_INCOMPLETE: i32 = -69;
    /// Flatten aborted
    pub const FLATTEN_FAILED: i32 = -70;
    /// Two trees are not structurally equivalent
    pub const TREES_DIFFER: i32 = -71;
    /// The requested application is not known
    pub const UNKNOWN_APP_SPECIFIED: i32 = -97;
    /// No application was requested
    pub const NO_APP_SPECIFIED: i32 = -98;
}

/// Outcome of building a mirror
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorReport {
    /// Marker files written
    pub files_written: usize,
    /// Directories created under the destination (the root included)
    pub directories_created: usize,
    /// Files or directories that could not be created or listed
    pub errors: usize,
}

impl MirrorReport {
    /// Whether every entry was mirrored
    pub fn is_complete(&self) -> bool {
        self.errors == 0
    }

    /// Exit status for this outcome
    pub fn status_code(&self) -> i32 {
        if self.is_complete() {
            status::SUCCESS
        } else {
            status::MIRROR_INCOMPLETE
        }
    }
}

/// Outcome of a successful flatten
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenReport {
    /// Files moved to the top of the tree
    pub files_moved: usize,
    /// Emptied subdirectories removed afterwards
    pub directories_removed: usize,
}

/// Outcome of a restore pass
///
/// A restore is best-effort: per-file problems are counted here rather than
/// aborting the pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Files moved back to their recorded location
    pub files_restored: usize,
    /// Files that were already at their recorded location
    pub already_in_place: usize,
    /// Files skipped because of the legacy ignore marker
    pub ignored: usize,
    /// Files left in place because a different file occupies the destination
    pub conflicts: usize,
    /// Files that could not be read or moved
    pub errors: usize,
    /// Directories that could not be listed
    pub descend_errors: usize,
    /// Emptied directories removed afterwards
    pub directories_removed: usize,
}

impl RestoreReport {
    /// Per-file problems: I/O errors plus conflicts
    pub fn error_count(&self) -> usize {
        self.errors + self.conflicts
    }

    /// Whether the pass finished without any problem
    pub fn is_clean(&self) -> bool {
        self.error_count() == 0 && self.descend_errors == 0
    }

    /// Exit status for this outcome
    ///
    /// Per-file problems take precedence over listing failures.
    pub fn status_code(&self) -> i32 {
        if self.error_count() != 0 {
            status::EXCEPTION_RESTORING
        } else if self.descend_errors != 0 {
            status::EXCEPTION_DESCENDING
        } else {
            status::SUCCESS
        }
    }
}
