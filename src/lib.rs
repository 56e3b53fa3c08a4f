//! # Treemirror - Content-free mirrors of directory trees
//!
//! A library for building stand-in copies of directory trees that can be
//! reorganized freely and then put back together.
//!
//! ## Overview
//!
//! Treemirror replaces every file of a tree with a tiny marker file whose
//! only content is that file's original relative path. The result, a
//! *mirror*, has exactly the shape of the original but none of its bytes.
//! You can then:
//! - Hand the mirror to a tool that moves and renames files, instead of the
//!   real (large, slow or sensitive) tree
//! - Report which markers were moved or renamed, and from where
//! - Restore every marker to its recorded location, in place or elsewhere
//! - Verify that two trees have the same shape
//!
//! ## Architecture
//!
//! - **Path algebra** ([`paths`]): pure path decomposition and the
//!   prefix-eliding [`combine_paths`] used to graft a recorded path onto a new
//!   root
//! - **Tree walker** ([`walker`]): an explicit-queue traversal shared by all
//!   engines, so tree depth never touches the call stack
//! - **Engines**: [`mirror`], [`flatten`], [`restore`] and [`report`], each a
//!   [`walker::TreeVisitor`] driven by the walker
//! - **Comparator** ([`verify`]): an independent, `walkdir`-based structural
//!   comparison used as the test oracle for everything else
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use treemirror::{create_mirror, flatten, restore, verify_mirror};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Build a mirror of a tree
//! let report = create_mirror("./music", "./music-mirror")?;
//! println!("Wrote {} markers", report.files_written);
//!
//! // Scramble it the way an external tool might
//! flatten("dummy", "./music-mirror")?;
//! assert!(!verify_mirror("./music", "./music-mirror"));
//!
//! // Put every marker back where it came from
//! let restored = restore("./music-mirror", None)?;
//! assert!(restored.is_clean());
//! assert!(verify_mirror("./music", "./music-mirror"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust,no_run
//! use treemirror::{EngineConfig, MirrorBuilder, Restorer};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::new()
//!     .with_files_hint(100_000) // Pre-size work lists for a big tree
//!     .with_dirs_hint(5_000);
//!
//! MirrorBuilder::new()
//!     .with_config(config.clone())
//!     .create(Path::new("./archive"), Path::new("./archive-mirror"))?;
//!
//! let report = Restorer::new("./archive-mirror")
//!     .with_target("./restored")
//!     .with_config(config)
//!     .restore()?;
//! println!("{} restored, {} conflicts", report.files_restored, report.conflicts);
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! ### Markers
//!
//! A marker's bytes are its relative path in ISO-8859-1, trimmed on read.
//! Content starting with `content` belongs to an older generator and is
//! skipped. See [`marker`].
//!
//! ### Failure policies
//!
//! - Mirror and restore are best-effort: per-entry failures are logged,
//!   counted in the returned report, and the pass continues
//! - Flatten is fail-fast: the first file that cannot be moved aborts it
//! - Invalid arguments are rejected before anything on disk changes
//!
//! Restore never overwrites. A destination held by another file is a
//! conflict, counted and logged, and the marker stays where it is.
//!
//! ## Logging
//!
//! The library reports through `tracing` and never prints. Install any
//! subscriber to see per-file detail; the `treemirror` binary installs a
//! `tracing-subscriber` formatter controlled by `RUST_LOG`.
//!
//! ## Error Handling
//!
//! All operations return `Result<T, MirrorError>`. Every error maps to a
//! process exit status with [`MirrorError::status_code`]; per-file problems
//! are not errors and are reflected in the report's own `status_code`.
//!
//! ## Module Organization
//!
//! - [`paths`]: path algebra
//! - [`walker`]: iterative traversal
//! - [`marker`]: marker file format
//! - [`mirror`], [`flatten`], [`restore`]: the engines
//! - [`verify`]: structural comparison
//! - [`report`]: moved/renamed classification and rendering
//! - [`config`]: shared engine configuration
//! - [`types`]: result records and status codes
//! - [`error`]: error types and handling

// Public API modules
pub mod config;
pub mod error;
pub mod flatten;
pub mod marker;
pub mod mirror;
pub mod paths;
pub mod report;
pub mod restore;
pub mod types;
pub mod verify;
pub mod walker;

// Internal modules (not part of public API)
mod utils;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use error::{MirrorError, Result};
pub use flatten::{flatten, CollisionCounter, Flattener};
pub use mirror::{create_mirror, MirrorBuilder};
pub use paths::{combine_paths, combine_paths_str};
pub use report::{make_file_report, FileReport, ReportSet};
pub use restore::{restore, Restorer};
pub use types::*;
pub use verify::{verify_mirror, Divergence, DivergenceKind, TreeComparator};
