//! Mirror construction
//!
//! A mirror reproduces the shape of a source tree with no real content:
//! every directory is recreated (empty ones included) and every file becomes
//! a marker whose bytes are that file's path relative to the source root.
//!
//! ## Preconditions
//!
//! Checked before anything is written:
//! - the source is an existing, listable directory
//! - the destination does not exist, or is an empty directory
//! - the destination is not inside the source
//!
//! Violations are argument errors and leave the filesystem untouched.
//!
//! ## Failure policy
//!
//! Once the checks pass, every entry that cannot be created (and every
//! source directory that cannot be listed) is logged and counted in
//! [`MirrorReport::errors`]. Partial mirrors are not rolled back.
//!
//! ```rust,no_run
//! use treemirror::create_mirror;
//!
//! # fn main() -> treemirror::Result<()> {
//! let report = create_mirror("./photos", "./photos-mirror")?;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{MirrorError, Result};
use crate::marker;
use crate::types::MirrorReport;
use crate::utils;
use crate::walker::{TreeVisitor, TreeWalker};

/// Builds mirrors of directory trees
#[derive(Debug, Clone, Default)]
pub struct MirrorBuilder {
    config: EngineConfig,
}

impl MirrorBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` for traversal sizing
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Mirror `source` into `dest`
    ///
    /// # Errors
    ///
    /// - [`MirrorError::UnreadableDirectory`] if `source` is not a listable directory
    /// - [`MirrorError::DestinationNotEmpty`] if `dest` exists with contents or as a file
    /// - [`MirrorError::BadArguments`] if `dest` lies inside `source`
    /// - [`MirrorError::InvalidConfiguration`] if the configuration is invalid
    /// - [`MirrorError::Io`] if `dest` itself cannot be created
    ///
    /// Failures on individual entries are not errors; they are counted in the
    /// returned report.
    pub fn create(&self, source: &Path, dest: &Path) -> Result<MirrorReport> {
        self.config.validate()?;
        let source = utils::readable_directory(source).inspect_err(|_| {
            warn!("{:?} does not name a readable directory", source);
        })?;
        utils::check_clean_directory(dest).inspect_err(|_| {
            warn!("{:?} is not usable as an empty destination", dest);
        })?;
        if is_nested(dest, &source)? {
            return Err(MirrorError::bad_arguments(format!(
                "destination {:?} lies inside source {:?}",
                dest, source
            )));
        }

        let start = Instant::now();
        let mut visitor = MirrorVisitor {
            source: &source,
            dest,
            report: MirrorReport::default(),
        };
        if utils::clean_directory(dest)? {
            debug!("Created destination {:?}", dest);
        }

        let mut walker = TreeWalker::with_capacity(&source, self.config.dirs_hint);
        let summary = walker.walk(&mut visitor);

        let mut report = visitor.report;
        report.errors += summary.descend_errors;
        info!(
            "Mirrored {:?} to {:?}: {} files, {} directories, {} errors in {:?}",
            source,
            dest,
            report.files_written,
            report.directories_created,
            report.errors,
            start.elapsed()
        );
        Ok(report)
    }
}

/// Mirror `source` into `dest` with default configuration
///
/// See [`MirrorBuilder::create`].
pub fn create_mirror(source: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<MirrorReport> {
    MirrorBuilder::new().create(source.as_ref(), dest.as_ref())
}

/// Whether `inner` is `outer` or lies below it, compared as absolute paths
fn is_nested(inner: &Path, outer: &Path) -> Result<bool> {
    let inner = crate::paths::normalize(&std::path::absolute(inner)?);
    let outer = crate::paths::normalize(&std::path::absolute(outer)?);
    Ok(inner.starts_with(&outer))
}

struct MirrorVisitor<'a> {
    source: &'a Path,
    dest: &'a Path,
    report: MirrorReport,
}

impl MirrorVisitor<'_> {
    fn destination_for(&self, path: &Path) -> Option<(PathBuf, PathBuf)> {
        match utils::make_relative(path, self.source) {
            Ok(relative) => Some((self.dest.join(&relative), relative)),
            Err(e) => {
                warn!("Unable to relate {:?} to {:?}: {}", path, self.source, e);
                None
            }
        }
    }
}

impl TreeVisitor for MirrorVisitor<'_> {
    fn visit_dir(&mut self, dir: &Path) -> ControlFlow<()> {
        let Some((target, _)) = self.destination_for(dir) else {
            self.report.errors += 1;
            return ControlFlow::Continue(());
        };
        match fs::create_dir_all(&target) {
            Ok(()) => self.report.directories_created += 1,
            Err(e) => {
                warn!("Unable to create directory {:?}: {}", target, e);
                self.report.errors += 1;
            }
        }
        ControlFlow::Continue(())
    }

    fn visit_file(&mut self, file: &Path) -> ControlFlow<()> {
        let Some((target, relative)) = self.destination_for(file) else {
            self.report.errors += 1;
            return ControlFlow::Continue(());
        };
        match marker::write_marker(&target, &relative) {
            Ok(()) => self.report.files_written += 1,
            Err(e) => {
                warn!("Unable to create file {:?}: {}", target, e);
                self.report.errors += 1;
            }
        }
        ControlFlow::Continue(())
    }
}
