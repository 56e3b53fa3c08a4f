//! Tree flattening
//!
//! Flattening simulates an external tool that gathers files from all over a
//! tree and renames them: every file below a directory, at any depth, is
//! moved directly under that directory as `{base}{n}`. The emptied
//! subdirectories are then removed deepest first.
//!
//! Names come from a [`CollisionCounter`] that starts at 100 and is bumped
//! before every probe, so the first file becomes `dummy101`. Numbers whose
//! name is already taken are skipped. Each file's current path exists by
//! definition, so every file is renamed, top-level files included.
//!
//! Unlike the other engines, flattening is fail-fast. The first file that
//! cannot be moved, or the first directory that cannot be listed, ends the
//! operation with an error. Files moved before that point stay where they
//! were moved.

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{MirrorError, Result};
use crate::types::FlattenReport;
use crate::utils;
use crate::walker::{TreeVisitor, TreeWalker};

/// First value of a fresh counter; the first name handed out uses the next one
pub const COUNTER_START: u64 = 100;

/// Source of synthetic names for one flatten pass
#[derive(Debug, Clone)]
pub struct CollisionCounter {
    base_name: String,
    index: u64,
}

impl CollisionCounter {
    /// Start a counter for `base_name`
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            index: COUNTER_START,
        }
    }

    /// Last number handed out, or [`COUNTER_START`] if none has been
    pub fn current(&self) -> u64 {
        self.index
    }

    /// Advance and return the next candidate name
    pub fn next_name(&mut self) -> String {
        self.index += 1;
        format!("{}{}", self.base_name, self.index)
    }

    /// First path `dir/{base}{n}` that does not exist yet
    pub fn next_free(&mut self, dir: &Path) -> PathBuf {
        loop {
            let candidate = dir.join(self.next_name());
            if fs::symlink_metadata(&candidate).is_err() {
                return candidate;
            }
            debug!("{:?} is taken", candidate);
        }
    }
}

/// Moves every file of a tree to its top level under synthetic names
#[derive(Debug, Clone, Default)]
pub struct Flattener {
    config: EngineConfig,
}

impl Flattener {
    /// Create a flattener with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config`; its `flatten_base_name` is the default name stem
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Flatten `dir` using the configured base name
    pub fn run(&self, dir: &Path) -> Result<FlattenReport> {
        self.flatten(&self.config.flatten_base_name, dir)
    }

    /// Flatten `dir`, naming files `{base_name}101`, `{base_name}102`, ...
    ///
    /// # Errors
    ///
    /// - [`MirrorError::NotWritableDirectory`] if `dir` is not an existing
    ///   writable directory; nothing is touched
    /// - [`MirrorError::InvalidConfiguration`] if `base_name` is not a plain
    ///   file name
    /// - [`MirrorError::MoveFailed`] on the first file that cannot be moved
    /// - [`MirrorError::DescendFailed`] on the first directory that cannot be
    ///   listed
    pub fn flatten(&self, base_name: &str, dir: &Path) -> Result<FlattenReport> {
        self.config
            .clone()
            .with_flatten_base_name(base_name)
            .validate()?;
        if !utils::is_writable_directory(dir) {
            warn!("{:?} is not a writable directory", dir);
            return Err(MirrorError::NotWritableDirectory(dir.to_path_buf()));
        }

        let mut visitor = FlattenVisitor {
            root: dir,
            counter: CollisionCounter::new(base_name),
            moved: 0,
            failure: None,
        };
        let mut walker = TreeWalker::with_capacity(dir, self.config.dirs_hint);
        walker.walk(&mut visitor);
        if let Some(failure) = visitor.failure {
            return Err(failure);
        }

        let report = FlattenReport {
            files_moved: visitor.moved,
            directories_removed: walker.remove_empty_dirs(),
        };
        info!(
            "Flattened {:?}: {} files moved, {} directories removed",
            dir, report.files_moved, report.directories_removed
        );
        Ok(report)
    }
}

/// Flatten `dir` with default configuration
///
/// See [`Flattener::flatten`].
pub fn flatten(base_name: &str, dir: impl AsRef<Path>) -> Result<FlattenReport> {
    Flattener::new().flatten(base_name, dir.as_ref())
}

struct FlattenVisitor<'a> {
    root: &'a Path,
    counter: CollisionCounter,
    moved: usize,
    failure: Option<MirrorError>,
}

impl TreeVisitor for FlattenVisitor<'_> {
    fn visit_file(&mut self, file: &Path) -> ControlFlow<()> {
        let dest = self.counter.next_free(self.root);
        match fs::rename(file, &dest) {
            Ok(()) => {
                debug!("Moved {:?} to {:?}", file, dest);
                self.moved += 1;
                ControlFlow::Continue(())
            }
            Err(source) => {
                warn!("Unable to move {:?} to {:?}: {}", file, dest, source);
                self.failure = Some(MirrorError::MoveFailed {
                    from: file.to_path_buf(),
                    to: dest,
                    source,
                });
                ControlFlow::Break(())
            }
        }
    }

    fn descend_failed(&mut self, dir: &Path, error: &std::io::Error) -> ControlFlow<()> {
        self.failure = Some(MirrorError::DescendFailed {
            path: dir.to_path_buf(),
            source: std::io::Error::new(error.kind(), error.to_string()),
        });
        ControlFlow::Break(())
    }
}
