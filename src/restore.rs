//! Content-driven restoration
//!
//! A restore reads every marker under a source directory and moves the file
//! back to the path it records, grafted onto a target root with
//! [`combine_paths`](crate::paths::combine_paths). The target defaults to the
//! source itself, which undoes a flatten in place.
//!
//! ## Per-file outcomes
//!
//! | Marker content | Destination | Outcome |
//! |---|---|---|
//! | starts with the ignore prefix | - | skipped, counted as ignored |
//! | empty, or no name segment (`/`, `..`) | - | counted as an error |
//! | a path | is this very file | nothing to do |
//! | a path | occupied by another file | left in place, counted as a conflict |
//! | a path | free | ancestors created, file moved |
//!
//! "This very file" is decided by filesystem identity, so a symbolic link
//! that already resolves to the destination counts as restored. Moves fall
//! back to copy and delete when the target is on another filesystem.
//!
//! Restoration is best-effort. Read failures, failed moves and unlistable
//! directories are logged and counted in the [`RestoreReport`]; the pass
//! always runs to the end, then removes every directory below the source
//! root that it emptied.

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::config::EngineConfig;
use crate::error::{MirrorError, Result};
use crate::marker::{self, Marker};
use crate::paths::{combine_paths, normalize};
use crate::types::RestoreReport;
use crate::utils;
use crate::walker::{TreeVisitor, TreeWalker};

/// What happened to a single marker file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Moved to the contained path
    Restored(PathBuf),
    /// Already at the contained path
    InPlace,
    /// Legacy content, skipped
    Ignored,
    /// Destination held by a different file
    Conflict(PathBuf),
}

/// Moves marker files back to their recorded locations
#[derive(Debug, Clone)]
pub struct Restorer {
    source: PathBuf,
    target: Option<PathBuf>,
    config: EngineConfig,
}

impl Restorer {
    /// Restore the markers found under `source` into `source` itself
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: None,
            config: EngineConfig::default(),
        }
    }

    /// Restore into `target` instead of the source directory
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Use `config` for sizing and the ignore prefix
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory restored files are moved under
    pub fn target(&self) -> &Path {
        self.target.as_deref().unwrap_or(&self.source)
    }

    /// Run the restore
    ///
    /// # Errors
    ///
    /// - [`MirrorError::UnreadableDirectory`] if the source is not a
    ///   listable directory
    /// - [`MirrorError::InvalidRewriteTarget`] if the target cannot be
    ///   created
    /// - [`MirrorError::InvalidConfiguration`] if the configuration is invalid
    ///
    /// Per-file problems are not errors; see [`RestoreReport::status_code`].
    ///
    /// Recorded paths are trusted. One that climbs with `..` can place a file
    /// outside the target; such moves are carried out and logged as warnings.
    pub fn restore(&self) -> Result<RestoreReport> {
        self.config.validate()?;
        let target = utils::creatable_directory(self.target())?;
        let source = utils::readable_directory(&self.source).inspect_err(|_| {
            warn!("{:?} does not name a readable directory", self.source);
        })?;
        if let Err(e) = fs::create_dir_all(&target) {
            warn!("Could not create directory {:?}: {}", target, e);
            return Err(MirrorError::InvalidRewriteTarget(target));
        }

        let start = Instant::now();
        let mut collector = FileCollector {
            files: Vec::with_capacity(self.config.files_hint),
        };
        let mut walker = TreeWalker::with_capacity(&source, self.config.dirs_hint);
        let summary = walker.walk(&mut collector);

        let mut report = RestoreReport {
            descend_errors: summary.descend_errors,
            ..Default::default()
        };
        for file in &collector.files {
            match self.restore_file(file, &target) {
                Ok(FileOutcome::Restored(dest)) => {
                    trace!("Restored {:?} to {:?}", file, dest);
                    report.files_restored += 1;
                }
                Ok(FileOutcome::InPlace) => report.already_in_place += 1,
                Ok(FileOutcome::Ignored) => report.ignored += 1,
                Ok(FileOutcome::Conflict(_)) => report.conflicts += 1,
                Err(e) => {
                    warn!("I/O error restoring {:?}: {}", file, e);
                    report.errors += 1;
                }
            }
        }
        report.directories_removed = walker.remove_empty_dirs();

        info!(
            "Restored {} files from {:?} into {:?} in {}",
            report.files_restored,
            source,
            target,
            humantime::format_duration(start.elapsed())
        );
        if !report.is_clean() {
            warn!(
                "{} conflicts, {} errors, {} unreadable directories",
                report.conflicts, report.errors, report.descend_errors
            );
        }
        Ok(report)
    }

    /// Restore one marker file into `target`
    pub fn restore_file(&self, file: &Path, target: &Path) -> Result<FileOutcome> {
        let content = marker::read_content(file)?;
        let recorded = match Marker::parse_with(&content, &self.config.ignore_prefix) {
            Marker::Ignore => {
                info!("Ignoring {:?}", file);
                return Ok(FileOutcome::Ignored);
            }
            Marker::Empty => {
                return Err(MirrorError::bad_arguments(format!(
                    "{:?} records no path",
                    file
                )));
            }
            Marker::Path(recorded) => recorded,
        };

        let dest = combine_paths(target, &recorded);
        if !dest.starts_with(normalize(target)) {
            warn!(
                "{:?} records {:?}, which lies outside {:?}",
                file, recorded, target
            );
        }
        if utils::is_same_file(file, &dest)? {
            debug!("Nothing to be done to {:?}", file);
            return Ok(FileOutcome::InPlace);
        }
        if fs::symlink_metadata(&dest).is_ok() {
            warn!("Already exists: {:?}", dest);
            return Ok(FileOutcome::Conflict(dest));
        }
        let Some(parent) = dest.parent() else {
            return Err(MirrorError::bad_arguments(format!(
                "unable to find parent of {:?}",
                dest
            )));
        };
        fs::create_dir_all(parent)?;
        utils::move_file(file, &dest)?;
        Ok(FileOutcome::Restored(dest))
    }
}

/// Restore the markers under `source` into `target`, or into `source` when
/// no target is given
///
/// See [`Restorer::restore`].
pub fn restore(source: impl AsRef<Path>, target: Option<&Path>) -> Result<RestoreReport> {
    let mut restorer = Restorer::new(source.as_ref());
    if let Some(target) = target {
        restorer = restorer.with_target(target);
    }
    restorer.restore()
}

struct FileCollector {
    files: Vec<PathBuf>,
}

impl TreeVisitor for FileCollector {
    fn visit_file(&mut self, file: &Path) -> ControlFlow<()> {
        self.files.push(file.to_path_buf());
        ControlFlow::Continue(())
    }
}
