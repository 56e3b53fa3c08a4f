//! Iterative directory traversal
//!
//! [`TreeWalker`] drives every engine that needs to see a whole tree. Pending
//! directories live in an explicit double-ended queue rather than on the call
//! stack, so depth is limited only by memory.
//!
//! For each directory popped from the queue the walker lists its immediate
//! children, sorted by name, then hands regular files to the
//! [`TreeVisitor`] and pushes subdirectories to the front of the queue. The
//! result is a depth-first, name-ordered walk in which a directory's files are
//! visited before anything below it.
//!
//! Every directory popped is recorded. Because a child is always discovered
//! after its parent, replaying that record backwards ([`TreeWalker::deepest_first`])
//! visits children before parents, which is what empty-directory cleanup
//! needs.
//!
//! A directory that cannot be listed is logged and counted, and the walk
//! carries on with the rest of the queue unless the visitor asks to stop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::ops::ControlFlow;
//! use std::path::Path;
//! use treemirror::walker::{TreeVisitor, TreeWalker};
//!
//! struct Count(usize);
//!
//! impl TreeVisitor for Count {
//!     fn visit_file(&mut self, _file: &Path) -> ControlFlow<()> {
//!         self.0 += 1;
//!         ControlFlow::Continue(())
//!     }
//! }
//!
//! let mut walker = TreeWalker::new("./some/tree");
//! let mut count = Count(0);
//! let summary = walker.walk(&mut count);
//! println!("{} files, {} unreadable directories", count.0, summary.descend_errors);
//! ```

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::utils;

/// Per-entry callbacks for a [`TreeWalker`]
///
/// Returning `ControlFlow::Break(())` from any callback ends the walk.
pub trait TreeVisitor {
    /// Called for each directory, the root included, before it is listed
    fn visit_dir(&mut self, _dir: &Path) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called for each entry that is not a directory
    fn visit_file(&mut self, file: &Path) -> ControlFlow<()>;

    /// Called when a directory cannot be listed
    ///
    /// The failure has already been logged and counted. The default keeps
    /// walking.
    fn descend_failed(&mut self, _dir: &Path, _error: &io::Error) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Counters from one walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSummary {
    /// Directories popped from the queue, the root included
    pub directories: usize,
    /// Non-directory entries handed to the visitor
    pub files: usize,
    /// Directories that could not be listed
    pub descend_errors: usize,
    /// Whether the visitor ended the walk early
    pub stopped: bool,
}

/// Explicit-queue directory walker
#[derive(Debug)]
pub struct TreeWalker {
    root: PathBuf,
    pending: VecDeque<PathBuf>,
    visited: Vec<PathBuf>,
}

impl TreeWalker {
    /// Create a walker rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_capacity(root, 0)
    }

    /// Create a walker whose work lists are sized for about `dirs` directories
    pub fn with_capacity(root: impl Into<PathBuf>, dirs: usize) -> Self {
        Self {
            root: root.into(),
            pending: VecDeque::with_capacity(dirs),
            visited: Vec::with_capacity(dirs),
        }
    }

    /// Root of the walk
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the whole tree, feeding `visitor`
    ///
    /// Calling `walk` again starts over and forgets the previous record of
    /// visited directories.
    pub fn walk<V: TreeVisitor + ?Sized>(&mut self, visitor: &mut V) -> WalkSummary {
        let mut summary = WalkSummary::default();
        self.pending.clear();
        self.visited.clear();
        self.pending.push_front(self.root.clone());

        'queue: while let Some(dir) = self.pending.pop_front() {
            summary.directories += 1;
            self.visited.push(dir.clone());

            if visitor.visit_dir(&dir).is_break() {
                summary.stopped = true;
                break;
            }

            let children = match list_children(&dir) {
                Ok(children) => children,
                Err(e) => {
                    warn!("I/O error descending {:?}: {}", dir, e);
                    summary.descend_errors += 1;
                    if visitor.descend_failed(&dir, &e).is_break() {
                        summary.stopped = true;
                        break;
                    }
                    continue;
                }
            };

            let mut subdirs = Vec::new();
            for (path, is_dir) in children {
                if is_dir {
                    subdirs.push(path);
                    continue;
                }
                summary.files += 1;
                if visitor.visit_file(&path).is_break() {
                    summary.stopped = true;
                    break 'queue;
                }
            }
            // Pushed in reverse so the first name is popped first
            for subdir in subdirs.into_iter().rev() {
                self.pending.push_front(subdir);
            }
        }

        trace!(
            "Walked {:?}: {} directories, {} files, {} errors",
            self.root,
            summary.directories,
            summary.files,
            summary.descend_errors
        );
        summary
    }

    /// Directories visited by the last walk, in discovery order
    pub fn visited_dirs(&self) -> &[PathBuf] {
        &self.visited
    }

    /// Directories visited by the last walk, children before parents
    pub fn deepest_first(&self) -> impl Iterator<Item = &Path> {
        self.visited.iter().rev().map(PathBuf::as_path)
    }

    /// Remove every visited directory below the root that is now empty
    ///
    /// Runs deepest first, so a chain of directories that only contained
    /// each other disappears entirely. The root itself is kept. Failures are
    /// logged and skipped. Returns the number of directories removed.
    pub fn remove_empty_dirs(&self) -> usize {
        let mut removed = 0;
        for dir in self.deepest_first().filter(|dir| *dir != self.root) {
            match utils::remove_dir_if_empty(dir) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!("Unable to remove directory {:?}: {}", dir, e),
            }
        }
        removed
    }
}

/// Immediate children of `dir` as `(path, is_dir)`, sorted by file name
///
/// Symbolic links are not followed, so a link to a directory counts as a
/// file.
fn list_children(dir: &Path) -> io::Result<Vec<(PathBuf, bool)>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_dir = entry.file_type()?.is_dir();
        children.push((entry.path(), is_dir));
    }
    children.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
    Ok(children)
}
