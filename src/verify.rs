//! Structural tree comparison
//!
//! Two trees are structurally equivalent when every level holds the same
//! names with the same kinds: directories against directories (empty ones
//! included), regular files against regular files. File contents are never
//! read. The names of the two roots do not matter.
//!
//! The comparator is the oracle the rest of the crate is tested against, so
//! it shares no code with the engines: it walks both trees with `walkdir`,
//! sorted by file name and following symbolic links, and compares the two
//! pre-order sequences entry by entry. Equal trees produce equal sequences;
//! the first unequal pair locates the difference.
//!
//! ```rust,no_run
//! use treemirror::verify::TreeComparator;
//!
//! match TreeComparator::new().first_divergence("./photos", "./photos-mirror") {
//!     None => println!("same shape"),
//!     Some(divergence) => println!("differs: {}", divergence),
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Why two trees differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergenceKind {
    /// The entry exists only in the right-hand tree
    MissingLeft,
    /// The entry exists only in the left-hand tree
    MissingRight,
    /// The two trees hold differently named entries at the same position
    NameMismatch,
    /// One side is a directory or special file where the other is not
    KindMismatch,
    /// A directory could not be listed, or an entry could not be examined
    Unreadable,
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DivergenceKind::MissingLeft => "missing on the left",
            DivergenceKind::MissingRight => "missing on the right",
            DivergenceKind::NameMismatch => "names differ",
            DivergenceKind::KindMismatch => "kinds differ",
            DivergenceKind::Unreadable => "unreadable",
        };
        f.write_str(text)
    }
}

/// First point at which two trees differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    /// Path of the offending entry, relative to the root of the tree it was
    /// found in; empty for the roots themselves
    pub path: PathBuf,
    /// What is wrong there
    pub kind: DivergenceKind,
}

impl Divergence {
    fn new(path: impl Into<PathBuf>, kind: DivergenceKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.as_os_str().is_empty() {
            write!(f, "root: {}", self.kind)
        } else {
            write!(f, "{}: {}", self.path.display(), self.kind)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
    Other,
}

impl EntryKind {
    fn of(entry: &DirEntry) -> Self {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// Decides whether two trees have the same shape
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeComparator;

impl TreeComparator {
    /// Create a comparator
    pub fn new() -> Self {
        Self
    }

    /// Whether `a` and `b` are structurally equivalent
    pub fn verify(&self, a: impl AsRef<Path>, b: impl AsRef<Path>) -> bool {
        self.first_divergence(a, b).is_none()
    }

    /// The first difference between `a` and `b`, in sorted pre-order, or
    /// `None` if they are structurally equivalent
    ///
    /// A regular file (or a link to one) as `a` only requires `b` to be a
    /// regular file too. Otherwise both must be listable directories. Any
    /// failure to examine an entry counts as a difference.
    pub fn first_divergence(&self, a: impl AsRef<Path>, b: impl AsRef<Path>) -> Option<Divergence> {
        let (a, b) = (a.as_ref(), b.as_ref());
        let divergence = compare_roots(a, b).or_else(|| compare_walks(a, b));
        if let Some(divergence) = &divergence {
            debug!("{:?} and {:?} differ at {}", a, b, divergence);
        }
        divergence
    }
}

/// Whether `a` and `b` are structurally equivalent
///
/// See [`TreeComparator::verify`].
pub fn verify_mirror(a: impl AsRef<Path>, b: impl AsRef<Path>) -> bool {
    TreeComparator::new().verify(a, b)
}

/// Compare the roots themselves
///
/// `None` means both are listable directories, or both are regular files.
fn compare_roots(a: &Path, b: &Path) -> Option<Divergence> {
    let (Ok(meta_a), Ok(meta_b)) = (fs::metadata(a), fs::metadata(b)) else {
        return Some(Divergence::new(PathBuf::new(), DivergenceKind::Unreadable));
    };
    if meta_a.is_file() {
        return (!meta_b.is_file())
            .then(|| Divergence::new(PathBuf::new(), DivergenceKind::KindMismatch));
    }
    if !meta_a.is_dir() || !meta_b.is_dir() {
        return Some(Divergence::new(PathBuf::new(), DivergenceKind::KindMismatch));
    }
    for dir in [a, b] {
        if let Err(e) = fs::read_dir(dir) {
            warn!("Exception trying to list directory {:?}: {}", dir, e);
            return Some(Divergence::new(PathBuf::new(), DivergenceKind::Unreadable));
        }
    }
    None
}

/// Compare everything below two roots that passed [`compare_roots`]
fn compare_walks(a: &Path, b: &Path) -> Option<Divergence> {
    if !a.is_dir() {
        return None;
    }
    let walk = |root: &Path| {
        WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
    };
    let relative = |root: &Path, path: &Path| path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let (mut left, mut right) = (walk(a), walk(b));

    loop {
        let (x, y) = match (left.next(), right.next()) {
            (None, None) => return None,
            (Some(Err(e)), _) => {
                warn!("Unable to examine {:?}: {}", e.path(), e);
                let path = e.path().map(|p| relative(a, p)).unwrap_or_default();
                return Some(Divergence::new(path, DivergenceKind::Unreadable));
            }
            (_, Some(Err(e))) => {
                warn!("Unable to examine {:?}: {}", e.path(), e);
                let path = e.path().map(|p| relative(b, p)).unwrap_or_default();
                return Some(Divergence::new(path, DivergenceKind::Unreadable));
            }
            (Some(Ok(x)), None) => {
                return Some(Divergence::new(relative(a, x.path()), DivergenceKind::MissingRight));
            }
            (None, Some(Ok(y))) => {
                return Some(Divergence::new(relative(b, y.path()), DivergenceKind::MissingLeft));
            }
            (Some(Ok(x)), Some(Ok(y))) => (x, y),
        };

        // The deeper entry has no counterpart: the other walk already moved on
        if x.depth() > y.depth() {
            return Some(Divergence::new(relative(a, x.path()), DivergenceKind::MissingRight));
        }
        if x.depth() < y.depth() {
            return Some(Divergence::new(relative(b, y.path()), DivergenceKind::MissingLeft));
        }
        if x.file_name() != y.file_name() {
            return Some(Divergence::new(relative(a, x.path()), DivergenceKind::NameMismatch));
        }
        let (kind_x, kind_y) = (EntryKind::of(&x), EntryKind::of(&y));
        if kind_x != kind_y || kind_x == EntryKind::Other {
            return Some(Divergence::new(relative(a, x.path()), DivergenceKind::KindMismatch));
        }
    }
}
