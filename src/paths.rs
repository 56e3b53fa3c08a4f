//! Pure path algebra
//!
//! Decomposition and recombination of paths without touching the filesystem.
//! Nothing here implies that a path exists.
//!
//! The central operation is [`combine_paths`], which grafts a recorded path
//! onto a new parent. A relative recorded path is simply joined. A root path
//! (absolute, or separator-prefixed without a drive) would otherwise replace
//! the parent entirely, so its leading segments that positionally match the
//! parent's leading segments are elided first:
//!
//! ```rust
//! use std::path::{Path, PathBuf};
//! use treemirror::paths::combine_paths;
//!
//! # #[cfg(unix)]
//! # {
//! let parent = Path::new("/Users/steve/Documents/merges");
//! let append = Path::new("/Users/steve/Documents/spreadsheets/Expenses1");
//! assert_eq!(
//!     combine_paths(parent, append),
//!     PathBuf::from("/Users/steve/Documents/merges/spreadsheets/Expenses1")
//! );
//! # }
//! ```

use std::path::{Component, Path, PathBuf};

/// Last segment of `path`, or an empty string if there is none
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Everything but the last segment of `path`, or an empty string if there is
/// no parent
pub fn dirname(path: &Path) -> String {
    path.parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether `path` is anchored at a root
///
/// True for absolute paths, and also for paths that begin with a separator
/// but carry no drive or device prefix (`\Users\steve` on Windows). On Unix
/// the two notions coincide.
pub fn is_root_path(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    path.is_absolute() || path.has_root()
}

/// Name segments of `path`, excluding any prefix or root component
pub fn segments(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect()
}

/// Lexically normalize `path`
///
/// Drops `.` segments and cancels each `..` against the preceding name.
/// A `..` directly under the root is dropped; leading `..` segments of a
/// relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Combine `append` onto `parent`
///
/// If `append` is not a root path the result is `parent/append`, normalized.
///
/// If `append` is a root path, count how many of its leading segments equal
/// `parent`'s segments at the same index, stopping at the first mismatch and
/// never counting more than `min(len(parent), len(append) - 1)`. Those
/// segments are elided and the rest of `append` is joined onto `parent`. The
/// scan is positional: a mismatch ends it even if a later segment would have
/// matched.
///
/// At least the final segment of `append` is always appended, so the result
/// never equals `parent`. In particular `combine_paths(p, p)` is `p` with its
/// own last segment repeated.
///
/// # Panics
///
/// Panics if `append` has no name segments (empty, `/`, `.`). Callers must
/// not pass such paths.
pub fn combine_paths(parent: &Path, append: &Path) -> PathBuf {
    let append_parts = segments(append);
    assert!(
        !append_parts.is_empty(),
        "cannot combine an empty path onto {:?}",
        parent
    );

    if !is_root_path(append) {
        return normalize(&parent.join(append));
    }

    let parent_parts = segments(parent);
    let max_common = parent_parts.len().min(append_parts.len() - 1);
    let common = parent_parts
        .iter()
        .zip(&append_parts)
        .take(max_common)
        .take_while(|(p, a)| p == a)
        .count();

    let mut combined = parent.to_path_buf();
    combined.extend(&append_parts[common..]);
    normalize(&combined)
}

/// [`combine_paths`] with `append` given as a string
///
/// # Panics
///
/// Panics under the same conditions as [`combine_paths`].
pub fn combine_paths_str(parent: &Path, append: &str) -> PathBuf {
    combine_paths(parent, Path::new(append))
}
