//! Filesystem helpers shared by the mirror, flatten and restore engines
//!
//! ## Categories of Utilities
//!
//! ### Directory checks
//! - [`readable_directory`]: an existing directory that can be listed
//! - [`is_writable_directory`]: an existing directory this process can create files in
//! - [`creatable_directory`]: a directory whose nearest existing ancestor is writable
//! - [`clean_directory`]: an empty directory, created if missing
//!
//! ### Moving and cleanup
//! - [`move_file`]: rename, falling back to copy and delete across filesystems
//! - [`remove_dir_if_empty`]
//!
//! ### Identity and paths
//! - [`is_same_file`]: filesystem identity rather than path equality
//! - [`make_relative`]
//!
//! None of these helpers log at a level above `debug`; callers decide how a
//! failed check is reported.

use crate::error::{MirrorError, Result};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Return `path` if it names an existing directory that can be listed
///
/// # Errors
///
/// - [`MirrorError::UnreadableDirectory`] if the path is missing, is not a
///   directory, or cannot be listed
pub fn readable_directory(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        debug!("{:?} is not an existing directory", path);
        return Err(MirrorError::UnreadableDirectory(path.to_path_buf()));
    }
    match fs::read_dir(path) {
        Ok(_) => Ok(path.to_path_buf()),
        Err(e) => {
            debug!("{:?} cannot be listed: {}", path, e);
            Err(MirrorError::UnreadableDirectory(path.to_path_buf()))
        }
    }
}

/// Whether `path` is an existing directory this process can create files in
///
/// Decided by creating and removing a scratch file, so ownership and ACLs
/// count and not only the permission bits. Falls back to the read-only bit
/// if the scratch name is somehow taken.
pub fn is_writable_directory(path: &Path) -> bool {
    let is_dir = fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        return false;
    }

    let scratch = path.join(format!(".treemirror-write-check-{}", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&scratch) {
        Ok(file) => {
            drop(file);
            if let Err(e) = fs::remove_file(&scratch) {
                debug!("Unable to remove {:?}: {}", scratch, e);
            }
            true
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false),
        Err(e) => {
            trace!("{:?} is not writable: {}", path, e);
            false
        }
    }
}

/// Nearest ancestor of `path` (itself included) that exists
fn existing_ancestor(path: &Path) -> Option<PathBuf> {
    let full = std::path::absolute(path).ok()?;
    full.ancestors()
        .find(|candidate| candidate.exists())
        .map(Path::to_path_buf)
}

/// Return `path` if it is, or could be created as, a writable directory
///
/// # Errors
///
/// - [`MirrorError::InvalidRewriteTarget`] if the nearest existing ancestor
///   is not a writable directory
pub fn creatable_directory(path: &Path) -> Result<PathBuf> {
    match existing_ancestor(path) {
        Some(ancestor) if is_writable_directory(&ancestor) => Ok(path.to_path_buf()),
        Some(ancestor) => {
            debug!("{:?} cannot be created below {:?}", path, ancestor);
            Err(MirrorError::InvalidRewriteTarget(path.to_path_buf()))
        }
        None => Err(MirrorError::InvalidRewriteTarget(path.to_path_buf())),
    }
}

/// Whether `dir` has no entries
pub fn is_dir_empty(dir: &Path) -> Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Check that `dir` is usable as an empty destination, without creating it
///
/// # Errors
///
/// - [`MirrorError::DestinationNotEmpty`] if `dir` exists and is a non-empty
///   directory or not a directory at all
pub fn check_clean_directory(dir: &Path) -> Result<()> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            if is_dir_empty(dir)? {
                Ok(())
            } else {
                Err(MirrorError::DestinationNotEmpty(dir.to_path_buf()))
            }
        }
        Ok(_) => Err(MirrorError::DestinationNotEmpty(dir.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Ensure `dir` exists and is empty, creating it (and its ancestors) if needed
///
/// Returns `true` if the directory had to be created.
pub fn clean_directory(dir: &Path) -> Result<bool> {
    check_clean_directory(dir)?;
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir)?;
    Ok(true)
}

/// Remove directory if empty
pub fn remove_dir_if_empty(path: &Path) -> Result<bool> {
    if path.is_dir() && fs::read_dir(path)?.next().is_none() {
        fs::remove_dir(path)?;
        trace!("Removed empty directory: {:?}", path);
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Move the file `from` to `to`
///
/// A rename is tried first. If the two paths are on different filesystems
/// the file is copied and the original deleted. A failed copy removes the
/// partial destination and leaves `from` untouched.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!("{:?} and {:?} are on different filesystems, copying", from, to);
            if let Err(copy_error) = fs::copy(from, to) {
                if let Err(e) = fs::remove_file(to) {
                    trace!("No partial copy at {:?}: {}", to, e);
                }
                return Err(copy_error.into());
            }
            fs::remove_file(from)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Device and inode of a path, following symbolic links
#[cfg(unix)]
fn file_identity(path: &Path) -> std::io::Result<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    let metadata = fs::metadata(path)?;
    Ok((metadata.dev(), metadata.ino()))
}

/// Canonical path used as identity where inodes are unavailable
#[cfg(not(unix))]
fn file_identity(path: &Path) -> std::io::Result<PathBuf> {
    path.canonicalize()
}

/// Whether `a` and `b` name the same file on disk
///
/// Two different paths (for example a symlink and its target) are the same
/// file if they resolve to the same filesystem object. A missing `b` is
/// never the same file.
pub fn is_same_file(a: &Path, b: &Path) -> Result<bool> {
    if fs::symlink_metadata(b).is_err() {
        return Ok(false);
    }
    Ok(file_identity(a)? == file_identity(b)?)
}

/// Make a path relative to a base path
///
/// Tries a lexical strip first, which keeps symbolic links intact, and falls
/// back to canonicalizing both paths.
///
/// # Errors
///
/// - [`MirrorError::BadArguments`] if the path is not under the base path
/// - [`MirrorError::Io`] if canonicalization fails (fallback case only)
pub fn make_relative(path: &Path, base: &Path) -> Result<PathBuf> {
    if let Ok(relative) = path.strip_prefix(base) {
        return Ok(relative.to_path_buf());
    }

    let path_canon = path.canonicalize()?;
    let base_canon = base.canonicalize()?;

    path_canon
        .strip_prefix(&base_canon)
        .map(|p| p.to_path_buf())
        .map_err(|_| {
            MirrorError::bad_arguments(format!(
                "Path {:?} is not relative to {:?}",
                path_canon, base_canon
            ))
        })
}
