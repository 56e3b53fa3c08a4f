//! Chaos testing for treemirror
//!
//! Damages mirrors in the ways a real filesystem does (lost files,
//! truncated markers, directories that cannot be listed) and checks that
//! every engine degrades the way it promises: mirror and restore count and
//! carry on, flatten stops at the first failure.

use ::treemirror::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::common::{SampleTrees, Which, STANDARD_FILES};

/// Seeded source of damage
pub struct ChaosEngine {
    rng: StdRng,
}

impl ChaosEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick `count` distinct standard files under `root`
    pub fn pick_files(&mut self, root: &Path, count: usize) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = STANDARD_FILES.iter().map(|f| root.join(f)).collect();
        files.shuffle(&mut self.rng);
        files.truncate(count);
        files
    }

    /// Delete `count` random standard files
    pub fn delete_random_files(&mut self, root: &Path, count: usize) -> anyhow::Result<Vec<PathBuf>> {
        let victims = self.pick_files(root, count);
        for file in &victims {
            fs::remove_file(file)?;
            info!("Deleted {:?}", file);
        }
        Ok(victims)
    }

    /// Truncate `count` random markers to whitespace
    pub fn blank_random_markers(&mut self, root: &Path, count: usize) -> anyhow::Result<Vec<PathBuf>> {
        let victims = self.pick_files(root, count);
        for file in &victims {
            fs::write(file, " \r\n")?;
            info!("Blanked {:?}", file);
        }
        Ok(victims)
    }
}

/// Restricts a directory's permissions for as long as it lives
#[cfg(unix)]
pub struct LockedDir {
    path: PathBuf,
}

#[cfg(unix)]
impl LockedDir {
    fn restrict(path: &Path, mode: u32) -> anyhow::Result<Self> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Make `path` unlistable, or return `None` if this process can list it
    /// anyway (for example when running as root)
    pub fn lock(path: &Path) -> anyhow::Result<Option<Self>> {
        let locked = Self::restrict(path, 0o000)?;
        if fs::read_dir(path).is_ok() {
            return Ok(None);
        }
        Ok(Some(locked))
    }

    /// Make `path` listable but read-only, so nothing can be moved out of
    /// it, or return `None` if this process can write to it anyway
    pub fn seal(path: &Path) -> anyhow::Result<Option<Self>> {
        let sealed = Self::restrict(path, 0o555)?;
        let canary = path.join(".canary");
        if fs::write(&canary, b"x").is_ok() {
            fs::remove_file(&canary)?;
            return Ok(None);
        }
        Ok(Some(sealed))
    }
}

#[cfg(unix)]
impl Drop for LockedDir {
    fn drop(&mut self) {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o755));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_lost_files_break_equivalence() {
        let trees = SampleTrees::create().unwrap();
        let mut chaos = ChaosEngine::new(42);

        let lost = chaos.delete_random_files(trees.path(Which::Two), 3).unwrap();
        assert_eq!(lost.len(), 3);
        assert!(!verify_mirror(trees.path(Which::One), trees.path(Which::Two)));

        let set = make_file_report(trees.path(Which::Two), &EngineConfig::default()).unwrap();
        assert_eq!(set.files.len(), STANDARD_FILES.len() - 3);
    }

    #[test]
    #[traced_test]
    fn test_blank_markers_are_counted_and_left_behind() {
        let trees = SampleTrees::create_with(false).unwrap();
        let one = trees.path(Which::One);
        let mut chaos = ChaosEngine::new(7);
        chaos.blank_random_markers(one, 2).unwrap();

        flatten("dummy", one).unwrap();
        let report = restore(one, None).unwrap();

        assert_eq!(report.errors, 2);
        assert_eq!(report.files_restored, STANDARD_FILES.len() - 2);
        assert_eq!(report.status_code(), status::EXCEPTION_RESTORING);
        assert!(logs_contain("records no path"));

        let set = make_file_report(one, &EngineConfig::default()).unwrap();
        assert_eq!(set.errors, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory_during_mirror() {
        let trees = SampleTrees::create().unwrap();
        let locked_path = trees.path(Which::One).join("dir3");
        let Some(_lock) = LockedDir::lock(&locked_path).unwrap() else {
            return;
        };

        let mirror = trees.scratch("mirror");
        let report = create_mirror(trees.path(Which::One), &mirror).unwrap();

        assert_eq!(report.errors, 1);
        assert_eq!(report.status_code(), status::MIRROR_INCOMPLETE);
        // Everything outside the locked directory still made it
        assert_eq!(report.files_written, STANDARD_FILES.len() - 2);
        assert!(mirror.join("dir3").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory_aborts_flatten() {
        let trees = SampleTrees::create().unwrap();
        let locked_path = trees.path(Which::One).join("dir3");
        let Some(_lock) = LockedDir::lock(&locked_path).unwrap() else {
            return;
        };

        let err = flatten("dummy", trees.path(Which::One)).unwrap_err();
        assert!(matches!(err, MirrorError::DescendFailed { .. }));
        assert_eq!(err.status_code(), status::EXCEPTION_DESCENDING);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_move_aborts_flatten_and_keeps_earlier_moves() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "a.txt").unwrap();
        fs::write(root.join("b.txt"), "b.txt").unwrap();
        let sealed_path = root.join("sealed");
        fs::create_dir(&sealed_path).unwrap();
        fs::write(sealed_path.join("c.txt"), "sealed/c.txt").unwrap();
        let Some(_seal) = LockedDir::seal(&sealed_path).unwrap() else {
            return;
        };

        let err = flatten("dummy", root).unwrap_err();

        assert!(matches!(err, MirrorError::MoveFailed { .. }));
        assert_eq!(err.status_code(), status::FLATTEN_FAILED);
        // Top-level files are visited first and stay where they were moved
        assert_eq!(fs::read_to_string(root.join("dummy101")).unwrap(), "a.txt");
        assert_eq!(fs::read_to_string(root.join("dummy102")).unwrap(), "b.txt");
        assert!(!root.join("a.txt").exists());
        assert!(!root.join("b.txt").exists());
        assert!(sealed_path.join("c.txt").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory_during_restore() {
        let trees = SampleTrees::create_with(false).unwrap();
        let locked_path = trees.path(Which::One).join("dir3");
        let Some(_lock) = LockedDir::lock(&locked_path).unwrap() else {
            return;
        };

        let report = restore(trees.path(Which::One), None).unwrap();

        assert_eq!(report.descend_errors, 1);
        assert_eq!(report.errors, 0);
        assert_eq!(report.already_in_place, STANDARD_FILES.len() - 2);
        assert_eq!(report.status_code(), status::EXCEPTION_DESCENDING);
    }
}
