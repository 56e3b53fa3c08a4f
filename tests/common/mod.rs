//! Sample trees shared by the test suites
//!
//! Two identical trees, `one` and `two`, side by side in a temporary
//! directory. Every file's content is its own relative path, so each tree is
//! already a valid mirror of the other.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Files present in every sample tree
pub const STANDARD_FILES: &[&str] = &[
    "dir1/file1.txt",
    "dir1/file2.txt",
    "dir3/srcfile1.c",
    "dir3/srcfile2.c",
    "backup/dir1/file1.txt",
    "backup/dir1/file1~2.txt",
    "backup/dir1/out_2018_08_12.txt",
    "My Files/file1~2.txt",
    "My Files/Music/The Title of the Song.mp3",
    "My Files/Music/The Oneders - That Other Thing.mp3",
    "My Files/Videos/An Interesting Movie.mkv",
];

/// Empty directories present in every sample tree
pub const EMPTY_DIRS: &[&str] = &["dir2/", "My Files/Videos/TV/"];

/// Which of the two sample trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Which {
    One,
    Two,
}

impl Which {
    pub fn other(self) -> Self {
        match self {
            Which::One => Which::Two,
            Which::Two => Which::One,
        }
    }
}

/// Two identical sample trees in a scratch directory
pub struct SampleTrees {
    pub temp_dir: TempDir,
    one: PathBuf,
    two: PathBuf,
}

impl SampleTrees {
    /// Create both trees, empty directories included
    pub fn create() -> anyhow::Result<Self> {
        Self::create_with(true)
    }

    /// Create both trees, optionally without the empty directories
    pub fn create_with(include_empty: bool) -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let one = temp_dir.path().join("one");
        let two = temp_dir.path().join("two");
        for root in [&one, &two] {
            create_sample_tree(root, include_empty)?;
        }
        Ok(Self { temp_dir, one, two })
    }

    pub fn path(&self, which: Which) -> &Path {
        match which {
            Which::One => &self.one,
            Which::Two => &self.two,
        }
    }

    /// A path in the scratch directory that does not exist yet
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Delete `STANDARD_FILES[index]` from one tree
    pub fn delete_file(&self, which: Which, index: usize) -> anyhow::Result<()> {
        fs::remove_file(self.path(which).join(STANDARD_FILES[index]))?;
        Ok(())
    }

    /// Delete `EMPTY_DIRS[index]` from one tree
    pub fn delete_empty_dir(&self, which: Which, index: usize) -> anyhow::Result<()> {
        fs::remove_dir(self.path(which).join(EMPTY_DIRS[index]))?;
        Ok(())
    }
}

/// Write every standard file under `root` with its relative path as content
pub fn create_sample_tree(root: &Path, include_empty: bool) -> anyhow::Result<()> {
    for file in STANDARD_FILES {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, file)?;
    }
    if include_empty {
        for dir in EMPTY_DIRS {
            fs::create_dir_all(root.join(dir))?;
        }
    }
    Ok(())
}

/// Sorted standard file list
pub fn sorted_standard_files() -> Vec<String> {
    let mut files: Vec<String> = STANDARD_FILES.iter().map(|f| f.to_string()).collect();
    files.sort();
    files
}
