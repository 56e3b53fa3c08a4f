//! Property-based testing for treemirror
//!
//! Uses proptest to check the path algebra and the
//! mirror, flatten, restore round trip on generated trees.

use ::treemirror::paths::{normalize, segments};
use ::treemirror::*;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Generate a relative path of 1-5 plain segments
fn relative_path_strategy() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec("[a-z]{1,6}", 1..=5).prop_map(|parts| parts.iter().collect::<PathBuf>())
}

/// Generate a rooted path of 1-5 plain segments
fn rooted_path_strategy() -> impl Strategy<Value = PathBuf> {
    relative_path_strategy().prop_map(|relative| {
        let mut rooted = PathBuf::from(std::path::MAIN_SEPARATOR_STR);
        rooted.push(relative);
        rooted
    })
}

/// Generate a set of file paths that can coexist in one tree
///
/// Directories start with `d` and files with `f`, so no path is both.
fn tree_strategy() -> impl Strategy<Value = BTreeSet<PathBuf>> {
    let file = (
        prop::collection::vec("d[a-c]{1,2}", 0..=3),
        "f[a-z]{1,6}\\.txt",
    )
        .prop_map(|(dirs, name)| {
            let mut path: PathBuf = dirs.iter().collect();
            path.push(name);
            path
        });
    prop::collection::btree_set(file, 1..20)
}

fn write_tree(root: &Path, files: &BTreeSet<PathBuf>) {
    for file in files {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"payload").unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A relative append is plain concatenation
    #[test]
    fn combine_relative_is_join(
        parent in rooted_path_strategy(),
        append in relative_path_strategy(),
    ) {
        prop_assert_eq!(combine_paths(&parent, &append), normalize(&parent.join(&append)));
    }

    /// A rooted append never collapses to the parent and always keeps its
    /// last segment
    #[test]
    fn combine_rooted_always_appends(
        parent in rooted_path_strategy(),
        append in rooted_path_strategy(),
    ) {
        let combined = combine_paths(&parent, &append);
        prop_assert_ne!(&combined, &parent);
        prop_assert!(combined.starts_with(&parent));
        prop_assert_eq!(combined.file_name(), append.file_name());
        prop_assert!(segments(&combined).len() > segments(&parent).len());
    }

    /// Combining a path with itself repeats its last segment
    #[test]
    fn combine_with_self(path in rooted_path_strategy()) {
        let last = path.file_name().unwrap().to_owned();
        prop_assert_eq!(combine_paths(&path, &path), path.join(last));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Mirroring preserves shape, and restoring a flattened mirror brings
    /// it back
    #[test]
    fn flatten_then_restore_is_identity(files in tree_strategy()) {
        let source = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        write_tree(source.path(), &files);

        let mirror = work.path().join("mirror");
        let copy = work.path().join("copy");
        prop_assert!(create_mirror(source.path(), &mirror).unwrap().is_complete());
        prop_assert!(create_mirror(source.path(), &copy).unwrap().is_complete());
        prop_assert!(verify_mirror(&mirror, &copy));

        let flattened = flatten("dummy", &mirror).unwrap();
        prop_assert_eq!(flattened.files_moved, files.len());

        let restored = restore(&mirror, None).unwrap();
        prop_assert!(restored.is_clean());
        prop_assert_eq!(restored.files_restored + restored.already_in_place, files.len());
        prop_assert!(verify_mirror(&mirror, &copy));
        prop_assert!(verify_mirror(&mirror, source.path()));
    }
}
