//! Main test module for treemirror
//!
//! This module includes all test suites:
//! - Integration tests for mirror, flatten, restore and report scenarios
//! - Chaos tests for unreadable and unwritable entries
//! - Property-based tests for the path algebra and the round trip

pub mod chaos;
pub mod common;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::treemirror::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_source() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mirror = out.path().join("mirror");

        let report = create_mirror(source.path(), &mirror).unwrap();
        assert_eq!(report.files_written, 0);
        assert_eq!(report.directories_created, 1);
        assert!(verify_mirror(source.path(), &mirror));

        let flattened = flatten("dummy", &mirror).unwrap();
        assert_eq!(flattened.files_moved, 0);
        assert!(restore(&mirror, None).unwrap().is_clean());
    }

    #[test]
    fn test_special_filenames() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let special_names = vec![
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file_with_underscores.txt",
            "file.multiple.dots.txt",
            "Caf\u{e9} au lait.txt",
            "~tilde.txt",
            ".hidden",
        ];
        for name in &special_names {
            fs::write(source.path().join(name), "x").unwrap();
        }

        let mirror = out.path().join("mirror");
        let copy = out.path().join("copy");
        create_mirror(source.path(), &mirror).unwrap();
        create_mirror(source.path(), &copy).unwrap();
        flatten("dummy", &mirror).unwrap();
        let report = restore(&mirror, None).unwrap();

        assert_eq!(report.files_restored, special_names.len());
        assert!(verify_mirror(&mirror, &copy));
        assert!(mirror.join("Caf\u{e9} au lait.txt").is_file());
    }

    #[test]
    fn test_deep_nesting() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let mut deep = source.path().to_path_buf();
        for i in 0..60 {
            deep.push(format!("level{}", i));
        }
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("bottom.txt"), "x").unwrap();

        let mirror = out.path().join("mirror");
        let copy = out.path().join("copy");
        create_mirror(source.path(), &mirror).unwrap();
        create_mirror(source.path(), &copy).unwrap();

        let flattened = flatten("dummy", &mirror).unwrap();
        assert_eq!(flattened.directories_removed, 60);

        restore(&mirror, None).unwrap();
        assert!(verify_mirror(&mirror, &copy));
    }

    #[test]
    fn test_restore_absolute_recorded_path() {
        let root = TempDir::new().unwrap();
        let target = root.path().join("merges");
        fs::create_dir(&target).unwrap();

        // A marker recording a rooted path that shares the target's prefix
        let recorded = root.path().join("spreadsheets").join("Expenses1");
        fs::write(
            target.join("dummy101"),
            recorded.to_string_lossy().as_bytes(),
        )
        .unwrap();

        let report = restore(&target, None).unwrap();
        assert_eq!(report.files_restored, 1);
        assert!(target.join("spreadsheets").join("Expenses1").is_file());
    }

    #[test]
    fn test_restore_twice_is_a_no_op() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("dummy101"), "a/b/c.txt").unwrap();

        assert_eq!(restore(root.path(), None).unwrap().files_restored, 1);
        let again = restore(root.path(), None).unwrap();
        assert_eq!(again.files_restored, 0);
        assert_eq!(again.already_in_place, 1);
    }
}
