//! Main test module for Verisnap
//!
//! This module includes all test suites:
//! - Integration tests for the documented scenarios
//! - Property-based tests for invariants
//! - Edge cases below

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::verisnap::*;
    use filetime::FileTime;
    use std::fs;
    use tempfile::TempDir;

    fn snapshotter(bytes: u64) -> Snapshotter {
        Snapshotter::new(Threshold::from_bytes(bytes).unwrap())
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("empty");
        fs::create_dir(&source).unwrap();

        let summary = snapshotter(100)
            .snapshot(&source, &temp_dir.path().join("snapshots"))
            .unwrap();

        assert_eq!(summary.bytes_copied(), 0);
        assert_eq!(summary.stats.dirs_created, 1);
        assert!(summary.snapshot_root.is_dir());
        assert_eq!(fs::read_dir(&summary.snapshot_root).unwrap().count(), 0);
    }

    #[test]
    fn test_special_filenames() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("names");
        fs::create_dir_all(source.join("dir with spaces")).unwrap();

        let names = [
            "file with spaces.txt",
            "ünïcödé.txt",
            "dash-and_underscore.md",
            ".hidden",
            "dir with spaces/nested.txt",
        ];
        for name in names {
            fs::write(source.join(name), name.as_bytes()).unwrap();
        }

        let summary = snapshotter(1024)
            .snapshot(&source, &temp_dir.path().join("snapshots"))
            .unwrap();

        for name in names {
            assert_eq!(
                fs::read(summary.snapshot_root.join(name)).unwrap(),
                name.as_bytes(),
                "{} was not copied",
                name
            );
        }
    }

    #[test]
    fn test_deeply_nested_small_tree_is_copied() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("deep");
        let mut dir = source.clone();
        for level in 0..20 {
            dir = dir.join(format!("level{}", level));
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("leaf.txt"), b"leaf").unwrap();

        let summary = snapshotter(100)
            .snapshot(&source, &temp_dir.path().join("snapshots"))
            .unwrap();

        let relative = dir.strip_prefix(&source).unwrap();
        assert_eq!(
            fs::read(summary.snapshot_root.join(relative).join("leaf.txt")).unwrap(),
            b"leaf"
        );
        assert_eq!(summary.stats.dirs_created, 21);
    }

    #[test]
    fn test_nested_large_content_does_not_link_parent() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("proj");
        fs::create_dir_all(source.join("outer/inner")).unwrap();
        fs::write(source.join("outer/small.txt"), vec![b's'; 10]).unwrap();
        for name in ["x.bin", "y.bin", "z.bin"] {
            fs::write(source.join("outer/inner").join(name), vec![b'b'; 50]).unwrap();
        }

        let summary = snapshotter(100)
            .snapshot(&source, &temp_dir.path().join("snapshots"))
            .unwrap();

        // outer/ holds 10 bytes directly, so it is descended; inner/ holds 150
        let root = &summary.snapshot_root;
        assert!(root.join("outer").is_dir());
        assert!(root.join("outer/small.txt").is_file());
        assert!(root.join("outer/inner.lnk").symlink_metadata().is_ok());
        assert!(!root.join("outer/inner").exists());
        assert_eq!(summary.bytes_copied(), 10);
    }

    #[test]
    fn test_modification_time_is_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("proj");
        fs::create_dir_all(&source).unwrap();
        let file = source.join("dated.txt");
        fs::write(&file, b"old content").unwrap();

        let mtime = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&file, mtime).unwrap();

        let summary = snapshotter(100)
            .snapshot(&source, &temp_dir.path().join("snapshots"))
            .unwrap();

        let copied = fs::metadata(summary.snapshot_root.join("dated.txt")).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&copied), mtime);
    }

    #[test]
    fn test_missing_snapshots_root_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("proj");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.txt"), b"a").unwrap();

        let snapshots = temp_dir.path().join("not/yet/there");
        let version = make_snapshot(&source, &snapshots, Threshold::default()).unwrap();

        assert_eq!(version, 1);
        assert_eq!(list_versions(&snapshots).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let snapshots = temp_dir.path().join("snapshots");

        let result = make_snapshot(&temp_dir.path().join("nope"), &snapshots, Threshold::default());

        assert!(matches!(result, Err(VerisnapError::SourceNotFound(_))));
        assert!(result.unwrap_err().is_recoverable());
        // Nothing is created for a rejected run
        assert!(!snapshots.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("proj");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("kept.txt"), b"kept").unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("gone"), source.join("dangling")).unwrap();

        let summary = snapshotter(100)
            .snapshot(&source, &temp_dir.path().join("snapshots"))
            .unwrap();

        assert!(summary.snapshot_root.join("kept.txt").is_file());
        assert!(summary.snapshot_root.join("dangling").symlink_metadata().is_err());
        assert!(summary.snapshot_root.join("dangling.lnk").symlink_metadata().is_err());
        assert_eq!(summary.stats.failures(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_small_file_is_copied() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("proj");
        fs::create_dir_all(&source).unwrap();
        fs::write(temp_dir.path().join("outside.txt"), b"outside").unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("outside.txt"), source.join("alias.txt")).unwrap();

        let summary = snapshotter(100)
            .snapshot(&source, &temp_dir.path().join("snapshots"))
            .unwrap();

        let copied = summary.snapshot_root.join("alias.txt");
        assert!(!copied.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read(copied).unwrap(), b"outside");
        assert_eq!(summary.bytes_copied(), 7);
    }
}
