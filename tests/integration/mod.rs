//! Integration tests for snapshot scenarios
//!
//! Each test builds a small source tree, snapshots it and checks the
//! resulting layout on disk.

use ::verisnap::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Source tree plus snapshots root inside one temporary directory
struct TestEnv {
    _temp_dir: TempDir,
    source: PathBuf,
    snapshots: PathBuf,
}

impl TestEnv {
    fn new(name: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join(name);
        let snapshots = temp_dir.path().join("snapshots");
        fs::create_dir_all(&source).unwrap();
        Self {
            _temp_dir: temp_dir,
            source,
            snapshots,
        }
    }

    fn write(&self, relative: &str, size: usize) {
        let path = self.source.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        fs::write(path, content).unwrap();
    }

    fn snapshot(&self, threshold_bytes: u64) -> SnapshotSummary {
        Snapshotter::new(Threshold::from_bytes(threshold_bytes).unwrap())
            .snapshot(&self.source, &self.snapshots)
            .unwrap()
    }
}

fn link_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

#[test]
fn test_small_file_copied_large_file_linked() {
    let env = TestEnv::new("proj");
    env.write("a.txt", 10);
    env.write("b.txt", 200);

    let summary = env.snapshot(100);
    let root = &summary.snapshot_root;

    assert_eq!(
        fs::read(root.join("a.txt")).unwrap(),
        fs::read(env.source.join("a.txt")).unwrap()
    );
    assert!(!root.join("b.txt").exists());
    assert!(link_exists(&root.join("b.txt.lnk")));
    assert_eq!(summary.bytes_copied(), 10);
    assert_eq!(summary.stats.files_copied, 1);
    assert_eq!(summary.stats.files_linked, 1);
}

#[test]
fn test_directory_over_threshold_is_linked_whole() {
    let env = TestEnv::new("proj");
    env.write("big/one.dat", 50);
    env.write("big/two.dat", 50);
    env.write("big/three.dat", 50);

    let summary = env.snapshot(100);
    let root = &summary.snapshot_root;

    assert!(link_exists(&root.join("big.lnk")));
    assert!(!root.join("big").exists());
    assert_eq!(summary.bytes_copied(), 0);
    assert_eq!(summary.stats.dirs_linked, 1);
    assert_eq!(fs::read_dir(root).unwrap().count(), 1);
}

#[test]
fn test_link_points_at_absolute_source() {
    let env = TestEnv::new("proj");
    env.write("large.iso", 500);

    let summary = env.snapshot(100);
    let link = summary.snapshot_root.join("large.iso.lnk");

    let target = match fs::read_link(&link) {
        Ok(target) => target,
        // Shortcut fallback when symlinks are not permitted
        Err(_) => link::read_shortcut(&link).unwrap().unwrap(),
    };
    assert!(target.is_absolute());
    assert_eq!(
        target.canonicalize().unwrap(),
        env.source.join("large.iso").canonicalize().unwrap()
    );
}

#[test]
fn test_bytes_copied_is_exact_sum() {
    let env = TestEnv::new("proj");
    env.write("a.txt", 1);
    env.write("b.txt", 99);
    env.write("c.txt", 100);
    env.write("d.txt", 101);
    env.write("sub/e.txt", 42);
    env.write("sub/f.txt", 1000);

    let summary = env.snapshot(100);

    assert_eq!(summary.bytes_copied(), 1 + 99 + 100 + 42);
    assert_eq!(summary.stats.files_copied, 4);
    assert_eq!(summary.stats.files_linked, 0);
    // sub/ holds 1042 bytes directly
    assert_eq!(summary.stats.dirs_linked, 1);
    assert!(!summary.snapshot_root.join("d.txt").exists());
    assert!(link_exists(&summary.snapshot_root.join("d.txt.lnk")));
}

#[test]
fn test_version_folder_layout() {
    let env = TestEnv::new("proj");
    env.write("a.txt", 10);
    fs::create_dir_all(env.snapshots.join("V1_2024_01_01_10_30")).unwrap();
    fs::create_dir_all(env.snapshots.join("V2_2024_01_02_10_30")).unwrap();
    fs::create_dir_all(env.snapshots.join("V7_2024_02_01_09_00")).unwrap();
    fs::create_dir_all(env.snapshots.join("backup_old")).unwrap();

    assert_eq!(allocate_version(&env.snapshots).unwrap(), 8);

    let summary = env.snapshot(100);
    assert_eq!(summary.version, 8);

    let name = summary.output_dir.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("V8_"), "unexpected folder {}", name);
    let folder = VersionFolder::parse(&summary.output_dir).unwrap();
    assert!(folder.created_at.is_some());
    assert_eq!(summary.snapshot_root, summary.output_dir.join("proj"));

    // Unrelated entries are left untouched
    assert!(env.snapshots.join("backup_old").is_dir());
}

#[test]
fn test_make_snapshot_returns_version() {
    let env = TestEnv::new("proj");
    env.write("a.txt", 10);

    let first = make_snapshot(&env.source, &env.snapshots, validate_threshold("abc")).unwrap();
    let second = make_snapshot(&env.source, &env.snapshots, validate_threshold(10.0)).unwrap();

    assert_eq!((first, second), (1, 2));
    assert_eq!(list_versions(&env.snapshots).unwrap().len(), 2);
}

#[test]
fn test_snapshot_verifies_against_source() {
    let env = TestEnv::new("proj");
    env.write("a.txt", 10);
    env.write("docs/guide.md", 80);
    env.write("media/video.mp4", 4000);

    let summary = env.snapshot(100);
    let report = verify_snapshot(&summary.snapshot_root, &env.source).unwrap();

    assert!(report.is_valid(), "{}", report.summary());
    assert_eq!(report.files_checked, 2);
    assert_eq!(report.links_checked, 1);
}
