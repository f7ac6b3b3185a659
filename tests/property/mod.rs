//! Property-based testing for Verisnap
//!
//! Uses proptest to check the copy-or-link invariants over randomly
//! generated source trees and thresholds.

use ::verisnap::version::{folder_name, parse_version};
use ::verisnap::*;
use chrono::NaiveDate;
use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A file to create in the source tree
#[derive(Debug, Clone)]
struct SourceFile {
    path: PathBuf,
    size: usize,
}

/// Generate random file paths
///
/// Directory names start with `d` and file names with `f` so a path is never
/// both a file and a directory.
fn path_strategy() -> impl Strategy<Value = PathBuf> {
    let dir_strategy = prop::collection::vec("d[a-z]{1,4}", 0..=3);
    let filename_strategy = "f[a-z]{1,6}\\.(txt|bin)";

    (dir_strategy, filename_strategy).prop_map(|(dirs, filename)| {
        let mut path = PathBuf::new();
        for dir in dirs {
            path.push(dir);
        }
        path.join(filename)
    })
}

fn tree_strategy() -> impl Strategy<Value = Vec<SourceFile>> {
    prop::collection::vec(
        (path_strategy(), 0..3000usize).prop_map(|(path, size)| SourceFile { path, size }),
        0..25,
    )
}

fn build_tree(root: &Path, files: &[SourceFile]) -> anyhow::Result<()> {
    fs::create_dir_all(root)?;
    for file in files {
        let full_path = root.join(&file.path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full_path, vec![b'x'; file.size])?;
    }
    Ok(())
}

/// Sum of the regular files directly inside `dir`
fn direct_size(dir: &Path) -> anyhow::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

/// Check the mirror of `source` against the expected decisions and
/// accumulate the bytes that should have been copied
fn check_mirror(source: &Path, mirror: &Path, threshold: u64, copied: &mut u64) -> anyhow::Result<()> {
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let name = entry.file_name();
        let path = entry.path();
        let mirrored = mirror.join(&name);
        let link = mirror.join(format!("{}.lnk", name.to_string_lossy()));

        if entry.file_type()?.is_dir() {
            if direct_size(&path)? > threshold {
                anyhow::ensure!(link.symlink_metadata().is_ok(), "missing link {:?}", link);
                anyhow::ensure!(!mirrored.exists(), "linked directory mirrored {:?}", mirrored);
            } else {
                anyhow::ensure!(mirrored.is_dir(), "missing directory {:?}", mirrored);
                check_mirror(&path, &mirrored, threshold, copied)?;
            }
        } else {
            let size = entry.metadata()?.len();
            if size > threshold {
                anyhow::ensure!(link.symlink_metadata().is_ok(), "missing link {:?}", link);
                anyhow::ensure!(!mirrored.exists(), "large file copied {:?}", mirrored);
            } else {
                anyhow::ensure!(fs::read(&mirrored)? == fs::read(&path)?, "copy differs {:?}", mirrored);
                *copied += size;
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_copy_or_link_invariants(files in tree_strategy(), threshold in 1u64..2000) {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let output = temp_dir.path().join("out");
        build_tree(&source, &files).unwrap();

        let bytes = copy_directory(&source, &output, Threshold::from_bytes(threshold).unwrap()).unwrap();

        let mut expected = 0;
        let checked = check_mirror(&source, &output.join("src"), threshold, &mut expected);
        prop_assert!(checked.is_ok(), "{:?}", checked);
        prop_assert_eq!(bytes, expected);
    }

    #[test]
    fn prop_allocated_version_exceeds_existing(versions in prop::collection::vec(1u64..10_000, 0..10)) {
        let temp_dir = TempDir::new().unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        for version in &versions {
            fs::create_dir_all(temp_dir.path().join(folder_name(*version, at))).unwrap();
        }

        let next = allocate_version(temp_dir.path()).unwrap();
        prop_assert_eq!(next, versions.iter().max().copied().unwrap_or(0) + 1);
    }

    #[test]
    fn prop_non_version_names_are_ignored(name in "[a-zA-Z_]{1,12}") {
        // No digit anywhere means no `V<digits>_` prefix
        prop_assert_eq!(parse_version(&name), None);
    }

    #[test]
    fn prop_valid_threshold_is_proportional(megabytes in 0.001f64..=100.0) {
        let threshold = validate_threshold(megabytes);
        prop_assert_eq!(threshold.bytes(), ((megabytes * 1024.0 * 1024.0) as u64).max(1));
    }

    #[test]
    fn prop_out_of_range_threshold_uses_default(megabytes in prop_oneof![-1.0e6f64..=0.0, 100.0001f64..1.0e6]) {
        prop_assert_eq!(validate_threshold(megabytes), Threshold::default());
    }
}
