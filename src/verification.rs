//! Snapshot verification
//!
//! Re-walks a finished snapshot against the source it was taken from:
//!
//! 1. **Copies**: every regular file must hash (SHA-256) to the same digest
//!    as the source file at the same relative path
//! 2. **Links**: every `.lnk` artifact, symlink or shortcut file, must point
//!    at the existing source entry it replaced
//! 3. **Directories**: every mirrored directory must exist in the source
//!
//! Mismatches are collected in a [`VerificationReport`]; only a failure to
//! start the walk is returned as an error.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use verisnap::verify_snapshot;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = verify_snapshot(
//!     Path::new("./snapshots/V1_2024_01_01_10_30/project"),
//!     Path::new("./project"),
//! )?;
//! if !report.is_valid() {
//!     for error in &report.errors {
//!         eprintln!("{}", error);
//!     }
//! }
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! Note that a source changed after the snapshot was taken shows up as a
//! mismatch; verification is only meaningful against an unchanged source.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::engine::DEFAULT_LINK_EXTENSION;
use crate::error::{Result, VerisnapError};
use crate::link;
use crate::utils;

/// Verifier for a mirrored snapshot root
#[derive(Debug, Clone)]
pub struct SnapshotVerifier {
    link_extension: String,
}

impl Default for SnapshotVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotVerifier {
    /// Verifier recognizing the default `lnk` suffix
    pub fn new() -> Self {
        Self {
            link_extension: DEFAULT_LINK_EXTENSION.to_string(),
        }
    }

    /// Recognize link artifacts with a different suffix
    pub fn with_link_extension(mut self, extension: impl Into<String>) -> Self {
        self.link_extension = extension.into();
        self
    }

    /// Verify `snapshot_root` (the mirrored root, not the version folder)
    /// against `source_root`
    ///
    /// # Errors
    ///
    /// - [`VerisnapError::SourceNotFound`] if either directory is missing
    /// - [`VerisnapError::WalkDir`] if the snapshot root cannot be read
    ///
    /// Mismatches are reported in the result, not as errors.
    pub fn verify(&self, snapshot_root: &Path, source_root: &Path) -> Result<VerificationReport> {
        let start = Instant::now();

        if !source_root.is_dir() {
            return Err(VerisnapError::SourceNotFound(source_root.to_path_buf()));
        }
        if !snapshot_root.is_dir() {
            return Err(VerisnapError::SourceNotFound(snapshot_root.to_path_buf()));
        }

        let mut report = VerificationReport::new(snapshot_root.to_path_buf());
        debug!("Verifying {:?} against {:?}", snapshot_root, source_root);

        for entry in WalkDir::new(snapshot_root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                // The snapshot root itself could not be read
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    report.errors.push(format!("Failed to read snapshot entry: {}", e));
                    continue;
                }
            };

            let relative = utils::make_relative(entry.path(), snapshot_root)?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                report.directories_checked += 1;
                if !source_root.join(&relative).is_dir() {
                    report
                        .errors
                        .push(format!("Directory {:?} has no source counterpart", relative));
                }
            } else if file_type.is_symlink() {
                self.check_symlink(entry.path(), &relative, source_root, &mut report);
            } else if file_type.is_file() {
                self.check_file(entry.path(), &relative, source_root, &mut report);
            }
        }

        report.verification_time_ms = start.elapsed().as_millis() as u64;

        if report.is_valid() {
            info!("{}", report.summary());
        } else {
            warn!("{}", report.summary());
        }

        Ok(report)
    }

    fn check_symlink(
        &self,
        path: &Path,
        relative: &Path,
        source_root: &Path,
        report: &mut VerificationReport,
    ) {
        let Some(original) = self.strip_link_extension(relative) else {
            report
                .errors
                .push(format!("Unexpected symlink {:?} without link suffix", relative));
            return;
        };

        report.links_checked += 1;
        match fs::read_link(path) {
            Ok(target) => self.check_link_target(&target, &original, source_root, report),
            Err(e) => report
                .errors
                .push(format!("Failed to read link {:?}: {}", relative, e)),
        }
    }

    fn check_file(
        &self,
        path: &Path,
        relative: &Path,
        source_root: &Path,
        report: &mut VerificationReport,
    ) {
        // A copied source file may itself carry the link suffix; only a
        // parseable shortcut counts as a link
        if let Some(original) = self.strip_link_extension(relative) {
            match link::read_shortcut(path) {
                Ok(Some(target)) => {
                    report.links_checked += 1;
                    self.check_link_target(&target, &original, source_root, report);
                    return;
                }
                Ok(None) => {}
                Err(e) => {
                    report.links_checked += 1;
                    report
                        .errors
                        .push(format!("Failed to read shortcut {:?}: {}", relative, e));
                    return;
                }
            }
        }

        report.files_checked += 1;
        let source_file = source_root.join(relative);
        if !source_file.is_file() {
            report
                .errors
                .push(format!("File {:?} has no source counterpart", relative));
            return;
        }

        let hashes = utils::hash_file_content(path)
            .and_then(|copy| Ok((copy, utils::hash_file_content(&source_file)?)));
        match hashes {
            Ok((copy, original)) if copy == original => report.files_valid += 1,
            Ok((copy, original)) => report.errors.push(format!(
                "Content mismatch for {:?}: expected {}, got {}",
                relative,
                &original[..8],
                &copy[..8]
            )),
            Err(e) => report
                .errors
                .push(format!("Failed to hash {:?}: {}", relative, e)),
        }
    }

    fn check_link_target(
        &self,
        target: &Path,
        original: &Path,
        source_root: &Path,
        report: &mut VerificationReport,
    ) {
        if !target.exists() {
            report
                .errors
                .push(format!("Link for {:?} points at missing {:?}", original, target));
            return;
        }

        let expected = fs::canonicalize(source_root.join(original));
        let actual = fs::canonicalize(target);
        match (expected, actual) {
            (Ok(expected), Ok(actual)) if expected == actual => report.links_valid += 1,
            (Ok(expected), Ok(actual)) => report.errors.push(format!(
                "Link for {:?} points at {:?} instead of {:?}",
                original, actual, expected
            )),
            (Err(e), _) | (_, Err(e)) => report
                .errors
                .push(format!("Failed to resolve link for {:?}: {}", original, e)),
        }
    }

    /// Path of the entry a link artifact replaced, if `relative` carries the suffix
    fn strip_link_extension(&self, relative: &Path) -> Option<PathBuf> {
        let name = relative.file_name()?.to_str()?;
        let original = name.strip_suffix(&format!(".{}", self.link_extension))?;
        if original.is_empty() {
            return None;
        }
        Some(relative.with_file_name(original))
    }
}

/// Verify a snapshot with the default link suffix
///
/// See [`SnapshotVerifier::verify`].
pub fn verify_snapshot(snapshot_root: &Path, source_root: &Path) -> Result<VerificationReport> {
    SnapshotVerifier::new().verify(snapshot_root, source_root)
}

/// Outcome of verifying one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Mirrored root that was verified
    pub snapshot_root: PathBuf,
    /// Copied files compared against the source
    pub files_checked: usize,
    /// Copied files identical to the source
    pub files_valid: usize,
    /// Link artifacts resolved
    pub links_checked: usize,
    /// Link artifacts pointing at their source entry
    pub links_valid: usize,
    /// Mirrored directories checked
    pub directories_checked: usize,
    /// Every mismatch found
    pub errors: Vec<String>,
    /// Time taken
    pub verification_time_ms: u64,
}

impl VerificationReport {
    /// Empty report for `snapshot_root`
    pub fn new(snapshot_root: PathBuf) -> Self {
        Self {
            snapshot_root,
            files_checked: 0,
            files_valid: 0,
            links_checked: 0,
            links_valid: 0,
            directories_checked: 0,
            errors: Vec::new(),
            verification_time_ms: 0,
        }
    }

    /// Check if the snapshot matches its source
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
            && self.files_valid == self.files_checked
            && self.links_valid == self.links_checked
    }

    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        if self.is_valid() {
            format!(
                "Snapshot {:?} is valid ({} files, {} links verified in {}ms)",
                self.snapshot_root, self.files_checked, self.links_checked, self.verification_time_ms
            )
        } else {
            format!(
                "Snapshot {:?} is invalid: {} errors ({}/{} files valid, {}/{} links valid)",
                self.snapshot_root,
                self.errors.len(),
                self.files_valid,
                self.files_checked,
                self.links_valid,
                self.links_checked
            )
        }
    }
}
