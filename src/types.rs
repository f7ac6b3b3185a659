//! Core data types used throughout verisnap
//!
//! ## Overview
//!
//! - **Entries**: [`EntryKind`], [`EntryOutcome`] - what the engine decided for one file or directory
//! - **Results**: [`RunStats`], [`SnapshotSummary`] - totals of a finished run
//!
//! ```rust
//! use verisnap::types::{EntryKind, EntryOutcome, RunStats};
//!
//! let mut stats = RunStats::default();
//! stats.record_file(EntryOutcome::Copied, 10);
//! stats.record_link(EntryKind::File, EntryOutcome::Linked);
//!
//! assert_eq!(stats.bytes_copied, 10);
//! assert_eq!(stats.files_linked, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of a directory entry met during traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file (or symbolic link to one)
    File,
    /// Directory
    Directory,
}

/// Decision taken for a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryOutcome {
    /// Content copied into the snapshot
    Copied,
    /// Replaced by a symbolic link
    Linked,
    /// Replaced by a shortcut file because symbolic links were not permitted
    LinkFallback,
    /// Copy or shortcut failed; the entry is absent from the snapshot
    Failed,
}

/// Counters accumulated while a run walks the source tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Bytes physically copied; links contribute nothing
    pub bytes_copied: u64,
    /// Files copied
    pub files_copied: usize,
    /// Files replaced by a link artifact
    pub files_linked: usize,
    /// Directories replaced by a link artifact
    pub dirs_linked: usize,
    /// Directories mirrored into the snapshot, root included
    pub dirs_created: usize,
    /// Link artifacts written as shortcut files
    pub shortcuts: usize,
    /// Files whose copy failed
    pub copy_failures: usize,
    /// Entries left without a link because the shortcut could not be written
    pub link_failures: usize,
}

impl RunStats {
    /// Record the outcome of copying a file of `size` bytes
    pub fn record_file(&mut self, outcome: EntryOutcome, size: u64) {
        match outcome {
            EntryOutcome::Copied => {
                self.files_copied += 1;
                self.bytes_copied += size;
            }
            EntryOutcome::Failed => self.copy_failures += 1,
            EntryOutcome::Linked | EntryOutcome::LinkFallback => self.record_link(EntryKind::File, outcome),
        }
    }

    /// Record the outcome of replacing an entry by a link artifact
    pub fn record_link(&mut self, kind: EntryKind, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Linked | EntryOutcome::LinkFallback => {
                match kind {
                    EntryKind::File => self.files_linked += 1,
                    EntryKind::Directory => self.dirs_linked += 1,
                }
                if outcome == EntryOutcome::LinkFallback {
                    self.shortcuts += 1;
                }
            }
            EntryOutcome::Failed => self.link_failures += 1,
            EntryOutcome::Copied => {}
        }
    }

    /// Total number of entries that failed
    pub fn failures(&self) -> usize {
        self.copy_failures + self.link_failures
    }
}

/// Result of a complete snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// Allocated version number
    pub version: u64,
    /// Version folder, e.g. `snapshots/V3_2024_01_01_10_30`
    pub output_dir: PathBuf,
    /// Mirrored source root inside the version folder
    pub snapshot_root: PathBuf,
    /// Traversal counters
    pub stats: RunStats,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl SnapshotSummary {
    /// Bytes physically copied
    pub fn bytes_copied(&self) -> u64 {
        self.stats.bytes_copied
    }
}
