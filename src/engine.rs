//! Snapshot engine
//!
//! Walks a source tree top-down and writes its space-bounded copy:
//!
//! 1. The mirrored root `<destination>/<source name>` is created.
//! 2. Every visited directory is mirrored as an empty directory.
//! 3. Each immediate subdirectory is sized by the regular files directly
//!    inside it (one level only). Above the threshold it is replaced by a
//!    `<name>.lnk` link and never descended into.
//! 4. Each file at or below the threshold is copied with its metadata; larger
//!    files are replaced by a `<name>.lnk` link.
//!
//! Directories to descend into are decided before any of them is visited,
//! and visited from an explicit work stack, so a linked directory never
//! contributes anything below its link.
//!
//! The destination folder, and any path added with
//! [`SnapshotEngine::with_excluded`], is never walked when it lies inside the
//! source. A small file whose name equals a sibling's link artifact
//! (`a.lnk` next to a large `a`) is not copied, since the copy would land on
//! the link.
//!
//! Per-entry copy failures and shortcut failures are logged and skipped. Only
//! a failure to create the mirrored root, or a link failure that is not a
//! privilege problem, aborts the run.
//!
//! ```rust,no_run
//! use verisnap::engine::SnapshotEngine;
//! use verisnap::link::SystemLinker;
//! use verisnap::threshold::validate_threshold;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let linker = SystemLinker::default();
//! let engine = SnapshotEngine::new(&linker, validate_threshold("20"));
//! let stats = engine.run(Path::new("./project"), Path::new("./snapshots/V1_2024_01_01_10_30"))?;
//! println!("copied {} bytes", stats.bytes_copied);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, trace, warn};
use walkdir::WalkDir;

use crate::error::{Result, VerisnapError};
use crate::link::{LinkOutcome, Linker, SystemLinker};
use crate::threshold::Threshold;
use crate::types::{EntryKind, EntryOutcome, RunStats};
use crate::utils::{self, format_bytes};

/// Suffix appended to the mirrored path of a linked entry
pub const DEFAULT_LINK_EXTENSION: &str = "lnk";

/// An entry of the directory currently being processed
#[derive(Debug)]
struct SourceEntry {
    path: PathBuf,
    name: OsString,
    kind: EntryKind,
    /// File size (target size for links to files); 0 for directories
    size: u64,
    is_symlink: bool,
}

/// Copy-or-link walker for a single snapshot run
pub struct SnapshotEngine<'a> {
    linker: &'a dyn Linker,
    threshold: Threshold,
    link_extension: String,
    excluded: Vec<PathBuf>,
}

impl std::fmt::Debug for SnapshotEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotEngine")
            .field("linker", &self.linker.strategy())
            .field("threshold", &self.threshold)
            .field("link_extension", &self.link_extension)
            .field("excluded", &self.excluded)
            .finish()
    }
}

impl<'a> SnapshotEngine<'a> {
    /// Create an engine linking through `linker`
    pub fn new(linker: &'a dyn Linker, threshold: Threshold) -> Self {
        Self {
            linker,
            threshold,
            link_extension: DEFAULT_LINK_EXTENSION.to_string(),
            excluded: Vec::new(),
        }
    }

    /// Override the suffix of link artifacts (without the leading dot)
    pub fn with_link_extension(mut self, extension: impl Into<String>) -> Self {
        self.link_extension = extension.into();
        self
    }

    /// Never walk `path` (or anything below it) when it lies inside the source
    ///
    /// Paths that cannot be canonicalized are ignored.
    pub fn with_excluded(mut self, path: &Path) -> Self {
        match path.canonicalize() {
            Ok(path) => self.excluded.push(path),
            Err(e) => debug!("Not excluding {:?}: {}", path, e),
        }
        self
    }

    /// Threshold in effect
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Snapshot `source_root` into `destination_root/<source name>`
    ///
    /// # Returns
    ///
    /// Counters of the run; `bytes_copied` is the exact sum of the sizes of
    /// the files that were copied.
    ///
    /// # Errors
    ///
    /// - [`VerisnapError::SourceNotFound`] if `source_root` is not a directory
    /// - [`VerisnapError::CreateRoot`] if the mirrored root cannot be created
    /// - [`VerisnapError::Link`] if a link fails for a reason other than privilege
    #[instrument(skip(self), fields(threshold = self.threshold.bytes()))]
    pub fn run(&self, source_root: &Path, destination_root: &Path) -> Result<RunStats> {
        if !source_root.is_dir() {
            return Err(VerisnapError::SourceNotFound(source_root.to_path_buf()));
        }

        // Absolute source paths keep link targets valid from inside the snapshot
        let source = source_root.canonicalize()?;
        let root_dest = destination_root.join(snapshot_name(source_root)?);
        fs::create_dir_all(&root_dest).map_err(|source| VerisnapError::CreateRoot {
            path: root_dest.clone(),
            source,
        })?;
        info!("Created root directory: {:?}", root_dest);

        // The run's own output must never be mirrored into itself
        let mut excluded = self.excluded.clone();
        excluded.push(destination_root.canonicalize()?);

        let mut stats = RunStats {
            dirs_created: 1,
            ..Default::default()
        };

        let mut pending = vec![(source, root_dest)];
        while let Some((src_dir, dest_dir)) = pending.pop() {
            let descend = self.process_dir(&src_dir, &dest_dir, &excluded, &mut stats)?;

            // Reverse so directories are visited in name order
            for (child_src, child_dest) in descend.into_iter().rev() {
                match fs::create_dir_all(&child_dest) {
                    Ok(()) => {
                        stats.dirs_created += 1;
                        pending.push((child_src, child_dest));
                    }
                    Err(e) => {
                        error!("Error creating directory {:?}: {}", child_dest, e);
                    }
                }
            }
        }

        info!(
            "Snapshot of {:?} complete: {} copied, {} files and {} directories linked",
            source_root,
            format_bytes(stats.bytes_copied),
            stats.files_linked,
            stats.dirs_linked
        );
        Ok(stats)
    }

    /// Decide every entry of one directory
    ///
    /// Returns the subdirectories to descend into, paired with their
    /// mirrored paths.
    fn process_dir(
        &self,
        src_dir: &Path,
        dest_dir: &Path,
        excluded: &[PathBuf],
        stats: &mut RunStats,
    ) -> Result<Vec<(PathBuf, PathBuf)>> {
        let (dirs, files): (Vec<_>, Vec<_>) = list_entries(src_dir)
            .into_iter()
            .partition(|entry| entry.kind == EntryKind::Directory);

        // Names of the link artifacts written into `dest_dir`
        let mut artifacts: HashSet<OsString> = HashSet::new();

        let mut descend = Vec::new();
        for dir in dirs {
            let mirrored = dest_dir.join(&dir.name);

            if dir.is_symlink {
                debug!("Linking symlinked directory {:?} instead of following it", dir.path);
                let outcome = self.link_entry(&dir.path, &mirrored)?;
                self.note_artifact(&mut artifacts, &dir.name, outcome);
                stats.record_link(EntryKind::Directory, outcome);
                continue;
            }

            if excluded.contains(&dir.path) {
                info!("Skipping {:?}: it holds the snapshot output", dir.path);
                continue;
            }

            let size = utils::shallow_dir_size(&dir.path).unwrap_or_else(|e| {
                warn!("Failed to size directory {:?}: {}", dir.path, e);
                0
            });

            if self.threshold.allows(size) {
                descend.push((dir.path, mirrored));
            } else {
                info!(
                    "Skipping directory {:?} (size: {}) exceeds threshold: {}",
                    dir.path,
                    format_bytes(size),
                    self.threshold
                );
                let outcome = self.link_entry(&dir.path, &mirrored)?;
                self.note_artifact(&mut artifacts, &dir.name, outcome);
                stats.record_link(EntryKind::Directory, outcome);
            }
        }

        for file in files {
            let mirrored = dest_dir.join(&file.name);

            if self.threshold.allows(file.size) {
                if artifacts.contains(&file.name) {
                    error!(
                        "Not copying {:?}: its name collides with a sibling's link artifact",
                        file.path
                    );
                    stats.record_file(EntryOutcome::Failed, file.size);
                    continue;
                }

                match utils::copy_with_metadata(&file.path, &mirrored) {
                    Ok(copied) => stats.record_file(EntryOutcome::Copied, copied),
                    Err(e) => {
                        error!("Error copying file {:?}: {}", file.path, e);
                        stats.record_file(EntryOutcome::Failed, file.size);
                    }
                }
            } else {
                info!(
                    "Skipping file {:?} (size: {}) exceeds threshold: {}",
                    file.path,
                    format_bytes(file.size),
                    self.threshold
                );
                let outcome = self.link_entry(&file.path, &mirrored)?;
                self.note_artifact(&mut artifacts, &file.name, outcome);
                stats.record_link(EntryKind::File, outcome);
            }
        }

        // Links are written before directories are created, so a directory
        // named like an artifact would be created through the link
        descend.retain(|(src, _): &(PathBuf, PathBuf)| {
            let collides = src.file_name().is_some_and(|name| artifacts.contains(name));
            if collides {
                error!(
                    "Not descending into {:?}: its name collides with a sibling's link artifact",
                    src
                );
            }
            !collides
        });

        Ok(descend)
    }

    /// Remember the artifact name of `name` when a link was written
    fn note_artifact(&self, artifacts: &mut HashSet<OsString>, name: &OsStr, outcome: EntryOutcome) {
        if matches!(outcome, EntryOutcome::Linked | EntryOutcome::LinkFallback) {
            let artifact = utils::link_path(Path::new(name), &self.link_extension);
            artifacts.insert(artifact.into_os_string());
        }
    }

    /// Create `<mirrored>.<ext>` pointing at `target`
    fn link_entry(&self, target: &Path, mirrored: &Path) -> Result<EntryOutcome> {
        let link = utils::link_path(mirrored, &self.link_extension);

        match self.linker.create_link(target, &link) {
            Ok(LinkOutcome::Symlink) => Ok(EntryOutcome::Linked),
            Ok(LinkOutcome::Shortcut) => Ok(EntryOutcome::LinkFallback),
            Err(e) if e.is_shortcut_failure() => {
                error!("Failed to create shortcut {:?}: {}", link, e.source);
                Ok(EntryOutcome::Failed)
            }
            Err(e) => Err(VerisnapError::Link {
                target: target.to_path_buf(),
                link,
                source: e,
            }),
        }
    }
}

/// Name of the mirrored root for `source_root`
///
/// The base name as given, or the canonical base name for paths such as `.`.
pub fn snapshot_name(source_root: &Path) -> Result<OsString> {
    if let Some(name) = source_root.file_name() {
        return Ok(name.to_os_string());
    }

    source_root
        .canonicalize()?
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| VerisnapError::invalid_configuration(format!(
            "cannot derive a snapshot name from {:?}",
            source_root
        )))
}

/// Immediate children of `dir`, sorted by name
///
/// Unreadable entries and broken symbolic links are logged and left out.
fn list_entries(dir: &Path) -> Vec<SourceEntry> {
    let mut entries = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Error reading {:?}: {}", dir, e);
                continue;
            }
        };

        let is_symlink = entry.path_is_symlink();
        // Resolve links so they are classified by what they point at
        let metadata = if is_symlink {
            fs::metadata(entry.path())
        } else {
            entry.metadata().map_err(std::io::Error::from)
        };

        let metadata = match metadata {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping unreadable entry {:?}: {}", entry.path(), e);
                continue;
            }
        };

        let (kind, size) = if metadata.is_dir() {
            (EntryKind::Directory, 0)
        } else if metadata.is_file() {
            (EntryKind::File, metadata.len())
        } else {
            trace!("Skipping special file {:?}", entry.path());
            continue;
        };

        entries.push(SourceEntry {
            path: entry.path().to_path_buf(),
            name: entry.file_name().to_os_string(),
            kind,
            size,
            is_symlink,
        });
    }

    entries
}

/// Snapshot `source_dir` into `output_dir` with the system linker
///
/// # Returns
///
/// Bytes physically copied.
pub fn copy_directory(source_dir: &Path, output_dir: &Path, threshold: Threshold) -> Result<u64> {
    let linker = SystemLinker::default();
    let stats = SnapshotEngine::new(&linker, threshold).run(source_dir, output_dir)?;
    Ok(stats.bytes_copied)
}
