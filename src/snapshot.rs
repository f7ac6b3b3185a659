//! Snapshot orchestration
//!
//! Ties the version allocator and the engine together: allocate the next
//! version under the snapshots root, name the version folder after it and
//! the current minute, walk the source into it, and report the result.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use verisnap::{make_snapshot, validate_threshold};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let version = make_snapshot(Path::new("./project"), Path::new("./snapshots"), validate_threshold("20"))?;
//! println!("created V{}", version);
//! # Ok(())
//! # }
//! ```
//!
//! ```rust,no_run
//! use verisnap::{LinkStrategy, SnapshotBuilder};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let snapshotter = SnapshotBuilder::new()
//!     .threshold_mb("5")
//!     .link_strategy(LinkStrategy::ShortcutOnly)
//!     .build()?;
//!
//! let summary = snapshotter.snapshot(Path::new("./project"), Path::new("./snapshots"))?;
//! println!("V{}: {} bytes copied", summary.version, summary.bytes_copied());
//! # Ok(())
//! # }
//! ```

use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::SnapshotConfig;
use crate::engine::{snapshot_name, SnapshotEngine, DEFAULT_LINK_EXTENSION};
use crate::error::{Result, VerisnapError};
use crate::link::{LinkStrategy, Linker, SystemLinker};
use crate::threshold::{validate_threshold, Threshold, ThresholdInput};
use crate::types::SnapshotSummary;
use crate::utils::format_bytes;
use crate::version;

/// Creates versioned snapshots with a fixed threshold and linker
pub struct Snapshotter {
    threshold: Threshold,
    link_extension: String,
    linker: Box<dyn Linker>,
}

impl std::fmt::Debug for Snapshotter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshotter")
            .field("threshold", &self.threshold)
            .field("link_extension", &self.link_extension)
            .field("linker", &self.linker.strategy())
            .finish()
    }
}

impl Snapshotter {
    /// Snapshotter using the system linker
    pub fn new(threshold: Threshold) -> Self {
        Self {
            threshold,
            link_extension: DEFAULT_LINK_EXTENSION.to_string(),
            linker: Box::new(SystemLinker::default()),
        }
    }

    /// Threshold in effect
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Snapshot `source_root` into a new version folder stamped with the current local time
    pub fn snapshot(&self, source_root: &Path, snapshots_root: &Path) -> Result<SnapshotSummary> {
        self.snapshot_at(source_root, snapshots_root, Local::now().naive_local())
    }

    /// Snapshot `source_root` into a new version folder stamped with `at`
    ///
    /// # Errors
    ///
    /// - [`VerisnapError::SourceNotFound`] if the source is not a directory
    /// - [`VerisnapError::Io`] if the snapshots root cannot be read or created
    /// - any fatal engine error
    #[instrument(skip(self))]
    pub fn snapshot_at(
        &self,
        source_root: &Path,
        snapshots_root: &Path,
        at: NaiveDateTime,
    ) -> Result<SnapshotSummary> {
        let start = Instant::now();

        if !source_root.is_dir() {
            return Err(VerisnapError::SourceNotFound(source_root.to_path_buf()));
        }

        let version = version::allocate_version(snapshots_root)?;
        let output_dir = snapshots_root.join(version::folder_name(version, at));

        if !snapshots_root.exists() {
            fs::create_dir_all(snapshots_root)?;
            info!("Created snapshots root {:?}", snapshots_root);
        }
        if output_dir.exists() {
            warn!("Version folder {:?} already exists, writing into it", output_dir);
        }

        // Older versions stay out of the walk when the root sits inside the source
        let engine = SnapshotEngine::new(self.linker.as_ref(), self.threshold)
            .with_link_extension(self.link_extension.clone())
            .with_excluded(snapshots_root);
        let stats = engine.run(source_root, &output_dir)?;

        let snapshot_root = output_dir.join(snapshot_name(source_root)?);

        info!(
            "Snapshot V{} created with total size: {}",
            version,
            format_bytes(stats.bytes_copied)
        );
        if stats.failures() > 0 {
            warn!("Snapshot V{} is missing {} entries, see errors above", version, stats.failures());
        }

        Ok(SnapshotSummary {
            version,
            output_dir,
            snapshot_root,
            stats,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Builder for [`Snapshotter`]
///
/// # Default Values
///
/// - threshold: 50 MB
/// - link extension: `lnk`
/// - link strategy: [`LinkStrategy::Auto`]
pub struct SnapshotBuilder {
    threshold: ThresholdInput,
    link_extension: String,
    link_strategy: LinkStrategy,
    linker: Option<Box<dyn Linker>>,
}

impl std::fmt::Debug for SnapshotBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotBuilder")
            .field("threshold", &self.threshold)
            .field("link_extension", &self.link_extension)
            .field("link_strategy", &self.link_strategy)
            .field("linker", &self.linker.is_some())
            .finish()
    }
}

impl SnapshotBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            threshold: ThresholdInput::default(),
            link_extension: DEFAULT_LINK_EXTENSION.to_string(),
            link_strategy: LinkStrategy::default(),
            linker: None,
        }
    }

    /// Builder preloaded from a config
    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::new()
            .threshold_mb(config.threshold_mb.clone())
            .link_extension(config.link_extension.clone())
            .link_strategy(config.link_strategy)
    }

    /// Set the threshold in megabytes; validated by [`SnapshotBuilder::build`]
    pub fn threshold_mb(mut self, threshold: impl Into<ThresholdInput>) -> Self {
        self.threshold = threshold.into();
        self
    }

    /// Set the suffix of link artifacts, without the dot
    pub fn link_extension(mut self, extension: impl Into<String>) -> Self {
        self.link_extension = extension.into();
        self
    }

    /// Set how link artifacts are produced
    pub fn link_strategy(mut self, strategy: LinkStrategy) -> Self {
        self.link_strategy = strategy;
        self
    }

    /// Use a custom linker; the link strategy setting is then ignored
    pub fn linker(mut self, linker: Box<dyn Linker>) -> Self {
        self.linker = Some(linker);
        self
    }

    /// Build the snapshotter
    ///
    /// # Errors
    ///
    /// Returns [`VerisnapError::InvalidConfiguration`] for an unusable link
    /// extension. An invalid threshold is replaced by the default instead.
    pub fn build(self) -> Result<Snapshotter> {
        let config = SnapshotConfig {
            link_extension: self.link_extension.clone(),
            ..Default::default()
        };
        config.validate()?;

        let linker = self
            .linker
            .unwrap_or_else(|| Box::new(SystemLinker::new(self.link_strategy)));

        Ok(Snapshotter {
            threshold: validate_threshold(self.threshold),
            link_extension: self.link_extension,
            linker,
        })
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new snapshot of `source_root` under `snapshots_root`
///
/// # Returns
///
/// The allocated version number. The copied byte total is logged.
pub fn make_snapshot(source_root: &Path, snapshots_root: &Path, threshold: Threshold) -> Result<u64> {
    make_snapshot_with_summary(source_root, snapshots_root, threshold).map(|summary| summary.version)
}

/// Like [`make_snapshot`], returning the full summary
pub fn make_snapshot_with_summary(
    source_root: &Path,
    snapshots_root: &Path,
    threshold: Threshold,
) -> Result<SnapshotSummary> {
    Snapshotter::new(threshold).snapshot(source_root, snapshots_root)
}
