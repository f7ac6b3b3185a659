//! # Verisnap - Versioned, space-bounded directory snapshots
//!
//! Takes snapshots of a directory tree into sequentially numbered version
//! folders, copying small files and linking large ones back to the source.
//!
//! ## Overview
//!
//! Each snapshot run:
//! - Allocates the next version under a snapshots root (`1 + highest existing`)
//! - Creates `V<version>_<YYYY>_<MM>_<DD>_<HH>_<mm>/<source name>/`
//! - Mirrors every visited directory
//! - Copies files at or below the size threshold, preserving timestamps
//! - Replaces larger files, and directories whose direct files exceed the
//!   threshold, by a `<name>.lnk` link to the absolute source path
//!
//! Links are symbolic links when the platform allows them. When creating one
//! fails for lack of privilege, a small shortcut file is written instead.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verisnap::{make_snapshot, validate_threshold};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Anything above 20 MB is linked instead of copied
//! let threshold = validate_threshold("20");
//!
//! let version = make_snapshot(Path::new("./project"), Path::new("./snapshots"), threshold)?;
//! println!("Created snapshot V{}", version);
//! # Ok(())
//! # }
//! ```
//!
//! ## Advanced Usage
//!
//! ### Using SnapshotBuilder
//!
//! ```rust,no_run
//! use verisnap::{LinkStrategy, SnapshotBuilder};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let snapshotter = SnapshotBuilder::new()
//!     .threshold_mb(5.0)
//!     .link_strategy(LinkStrategy::ShortcutOnly)
//!     .build()?;
//!
//! let summary = snapshotter.snapshot(Path::new("./project"), Path::new("./snapshots"))?;
//! println!(
//!     "V{}: {} files copied, {} linked, {} failures",
//!     summary.version,
//!     summary.stats.files_copied,
//!     summary.stats.files_linked,
//!     summary.stats.failures()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ### Verifying a Snapshot
//!
//! ```rust,no_run
//! use verisnap::{verify_snapshot, SnapshotBuilder};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = SnapshotBuilder::new()
//!     .build()?
//!     .snapshot(Path::new("./project"), Path::new("./snapshots"))?;
//!
//! let report = verify_snapshot(&summary.snapshot_root, Path::new("./project"))?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! ### Threshold
//!
//! Given in megabytes and validated leniently: anything that is not a number
//! in `(0, 100]` is replaced by 50 MB with a warning. A file exactly at the
//! threshold is copied.
//!
//! ### Directory Size
//!
//! A directory's size is the sum of the regular files directly inside it.
//! Nested subdirectories do not count, so a directory holding only large
//! nested content is descended into rather than linked.
//!
//! ### Failures
//!
//! Per-entry copy failures and shortcut failures are logged and skipped; the
//! run continues. A failure to create the mirrored root, or a link failure
//! that is not a privilege problem, aborts the run.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], with [`VerisnapError`]
//! carrying the failing path where there is one.
//!
//! ## Module Organization
//!
//! - [`snapshot`] - Version allocation plus engine run, and the builder
//! - [`engine`] - The copy-or-link tree walk
//! - [`link`] - Symlink creation with shortcut fallback
//! - [`threshold`] - Threshold validation
//! - [`version`] - Version folder naming and allocation
//! - [`verification`] - Comparing a snapshot with its source
//! - [`config`] / [`logging`] - JSON configuration and log setup

// Public API modules
pub mod config;
pub mod engine;
pub mod error;
pub mod link;
pub mod logging;
pub mod snapshot;
pub mod threshold;
pub mod types;
pub mod verification;
pub mod version;

// Internal modules (not part of public API)
mod utils;

// Re-export main types for convenience
pub use config::SnapshotConfig;
pub use engine::{copy_directory, SnapshotEngine};
pub use error::{Result, VerisnapError};
pub use link::{LinkStrategy, Linker, SystemLinker};
pub use logging::{LogConfig, LogLevel};
pub use snapshot::{make_snapshot, make_snapshot_with_summary, SnapshotBuilder, Snapshotter};
pub use threshold::{validate_threshold, Threshold, ThresholdInput};
pub use types::*;
pub use utils::format_bytes;
pub use verification::{verify_snapshot, SnapshotVerifier, VerificationReport};
pub use version::{allocate_version, list_versions, VersionFolder};
