//! Link creation for entries that are too large to copy
//!
//! Large files and directories are represented in a snapshot by a link
//! artifact named `<mirrored-path>.lnk`. The preferred artifact is a real
//! symbolic link. When the process lacks the privilege to create symbolic
//! links (unprivileged Windows accounts, some mounted filesystems), a small
//! shortcut file pointing at the same target is written instead.
//!
//! The two steps are exposed through the [`Linker`] trait so the engine can
//! be driven by a fake in tests:
//!
//! ```rust,no_run
//! use verisnap::link::{Linker, SystemLinker, LinkOutcome};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let linker = SystemLinker::default();
//! match linker.create_link(Path::new("/data/video.mp4"), Path::new("/snap/video.mp4.lnk"))? {
//!     LinkOutcome::Symlink => println!("symbolic link created"),
//!     LinkOutcome::Shortcut => println!("fell back to a shortcut file"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Shortcut file format
//!
//! ```text
//! [verisnap-shortcut]
//! target=C:/Users/me/data/video.mp4
//! description=Shortcut to C:\Users\me\data\video.mp4
//! ```
//!
//! The target is stored with forward slashes regardless of platform.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::utils;

/// Header line identifying a shortcut file
pub const SHORTCUT_HEADER: &str = "[verisnap-shortcut]";

/// Windows `ERROR_PRIVILEGE_NOT_HELD`
#[cfg(windows)]
const ERROR_PRIVILEGE_NOT_HELD: i32 = 1314;

/// `EPERM`; `EACCES` (an unwritable directory) is not a privilege problem
#[cfg(not(windows))]
const EPERM: i32 = 1;

/// What kind of link artifact was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkOutcome {
    /// A true symbolic link
    Symlink,
    /// A shortcut file, written because symbolic links were not permitted
    Shortcut,
}

/// Classification of a link failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkErrorKind {
    /// The process may not create symbolic links
    InsufficientPrivilege,
    /// Writing the fallback shortcut file failed
    ShortcutFailed,
    /// Any other failure
    Other,
}

/// Error returned by a [`Linker`] step
#[derive(Debug, Error)]
#[error("{kind:?}: {source}")]
pub struct LinkError {
    /// Classified cause
    pub kind: LinkErrorKind,
    /// Underlying I/O error
    #[source]
    pub source: io::Error,
}

impl LinkError {
    /// Classify an I/O error returned by symbolic link creation
    pub fn from_symlink_error(source: io::Error) -> Self {
        let kind = if is_privilege_error(&source) {
            LinkErrorKind::InsufficientPrivilege
        } else {
            LinkErrorKind::Other
        };
        Self { kind, source }
    }

    /// Wrap an I/O error returned by shortcut creation
    pub fn shortcut(source: io::Error) -> Self {
        Self {
            kind: LinkErrorKind::ShortcutFailed,
            source,
        }
    }

    /// True when symbolic links are not permitted for this process
    pub fn is_privilege(&self) -> bool {
        self.kind == LinkErrorKind::InsufficientPrivilege
    }

    /// True when the fallback shortcut could not be written
    pub fn is_shortcut_failure(&self) -> bool {
        self.kind == LinkErrorKind::ShortcutFailed
    }
}

#[cfg(windows)]
fn is_privilege_error(err: &io::Error) -> bool {
    err.raw_os_error() == Some(ERROR_PRIVILEGE_NOT_HELD)
}

#[cfg(not(windows))]
fn is_privilege_error(err: &io::Error) -> bool {
    err.raw_os_error() == Some(EPERM)
}

/// How link artifacts are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStrategy {
    /// Symbolic link, shortcut file when symlinks are not permitted
    #[default]
    Auto,
    /// Always write a shortcut file
    ShortcutOnly,
}

/// Capability for creating link artifacts
///
/// Implementors provide the two primitive steps; [`Linker::create_link`]
/// combines them: try a symbolic link, and on an
/// [`LinkErrorKind::InsufficientPrivilege`] result write a shortcut instead.
/// Every other symlink failure is returned unchanged.
pub trait Linker {
    /// Create a true symbolic link at `link` pointing at `target`
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), LinkError>;

    /// Create a shortcut file at `link` pointing at `target`
    fn shortcut(&self, target: &Path, link: &Path) -> Result<(), LinkError>;

    /// Link strategy in effect
    fn strategy(&self) -> LinkStrategy {
        LinkStrategy::Auto
    }

    /// Create a link artifact, falling back to a shortcut on missing privilege
    fn create_link(&self, target: &Path, link: &Path) -> Result<LinkOutcome, LinkError> {
        if self.strategy() == LinkStrategy::ShortcutOnly {
            self.shortcut(target, link)?;
            return Ok(LinkOutcome::Shortcut);
        }

        match self.symlink(target, link) {
            Ok(()) => {
                info!("Created symbolic link for {:?} at {:?}", target, link);
                Ok(LinkOutcome::Symlink)
            }
            Err(e) if e.is_privilege() => {
                warn!("Symbolic links not permitted for {:?} ({}), writing shortcut", link, e.source);
                self.shortcut(target, link)?;
                info!("Created shortcut for {:?} at {:?}", target, link);
                Ok(LinkOutcome::Shortcut)
            }
            Err(e) => Err(e),
        }
    }
}

/// [`Linker`] backed by the host filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinker {
    strategy: LinkStrategy,
}

impl SystemLinker {
    /// Create a linker using the given strategy
    pub fn new(strategy: LinkStrategy) -> Self {
        Self { strategy }
    }
}

impl Linker for SystemLinker {
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), LinkError> {
        utils::create_symlink(target, link).map_err(LinkError::from_symlink_error)
    }

    fn shortcut(&self, target: &Path, link: &Path) -> Result<(), LinkError> {
        write_shortcut(target, link).map_err(LinkError::shortcut)
    }

    fn strategy(&self) -> LinkStrategy {
        self.strategy
    }
}

/// Write a shortcut file at `link` pointing at `target`
pub fn write_shortcut(target: &Path, link: &Path) -> io::Result<()> {
    let content = format!(
        "{}\ntarget={}\ndescription=Shortcut to {}\n",
        SHORTCUT_HEADER,
        utils::normalize_path(target),
        target.display()
    );
    fs::write(link, content)?;
    trace!("Wrote shortcut {:?}", link);
    Ok(())
}

/// Read the target of a shortcut file
///
/// Returns `Ok(None)` when the file exists but is not a shortcut.
pub fn read_shortcut(link: &Path) -> io::Result<Option<PathBuf>> {
    let bytes = fs::read(link)?;
    let Ok(content) = std::str::from_utf8(&bytes) else {
        return Ok(None);
    };

    let mut lines = content.lines();
    if lines.next() != Some(SHORTCUT_HEADER) {
        return Ok(None);
    }

    Ok(lines
        .find_map(|line| line.strip_prefix("target="))
        .map(PathBuf::from))
}
