//! Version folder allocation
//!
//! Every snapshot lands in a folder named `V<version>_<YYYY>_<MM>_<DD>_<HH>_<mm>`
//! under the snapshots root. The next version is one more than the highest
//! version found there; folders and files that do not follow the naming
//! convention are ignored.
//!
//! ```rust
//! use verisnap::version::{folder_name, parse_version};
//! use chrono::NaiveDate;
//!
//! let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 30, 0).unwrap();
//! assert_eq!(folder_name(3, at), "V3_2024_01_01_10_30");
//! assert_eq!(parse_version("V3_2024_01_01_10_30"), Some(3));
//! assert_eq!(parse_version("backup_old"), None);
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::{Result, VerisnapError};

/// Timestamp layout of version folder names, minute precision
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M";

/// A snapshot folder found under the snapshots root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFolder {
    /// Version number encoded in the name
    pub version: u64,
    /// Creation time encoded in the name, if it parses
    pub created_at: Option<NaiveDateTime>,
    /// Folder name
    pub name: String,
    /// Full path
    pub path: PathBuf,
}

impl VersionFolder {
    /// Parse a folder name following the version convention
    ///
    /// # Errors
    ///
    /// Returns [`VerisnapError::InvalidVersionFolder`] when the name does not
    /// start with `V<digits>_`.
    pub fn parse(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| VerisnapError::InvalidVersionFolder(path.display().to_string()))?;

        let (version, rest) = split_version(name)
            .ok_or_else(|| VerisnapError::InvalidVersionFolder(name.to_string()))?;

        Ok(Self {
            version,
            created_at: NaiveDateTime::parse_from_str(rest, TIMESTAMP_FORMAT).ok(),
            name: name.to_string(),
            path: path.to_path_buf(),
        })
    }
}

/// Split `V<digits>_<rest>` into the version and `<rest>`
fn split_version(name: &str) -> Option<(u64, &str)> {
    let tail = name.strip_prefix('V')?;
    let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let rest = tail[digits..].strip_prefix('_')?;
    let version = tail[..digits].parse().ok()?;
    Some((version, rest))
}

/// Version encoded in a folder name, or `None` if it does not match
pub fn parse_version(name: &str) -> Option<u64> {
    split_version(name).map(|(version, _)| version)
}

/// Build the folder name for `version` created at `at`
pub fn folder_name(version: u64, at: NaiveDateTime) -> String {
    format!("V{}_{}", version, at.format(TIMESTAMP_FORMAT))
}

/// All version folders directly under `snapshots_root`, ordered by version
///
/// A missing root yields an empty list.
pub fn list_versions(snapshots_root: &Path) -> Result<Vec<VersionFolder>> {
    if !snapshots_root.exists() {
        return Ok(Vec::new());
    }

    let mut folders = Vec::new();
    for entry in fs::read_dir(snapshots_root)? {
        let entry = entry?;
        // Follows symlinks, so a linked version folder still counts
        if !entry.path().is_dir() {
            continue;
        }

        match VersionFolder::parse(&entry.path()) {
            Ok(folder) => folders.push(folder),
            Err(_) => trace!("Ignoring non-version entry {:?}", entry.path()),
        }
    }

    folders.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.name.cmp(&b.name)));
    Ok(folders)
}

/// Highest version under `snapshots_root`, 0 when there is none
pub fn latest_version(snapshots_root: &Path) -> Result<u64> {
    Ok(list_versions(snapshots_root)?
        .iter()
        .map(|folder| folder.version)
        .max()
        .unwrap_or(0))
}

/// Next version number to allocate under `snapshots_root`
///
/// Returns `1 + max(existing)`, or 1 when the root is missing or holds no
/// version folder.
pub fn allocate_version(snapshots_root: &Path) -> Result<u64> {
    let latest = latest_version(snapshots_root)?;
    let next = latest + 1;
    debug!("Allocated version {} under {:?}", next, snapshots_root);
    Ok(next)
}
