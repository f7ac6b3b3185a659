//! Utility functions for verisnap
//!
//! Filesystem helpers shared by the engine, the version allocator and the
//! verifier.
//!
//! ## Categories of Utilities
//!
//! ### File Operations
//! - Copying a file together with its permissions and timestamps
//! - One-level directory sizing
//! - File content hashing (SHA-256)
//! - Symbolic link creation (cross-platform)
//!
//! ### Path Manipulation
//! - Converting absolute paths to relative paths
//! - Slash-consistent path rendering
//! - Appending the link suffix to a mirrored path
//!
//! ### Formatting
//! - Byte formatting (human-readable sizes)
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use crate::utils::{copy_with_metadata, format_bytes};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let copied = copy_with_metadata(Path::new("notes.txt"), Path::new("snap/notes.txt"))?;
//! println!("Copied {}", format_bytes(copied)); // "1.50 KB"
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, VerisnapError};
use filetime::FileTime;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Hash a file's content efficiently using SHA-256
///
/// Reads the file in 8KB chunks and returns the digest as a 64-character
/// hexadecimal string.
///
/// # Errors
///
/// - [`VerisnapError::Io`] if the file cannot be opened or read
pub fn hash_file_content(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192]; // 8KB buffer

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Copy a file and carry over its permissions and timestamps
///
/// Content and permission bits are copied by [`fs::copy`]; access and
/// modification times are then applied to the destination. A failure to set
/// the timestamps is logged and does not fail the copy, since the content is
/// already in place.
///
/// # Returns
///
/// Number of bytes copied.
///
/// # Errors
///
/// Returns the I/O error of the content copy, or
/// [`io::ErrorKind::AlreadyExists`] when `dest` is a symbolic link. Copying
/// through a link would write into whatever it points at.
pub fn copy_with_metadata(source: &Path, dest: &Path) -> io::Result<u64> {
    if fs::symlink_metadata(dest).is_ok_and(|meta| meta.file_type().is_symlink()) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{:?} is a symbolic link", dest),
        ));
    }

    let metadata = fs::metadata(source)?;
    let copied = fs::copy(source, dest)?;

    let atime = FileTime::from_last_access_time(&metadata);
    let mtime = FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_times(dest, atime, mtime) {
        warn!("Failed to preserve timestamps on {:?}: {}", dest, e);
    }

    trace!("Copied {:?} -> {:?} ({} bytes)", source, dest, copied);
    Ok(copied)
}

/// Total size of the regular files directly inside `dir`
///
/// Subdirectories are not descended into. Symbolic links are followed, so a
/// link to a regular file counts with the size of its target. Entries whose
/// metadata cannot be read are skipped.
pub fn shallow_dir_size(dir: &Path) -> io::Result<u64> {
    let mut total = 0u64;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        match fs::metadata(entry.path()) {
            Ok(metadata) if metadata.is_file() => total += metadata.len(),
            Ok(_) => {}
            Err(e) => trace!("Skipping {:?} while sizing {:?}: {}", entry.path(), dir, e),
        }
    }

    Ok(total)
}

/// Append the link extension to a mirrored path
///
/// `snap/video.mp4` with extension `lnk` becomes `snap/video.mp4.lnk`; the
/// existing extension is kept.
pub fn link_path(mirrored: &Path, extension: &str) -> PathBuf {
    let mut name: OsString = mirrored.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Render a path with forward slashes only
///
/// Backslash separators are rewritten and `.` components dropped, so the
/// same target renders identically on every platform.
pub fn normalize_path(path: &Path) -> String {
    let rendered = path.to_string_lossy().replace('\\', "/");
    let mut normalized = rendered
        .split('/')
        .enumerate()
        .filter(|(idx, part)| *idx == 0 || (!part.is_empty() && *part != "."))
        .map(|(_, part)| part)
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        normalized.push('.');
    }
    normalized
}

/// Make a path relative to a base path
///
/// The strip is lexical, so symbolic links inside the path are kept as they
/// are.
///
/// # Errors
///
/// - [`VerisnapError::Internal`] if the path is not under the base path
pub fn make_relative(path: &Path, base: &Path) -> Result<PathBuf> {
    path.strip_prefix(base)
        .map(|p| p.to_path_buf())
        .map_err(|_| VerisnapError::internal(format!(
            "Path {:?} is not relative to {:?}",
            path, base
        )))
}

/// Format bytes in human-readable form
///
/// Uses 1024 as the conversion factor. Values below 1 KB are printed as
/// whole bytes, larger values with two decimals.
///
/// ```rust,ignore
/// use crate::utils::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 B");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// assert_eq!(format_bytes(52_428_800), "50.00 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Create a symlink (cross-platform)
#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    use std::os::unix::fs::symlink;
    symlink(target, link)
}

/// Create a symlink (Windows)
#[cfg(windows)]
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    use std::os::windows::fs::{symlink_dir, symlink_file};

    if target.is_dir() {
        symlink_dir(target, link)
    } else {
        symlink_file(target, link)
    }
}
