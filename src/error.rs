//! Error types for verisnap
//!
//! This module defines all error types that can occur while allocating
//! versions, walking a source tree and writing a snapshot. Errors carry the
//! paths involved so the binary can report them without extra context.
//!
//! Only a handful of failures are fatal for a run (see [`VerisnapError::is_recoverable`]);
//! per-entry copy and shortcut failures are logged by the engine and never
//! surface as an error value.

use std::path::PathBuf;
use thiserror::Error;

use crate::link::LinkError;

/// Type alias for Results in the verisnap library
pub type Result<T> = std::result::Result<T, VerisnapError>;

/// Main error type for all verisnap operations
#[derive(Debug, Error)]
pub enum VerisnapError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// The directory to snapshot does not exist
    #[error("Source directory not found: {0:?}")]
    SourceNotFound(PathBuf),

    /// The root directory of a snapshot could not be created
    #[error("Failed to create snapshot root {path:?}: {source}")]
    CreateRoot {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Link creation failed for a reason other than missing privilege
    #[error("Failed to link {link:?} -> {target:?}: {source}")]
    Link {
        /// Entry the link was meant to point at
        target: PathBuf,
        /// Path of the link artifact
        link: PathBuf,
        /// Classified link failure
        #[source]
        source: LinkError,
    },

    /// A folder name does not follow the `V<n>_<timestamp>` convention
    #[error("Invalid version folder name: {0}")]
    InvalidVersionFolder(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),

    /// Custom error type for extensions
    #[error("{0}")]
    Custom(String),
}

impl VerisnapError {
    /// Create an invalid configuration error with a custom message
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        VerisnapError::InvalidConfiguration(msg.into())
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        VerisnapError::Internal(msg.into())
    }

    /// Create a custom error with a custom message
    pub fn custom(msg: impl Into<String>) -> Self {
        VerisnapError::Custom(msg.into())
    }

    /// Check if this error is recoverable
    ///
    /// A recoverable error leaves the snapshots root untouched, so the same
    /// command can simply be retried once the cause is fixed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VerisnapError::SourceNotFound(_)
                | VerisnapError::InvalidConfiguration(_)
                | VerisnapError::InvalidVersionFolder(_)
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            VerisnapError::SourceNotFound(path) => {
                format!("Source directory {:?} does not exist. Check the path and try again.", path)
            }
            VerisnapError::CreateRoot { path, .. } => {
                format!(
                    "Could not create snapshot directory {:?}. Check that the snapshots root is writable.",
                    path
                )
            }
            VerisnapError::Link { link, source, .. } => {
                format!(
                    "Could not create link {:?} ({}). The snapshot is incomplete.",
                    link, source
                )
            }
            _ => self.to_string(),
        }
    }
}
