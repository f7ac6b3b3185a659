//! Snapshot configuration
//!
//! A [`SnapshotConfig`] can be written as JSON and loaded with
//! [`SnapshotConfig::from_json_file`]; every field has a default so a config
//! file only needs to name what it changes.
//!
//! ```json
//! {
//!   "source_root": "/home/me/project",
//!   "snapshots_root": "/backups/project",
//!   "threshold_mb": 20,
//!   "link_strategy": "auto",
//!   "log": { "level": "info" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::DEFAULT_LINK_EXTENSION;
use crate::error::{Result, VerisnapError};
use crate::link::LinkStrategy;
use crate::logging::LogConfig;
use crate::threshold::ThresholdInput;

/// Default snapshots root, relative to the working directory
pub const DEFAULT_SNAPSHOTS_ROOT: &str = "snapshots";

/// Configuration for a snapshot run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Directory to snapshot
    pub source_root: Option<PathBuf>,
    /// Directory holding the version folders
    pub snapshots_root: PathBuf,
    /// Threshold in megabytes, validated at the start of a run
    pub threshold_mb: ThresholdInput,
    /// Suffix of link artifacts, without the dot
    pub link_extension: String,
    /// How link artifacts are produced
    pub link_strategy: LinkStrategy,
    /// Logging
    pub log: LogConfig,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            source_root: None,
            snapshots_root: PathBuf::from(DEFAULT_SNAPSHOTS_ROOT),
            threshold_mb: ThresholdInput::default(),
            link_extension: DEFAULT_LINK_EXTENSION.to_string(),
            link_strategy: LinkStrategy::default(),
            log: LogConfig::default(),
        }
    }
}

impl SnapshotConfig {
    /// Load a config from a JSON file
    ///
    /// # Errors
    ///
    /// - [`VerisnapError::Io`] if the file cannot be read
    /// - [`VerisnapError::Json`] if it is not valid JSON for this struct
    /// - [`VerisnapError::InvalidConfiguration`] if a field is unusable
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check fields that cannot be corrected silently
    ///
    /// The threshold is not checked here; invalid thresholds fall back to the
    /// default when the run starts.
    pub fn validate(&self) -> Result<()> {
        if self.link_extension.is_empty()
            || self.link_extension.contains(['/', '\\'])
            || self.link_extension.starts_with('.')
        {
            return Err(VerisnapError::invalid_configuration(format!(
                "link extension {:?} must be a non-empty suffix without dots or separators",
                self.link_extension
            )));
        }

        if self.snapshots_root.as_os_str().is_empty() {
            return Err(VerisnapError::invalid_configuration("snapshots root is empty"));
        }

        Ok(())
    }
}
