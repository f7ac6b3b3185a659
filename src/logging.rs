//! Log configuration
//!
//! The library only emits `tracing` events. Where they go is decided by the
//! caller through a [`LogConfig`], which the binary installs once at startup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{Result, VerisnapError};

/// Minimum severity of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-entry decisions and internal detail
    Debug,
    /// Progress, skipped entries, threshold adjustments
    #[default]
    Info,
    /// Input corrections
    Warning,
    /// Operation failures only
    Error,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Where and how log events are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level
    pub level: LogLevel,
    /// Include the event target (module path)
    pub with_target: bool,
    /// Colored output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_target: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Filter for this config; `RUST_LOG` wins when it is set
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.directive()))
    }

    /// Install a global fmt subscriber writing to stderr
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber is already installed.
    pub fn install(&self) -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_target(self.with_target)
            .with_ansi(self.ansi)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| VerisnapError::internal(format!("failed to install logger: {}", e)))
    }
}
