//! Copy/link size threshold
//!
//! Users give the threshold in megabytes. It is validated and normalized
//! into bytes once, at the start of a run, and from then on only the
//! [`Threshold`] value travels through the engine.
//!
//! Validation never fails: anything that is not a number in `(0, 100]`
//! is replaced by [`DEFAULT_THRESHOLD_MB`] and a warning is logged.
//!
//! ```rust
//! use verisnap::threshold::{validate_threshold, Threshold};
//!
//! assert_eq!(validate_threshold("10").bytes(), 10 * 1024 * 1024);
//! assert_eq!(validate_threshold("abc"), Threshold::default());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::error::{Result, VerisnapError};
use crate::utils::format_bytes;

/// Default threshold in megabytes
pub const DEFAULT_THRESHOLD_MB: u64 = 50;

/// Largest accepted threshold in megabytes
pub const MAX_THRESHOLD_MB: f64 = 100.0;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Size boundary in bytes; entries at or below it are copied
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Threshold(u64);

impl Threshold {
    /// Build a threshold from a byte count
    ///
    /// # Errors
    ///
    /// Returns [`VerisnapError::InvalidConfiguration`] for zero.
    pub fn from_bytes(bytes: u64) -> Result<Self> {
        if bytes == 0 {
            return Err(VerisnapError::invalid_configuration(
                "threshold must be greater than 0 bytes",
            ));
        }
        Ok(Self(bytes))
    }

    /// Threshold in bytes
    pub fn bytes(self) -> u64 {
        self.0
    }

    /// True when an entry of `size` bytes must be copied rather than linked
    pub fn allows(self, size: u64) -> bool {
        size <= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD_MB * BYTES_PER_MB)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_bytes(self.0))
    }
}

/// Raw threshold as supplied by a user or a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdInput {
    /// Numeric megabytes
    Megabytes(f64),
    /// Unparsed text, e.g. a command-line argument
    Text(String),
}

impl Default for ThresholdInput {
    fn default() -> Self {
        ThresholdInput::Megabytes(DEFAULT_THRESHOLD_MB as f64)
    }
}

impl From<f64> for ThresholdInput {
    fn from(value: f64) -> Self {
        ThresholdInput::Megabytes(value)
    }
}

impl From<u64> for ThresholdInput {
    fn from(value: u64) -> Self {
        ThresholdInput::Megabytes(value as f64)
    }
}

impl From<&str> for ThresholdInput {
    fn from(value: &str) -> Self {
        ThresholdInput::Text(value.to_string())
    }
}

impl From<String> for ThresholdInput {
    fn from(value: String) -> Self {
        ThresholdInput::Text(value)
    }
}

impl fmt::Display for ThresholdInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdInput::Megabytes(value) => write!(f, "{}", value),
            ThresholdInput::Text(text) => f.write_str(text),
        }
    }
}

/// Validate a megabyte threshold and convert it to bytes
///
/// - non-numeric input → default, with a warning
/// - `<= 0` → default, with a warning
/// - `> 100` → default, with a warning (large values are treated as a unit mistake)
/// - otherwise `value * 1024 * 1024`, truncated to whole bytes and at least 1
pub fn validate_threshold(input: impl Into<ThresholdInput>) -> Threshold {
    let input = input.into();
    let value = match &input {
        ThresholdInput::Megabytes(value) => Some(*value),
        ThresholdInput::Text(text) => text.trim().parse::<f64>().ok(),
    };

    let Some(value) = value.filter(|v| !v.is_nan()) else {
        warn!(
            "Invalid threshold input: '{}'. Using default value of {} MB.",
            input, DEFAULT_THRESHOLD_MB
        );
        return Threshold::default();
    };

    if value <= 0.0 {
        warn!(
            "Invalid threshold value: {}. Threshold must be greater than 0. Using default value: {} MB.",
            input, DEFAULT_THRESHOLD_MB
        );
        return Threshold::default();
    }

    if value > MAX_THRESHOLD_MB {
        warn!(
            "Threshold value {} MB seems too high. Please provide a value in MB. Defaulting to {} MB.",
            value, DEFAULT_THRESHOLD_MB
        );
        return Threshold::default();
    }

    let bytes = ((value * BYTES_PER_MB as f64) as u64).max(1);
    info!("Using threshold of {} MB ({} bytes)", value, bytes);
    Threshold(bytes)
}
