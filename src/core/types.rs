//! Core data types for cartboost.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instance indexing type. 32-bit, matching the on-disk instance counts.
pub type InstanceIndex = u32;

/// Feature index in the flattened `[dense.., sparse..]` feature space.
pub type FeatureIndex = usize;

/// 1-based implicit heap index of a tree node.
pub type NodeIndex = u32;

/// Feature values, residuals, and leaf outputs.
pub type Score = f32;

/// Label type; training labels are always `-1.0` or `+1.0`.
pub type Label = f32;

/// Accumulation type for residual sums.
pub type Hist = f64;

/// Logging verbosity used when the library bootstraps `env_logger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Only errors
    Error,
    /// Errors and warnings
    Warn,
    /// Per-round progress lines
    #[default]
    Info,
    /// Per-level split summaries
    Debug,
    /// Everything, including degenerate leaves
    Trace,
}

impl Verbosity {
    /// The `env_logger` filter string for this level.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

impl std::str::FromStr for Verbosity {
    type Err = crate::core::error::CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Verbosity::Error),
            "warn" => Ok(Verbosity::Warn),
            "info" => Ok(Verbosity::Info),
            "debug" => Ok(Verbosity::Debug),
            "trace" => Ok(Verbosity::Trace),
            other => Err(crate::core::error::CartError::invalid_parameter(
                "verbosity",
                other,
                "expected one of error, warn, info, debug, trace",
            )),
        }
    }
}
