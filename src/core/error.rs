//! Error handling and error types for cartboost.
//!
//! Configuration and data-consistency problems are reported through
//! [`CartError`] before any tree is fit. Numerical degeneracy inside a fit
//! (for example a leaf whose Newton denominator vanishes) is handled locally
//! and never surfaces here.

use std::io;
use thiserror::Error;

/// Main error type for the cartboost library.
#[derive(Error, Debug)]
pub enum CartError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Dataset consistency errors detected while building a dataset
    #[error("Dataset error: {message}")]
    Dataset {
        /// What was wrong
        message: String,
    },

    /// Shape mismatch between related inputs
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected shape
        expected: String,
        /// Shape received
        actual: String,
    },

    /// Text parsing errors while reading dense or sparse files
    #[error("Data loading error in {path} at line {line}: {message}")]
    DataLoading {
        /// File being read
        path: String,
        /// 1-based line number, 0 when not tied to a line
        line: usize,
        /// What was wrong
        message: String,
    },

    /// Prediction errors
    #[error("Prediction error: {message}")]
    Prediction {
        /// What was wrong
        message: String,
    },

    /// Model serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// What was wrong
        message: String,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Rejected value
        value: String,
        /// Accepted range or rule
        reason: String,
    },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        /// Underlying error
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        /// Underlying error
        #[from]
        source: serde_json::Error,
    },

    /// TOML configuration errors
    #[error("TOML error: {source}")]
    Toml {
        /// Underlying error
        #[from]
        source: toml::de::Error,
    },
}

/// Type alias for Results using CartError
pub type Result<T> = std::result::Result<T, CartError>;

impl CartError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        CartError::Config {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        CartError::Dataset {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        CartError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a data loading error pointing at a file position
    pub fn data_loading<P, S>(path: P, line: usize, message: S) -> Self
    where
        P: Into<String>,
        S: Into<String>,
    {
        CartError::DataLoading {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a prediction error
    pub fn prediction<S: Into<String>>(message: S) -> Self {
        CartError::Prediction {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        CartError::Serialization {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        CartError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            CartError::Config { .. } => false,
            CartError::Dataset { .. } => false,
            CartError::DimensionMismatch { .. } => false,
            CartError::DataLoading { .. } => false,
            CartError::Prediction { .. } => true,
            CartError::Serialization { .. } => false,
            CartError::InvalidParameter { .. } => false,
            CartError::IO { .. } => false,
            CartError::Json { .. } => false,
            CartError::Toml { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            CartError::Config { .. } => "config",
            CartError::Dataset { .. } => "dataset",
            CartError::DimensionMismatch { .. } => "dimension_mismatch",
            CartError::DataLoading { .. } => "data_loading",
            CartError::Prediction { .. } => "prediction",
            CartError::Serialization { .. } => "serialization",
            CartError::InvalidParameter { .. } => "invalid_parameter",
            CartError::IO { .. } => "io",
            CartError::Json { .. } => "json",
            CartError::Toml { .. } => "toml",
        }
    }
}

/// Build a [`CartError::Config`] from a message or format string.
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::CartError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::CartError::config(format!($fmt, $($arg)*))
    };
}

/// Build a [`CartError::Dataset`] from a message or format string.
#[macro_export]
macro_rules! dataset_error {
    ($msg:expr) => {
        $crate::core::error::CartError::dataset($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::CartError::dataset(format!($fmt, $($arg)*))
    };
}

/// Return `Err($err)` from the enclosing function unless `$cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
