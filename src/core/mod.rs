//! Core infrastructure module for cartboost.
//!
//! - [`types`]: scalar aliases and the verbosity enum
//! - [`constants`]: defaults and hard limits
//! - [`error`]: the crate-wide error type

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{CartError, Result};
pub use types::*;

static LOGGING_INIT: std::sync::Once = std::sync::Once::new();

/// Initialize the logging subsystem.
///
/// Sets `RUST_LOG` to `default_filter` when it is unset, then installs
/// `env_logger`. Calling this more than once is harmless.
pub fn initialize_logging(default_filter: &str) {
    LOGGING_INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", default_filter);
        }

        // Another logger may already be installed by the host application.
        let _ = env_logger::builder().format_timestamp_millis().try_init();
    });
}
