//! Configuration management for cartboost.

pub mod core;

pub use self::core::{Config, ConfigBuilder};
