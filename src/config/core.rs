//! Core configuration structure and builder for cartboost.
//!
//! The configuration is an explicit value handed to [`crate::GBDT::new`] and
//! [`crate::Tree::new`]; nothing about tree shape lives in global state.

use crate::core::constants::*;
use crate::core::error::{CartError, Result};
use crate::core::types::Verbosity;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Training configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of split levels per tree
    pub max_depth: usize,
    /// Number of boosting rounds
    pub num_trees: usize,
    /// Worker threads used by the split search and per-instance loops
    pub num_threads: usize,
    /// Log level installed by the command-line trainer
    pub verbosity: Verbosity,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            num_trees: DEFAULT_NUM_TREES,
            num_threads: DEFAULT_NUM_THREADS,
            verbosity: Verbosity::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate all parameters.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth < 1 || self.max_depth > MAX_TREE_DEPTH {
            return Err(CartError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                format!("must be in range [1, {}]", MAX_TREE_DEPTH),
            ));
        }

        if self.num_trees < 1 {
            return Err(CartError::invalid_parameter(
                "num_trees",
                self.num_trees.to_string(),
                "must be at least 1",
            ));
        }

        if self.num_threads < 1 || self.num_threads > MAX_NUM_THREADS {
            return Err(CartError::invalid_parameter(
                "num_threads",
                self.num_threads.to_string(),
                format!("must be in range [1, {}]", MAX_NUM_THREADS),
            ));
        }

        Ok(())
    }

    /// Load configuration from a `.toml` or `.json` file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CartError::config(format!("Failed to read config file: {}", e)))?;

        let config: Config = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => {
                return Err(crate::config_error!(
                    "Unsupported config file format {}. Use .json or .toml",
                    path.display()
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.toml` or `.json` file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| CartError::config(format!("Failed to serialize to TOML: {}", e)))?,
            _ => {
                return Err(crate::config_error!(
                    "Unsupported config file format {}. Use .json or .toml",
                    path.display()
                ))
            }
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from `CARTBOOST_*` environment variables.
    pub fn load_from_environment() -> Result<Self> {
        let mut config = Config::default();
        config.read_environment(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply any `CARTBOOST_*` environment variables on top of this configuration.
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.read_environment(|key| std::env::var(key).ok())?;
        self.validate()
    }

    fn read_environment<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |name: &str| -> Result<Option<usize>> {
            let key = format!("{}{}", ENV_PREFIX, name);
            match lookup(&key) {
                Some(val) => val
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| CartError::config(format!("Invalid {}", key))),
                None => Ok(None),
            }
        };

        if let Some(v) = parse("MAX_DEPTH")? {
            self.max_depth = v;
        }
        if let Some(v) = parse("NUM_TREES")? {
            self.num_trees = v;
        }
        if let Some(v) = parse("NUM_THREADS")? {
            self.num_threads = v;
        }

        let key = format!("{}VERBOSITY", ENV_PREFIX);
        if let Some(val) = lookup(&key) {
            self.verbosity = val.trim().parse()?;
        }

        Ok(())
    }

    /// Build the worker pool every fit runs inside.
    pub fn build_thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .thread_name(|i| format!("cartboost-worker-{}", i))
            .build()
            .map_err(|e| CartError::config(format!("Failed to build thread pool: {}", e)))
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Set the tree depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set the number of boosting rounds
    pub fn num_trees(mut self, trees: usize) -> Self {
        self.config.num_trees = trees;
        self
    }

    /// Set the worker thread count
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Set the log verbosity
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
