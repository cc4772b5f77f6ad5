//! # cartboost
//!
//! Gradient boosted binary classification trees over mixed dense/sparse
//! tabular data.
//!
//! Every tree has a fixed depth and is grown level by level: at each level a
//! parallel split search scores every live leaf against every dense field
//! (two directional sweeps over the value-sorted column) and every sparse
//! binary field, then all instances are routed one level down. Leaf outputs
//! are a single Newton step of the logistic loss.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cartboost::{ConfigBuilder, Dataset, GBDT};
//! use ndarray::array;
//!
//! # fn main() -> cartboost::Result<()> {
//! let train = Dataset::builder()
//!     .dense(array![[1.0], [2.0], [3.0], [4.0]])
//!     .sparse_rows(vec![vec![0], vec![], vec![0], vec![]])
//!     .labels(array![-1.0, -1.0, 1.0, 1.0])
//!     .build()?;
//!
//! let config = ConfigBuilder::new().max_depth(2).num_trees(10).build()?;
//! let mut model = GBDT::new(config)?;
//! let history = model.fit(&train, None)?;
//!
//! println!("final loss {:.5}", history.last().map_or(0.0, |r| r.train_loss));
//! println!("p = {:.3}", model.predict_proba(&train.feature_vector(2)));
//! println!("leaves = {:?}", model.get_indices(&train.feature_vector(2)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Reading the text formats
//!
//! ```rust,no_run
//! # fn main() -> cartboost::Result<()> {
//! let train = cartboost::read_data("tr.dense", "tr.sparse")?;
//! let valid = cartboost::read_data("va.dense", "va.sparse")?;
//!
//! let mut model = cartboost::GBDT::new(cartboost::Config::default())?;
//! model.fit(&train, Some(&valid))?;
//! cartboost::write_indices("va.out", &valid, &model)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Dataset storage and text loaders
pub mod dataset;

// Split search and tree growth
pub mod tree;

// Boosting driver
pub mod boosting;

// Output writers
pub mod io;

pub use crate::core::{
    constants::*,
    error::{CartError, Result},
    types::*,
};

pub use crate::boosting::{RoundRecord, TrainingHistory, GBDT};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::dataset::{read_data, Dataset, DatasetBuilder};
pub use crate::io::write_indices;
pub use crate::tree::{Tree, TreeNode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the `env_logger` backend, defaulting `RUST_LOG` to `info`.
///
/// Safe to call more than once.
pub fn init_logging() {
    crate::core::initialize_logging("info");
}
