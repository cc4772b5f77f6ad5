//! Tree learning for cartboost.
//!
//! - [`node`]: the heap-indexed node type
//! - [`split`]: the per-level split search over dense and sparse fields
//! - [`tree`]: level-wise growth, leaf outputs and prediction

pub mod node;
pub mod split;
pub mod tree;

pub use node::TreeNode;
pub use split::{Defender, Direction, LevelDefenders, Location, Meta};
pub use tree::Tree;
