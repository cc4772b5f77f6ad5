//! System constants and configuration defaults for cartboost.

/// Default maximum tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 7;

/// Default number of boosting rounds.
pub const DEFAULT_NUM_TREES: usize = 30;

/// Default number of worker threads.
pub const DEFAULT_NUM_THREADS: usize = 1;

/// Largest accepted tree depth. A tree allocates `2^(max_depth + 1)` nodes.
pub const MAX_TREE_DEPTH: usize = 20;

/// Largest accepted worker thread count.
pub const MAX_NUM_THREADS: usize = 1024;

/// Newton denominators at or below this value yield a zero leaf output.
pub const HESSIAN_EPSILON: f64 = 1e-12;

/// Root of every tree in heap order.
pub const ROOT_NODE: u32 = 1;

/// Threshold recorded for sparse splits: presence (1.0) routes right.
pub const SPARSE_THRESHOLD: f32 = 1.0;

/// Environment variable prefix used by `Config::load_from_environment`.
pub const ENV_PREFIX: &str = "CARTBOOST_";

/// Crate version string.
pub const CARTBOOST_VERSION: &str = env!("CARGO_PKG_VERSION");
