//! Dataset storage and loading for cartboost.

pub mod dataset;
pub mod loader;

pub use dataset::{Dataset, DatasetBuilder, RankedEntry, SortedEntry};
pub use loader::{read_data, read_dense, read_sparse, DenseData, SparseData};
