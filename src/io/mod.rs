//! Output writers for cartboost.

pub mod indices;

pub use indices::{write_indices, write_indices_to};
