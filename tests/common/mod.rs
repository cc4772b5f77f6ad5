//! Common test utilities for cartboost integration tests.

#![allow(dead_code)]

use cartboost::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use std::fs;
use std::path::Path;

/// Dense features drawn uniformly from `[-3, 3)`.
pub fn create_dense_features(num_samples: usize, num_fields: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((num_samples, num_fields), |_| rng.gen_range(-3.0..3.0))
}

/// Sparse rows where each feature is present with probability `density`.
pub fn create_sparse_rows(
    num_samples: usize,
    num_sparse_fields: usize,
    density: f64,
    seed: u64,
) -> Vec<Vec<u32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_samples)
        .map(|_| {
            (0..num_sparse_fields as u32)
                .filter(|_| rng.gen_bool(density))
                .collect()
        })
        .collect()
}

/// Labels driven by the first dense field and the first sparse field, with
/// a little label noise so both classes always appear.
pub fn create_labels(dense: &Array2<f32>, sparse: &[Vec<u32>], seed: u64) -> Array1<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array1::from_shape_fn(dense.nrows(), |i| {
        let mut margin = if dense.ncols() > 0 { dense[[i, 0]] } else { 0.0 };
        if sparse[i].contains(&0) {
            margin += 2.0;
        } else {
            margin -= 1.0;
        }
        let positive = margin > 0.0;
        let flip = rng.gen_bool(0.05);
        if positive != flip {
            1.0
        } else {
            -1.0
        }
    })
}

/// A seeded synthetic dataset with both dense and sparse fields.
pub fn create_mixed_dataset(num_samples: usize, seed: u64) -> Dataset {
    let dense = create_dense_features(num_samples, 3, seed);
    let sparse = create_sparse_rows(num_samples, 5, 0.3, seed + 1);
    let labels = create_labels(&dense, &sparse, seed + 2);
    Dataset::builder()
        .dense(dense)
        .sparse_rows(sparse)
        .nr_sparse_field(5)
        .labels(labels)
        .build()
        .unwrap()
}

/// Configuration for quick test fits.
pub fn create_test_config(max_depth: usize, num_trees: usize, num_threads: usize) -> Config {
    ConfigBuilder::new()
        .max_depth(max_depth)
        .num_trees(num_trees)
        .num_threads(num_threads)
        .build()
        .unwrap()
}

/// Write `dense` and `sparse` in the text formats the loader reads.
pub fn write_text_files(
    dir: &Path,
    stem: &str,
    dense: &Array2<f32>,
    sparse: &[Vec<u32>],
    labels: &Array1<f32>,
) -> (std::path::PathBuf, std::path::PathBuf) {
    let dense_path = dir.join(format!("{}.dense", stem));
    let sparse_path = dir.join(format!("{}.sparse", stem));

    let mut dense_text = String::new();
    let mut sparse_text = String::new();
    for i in 0..labels.len() {
        let label = if labels[i] > 0.0 { 1 } else { 0 };
        dense_text.push_str(&label.to_string());
        for v in dense.row(i) {
            dense_text.push_str(&format!(" {}", v));
        }
        dense_text.push('\n');

        sparse_text.push_str(&label.to_string());
        for id in &sparse[i] {
            sparse_text.push_str(&format!(" {}", id + 1));
        }
        sparse_text.push('\n');
    }

    fs::write(&dense_path, dense_text).unwrap();
    fs::write(&sparse_path, sparse_text).unwrap();
    (dense_path, sparse_path)
}

/// Assert that predictions are finite numbers
pub fn assert_predictions_valid(predictions: &Array1<f32>) {
    for &pred in predictions.iter() {
        assert!(pred.is_finite(), "Prediction should be finite: {}", pred);
    }
}

/// Fraction of instances whose score sign matches the label.
pub fn accuracy(scores: &Array1<f32>, labels: ndarray::ArrayView1<'_, f32>) -> f64 {
    let correct = scores
        .iter()
        .zip(labels.iter())
        .filter(|(&s, &y)| (s > 0.0) == (y > 0.0))
        .count();
    correct as f64 / scores.len() as f64
}
