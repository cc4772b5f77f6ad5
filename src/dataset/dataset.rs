//! Pre-sorted columnar dataset for cartboost.
//!
//! Dense fields are stored twice: once sorted by value (`sorted`, the order the
//! split search sweeps in) and once indexed by instance (`ranked`, the inverse
//! permutation used when routing an instance). Sparse binary fields are stored
//! in two CSR encodings, by instance and by feature, built from the same input.

use crate::core::error::{CartError, Result};
use crate::core::types::*;

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use std::cmp::Ordering;

/// One entry of a value-sorted dense column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortedEntry {
    /// Original instance id
    pub instance: InstanceIndex,
    /// Feature value
    pub value: f32,
}

/// One entry of the instance-indexed view of a dense column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedEntry {
    /// Position of this instance in the sorted column
    pub rank: u32,
    /// Feature value
    pub value: f32,
}

/// Read-only training or validation data.
#[derive(Debug, Clone)]
pub struct Dataset {
    nr_instance: usize,
    nr_field: usize,
    nr_sparse_field: usize,
    /// Per dense field, entries sorted ascending by value
    sorted: Vec<Vec<SortedEntry>>,
    /// Per dense field, entries indexed by instance id
    ranked: Vec<Vec<RankedEntry>>,
    /// Row pointers into `row_features`
    row_ptr: Vec<u64>,
    /// Present sparse feature ids, sorted within each row
    row_features: Vec<u32>,
    /// Column pointers into `column_instances`
    column_ptr: Vec<u64>,
    /// Instances having each sparse feature, ascending
    column_instances: Vec<u32>,
    labels: Array1<Label>,
}

impl Dataset {
    /// Build a dataset from parsed values.
    ///
    /// `dense` is `nr_instance × nr_field`. `sparse_rows[i]` lists the 0-based
    /// sparse feature ids present for instance `i`. When `nr_sparse_field` is
    /// `None` it is taken as one past the largest id seen.
    pub fn new(
        dense: Array2<f32>,
        sparse_rows: Vec<Vec<u32>>,
        labels: Array1<Label>,
        nr_sparse_field: Option<usize>,
    ) -> Result<Self> {
        let nr_instance = dense.nrows();
        let nr_field = dense.ncols();

        if labels.len() != nr_instance {
            return Err(CartError::dimension_mismatch(
                format!("dense rows: {}", nr_instance),
                format!("labels length: {}", labels.len()),
            ));
        }

        if sparse_rows.len() != nr_instance {
            return Err(CartError::dimension_mismatch(
                format!("dense rows: {}", nr_instance),
                format!("sparse rows: {}", sparse_rows.len()),
            ));
        }

        if nr_instance > u32::MAX as usize {
            return Err(CartError::dataset(format!(
                "too many instances: {}",
                nr_instance
            )));
        }

        if let Some(i) = labels.iter().position(|&y| y != 1.0 && y != -1.0) {
            return Err(CartError::dataset(format!(
                "label of instance {} is {}, expected -1 or +1",
                i, labels[i]
            )));
        }

        if let Some(((i, j), _)) = dense.indexed_iter().find(|(_, v)| v.is_nan()) {
            return Err(CartError::dataset(format!(
                "dense value of instance {} field {} is NaN",
                i, j
            )));
        }

        let max_id = sparse_rows.iter().flatten().copied().max();
        let nr_sparse_field = match (nr_sparse_field, max_id) {
            (Some(declared), Some(id)) if id as usize >= declared => {
                return Err(CartError::dataset(format!(
                    "sparse feature id {} out of declared range [0, {})",
                    id, declared
                )));
            }
            (Some(declared), _) => declared,
            (None, Some(id)) => id as usize + 1,
            (None, None) => 0,
        };

        let (sorted, ranked) = sort_dense(&dense);
        let (row_ptr, row_features, column_ptr, column_instances) =
            build_sparse(sparse_rows, nr_sparse_field);

        log::debug!(
            "built dataset: {} instances, {} dense fields, {} sparse fields, {} nonzeros",
            nr_instance,
            nr_field,
            nr_sparse_field,
            row_features.len()
        );

        Ok(Dataset {
            nr_instance,
            nr_field,
            nr_sparse_field,
            sorted,
            ranked,
            row_ptr,
            row_features,
            column_ptr,
            column_instances,
            labels,
        })
    }

    /// Create a dataset builder
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::new()
    }

    /// Number of instances.
    pub fn nr_instance(&self) -> usize {
        self.nr_instance
    }

    /// Number of dense fields.
    pub fn nr_field(&self) -> usize {
        self.nr_field
    }

    /// Number of sparse fields.
    pub fn nr_sparse_field(&self) -> usize {
        self.nr_sparse_field
    }

    /// Length of a materialized feature vector.
    pub fn nr_feature(&self) -> usize {
        self.nr_field + self.nr_sparse_field
    }

    /// Number of stored sparse presences.
    pub fn nr_nonzero(&self) -> usize {
        self.row_features.len()
    }

    /// Labels in `{-1, +1}`.
    pub fn labels(&self) -> ArrayView1<'_, Label> {
        self.labels.view()
    }

    /// Label of one instance.
    pub fn label(&self, i: usize) -> Label {
        self.labels[i]
    }

    /// Dense field `j`, sorted ascending by value.
    pub fn sorted_field(&self, j: usize) -> &[SortedEntry] {
        &self.sorted[j]
    }

    /// Dense field `j`, indexed by instance id.
    pub fn ranked_field(&self, j: usize) -> &[RankedEntry] {
        &self.ranked[j]
    }

    /// Dense value of instance `i` in field `j`.
    pub fn dense_value(&self, i: usize, j: usize) -> f32 {
        self.ranked[j][i].value
    }

    /// Sparse feature ids present for instance `i`, ascending.
    pub fn sparse_row(&self, i: usize) -> &[u32] {
        let start = self.row_ptr[i] as usize;
        let end = self.row_ptr[i + 1] as usize;
        &self.row_features[start..end]
    }

    /// Instances having sparse feature `j`, ascending.
    pub fn sparse_column(&self, j: usize) -> &[u32] {
        let start = self.column_ptr[j] as usize;
        let end = self.column_ptr[j + 1] as usize;
        &self.column_instances[start..end]
    }

    /// Whether instance `i` has sparse feature `j`.
    pub fn has_sparse(&self, i: usize, j: u32) -> bool {
        self.sparse_row(i).binary_search(&j).is_ok()
    }

    /// Materialize instance `i` as `[dense values.., sparse indicators..]`.
    pub fn feature_vector(&self, i: usize) -> Vec<f32> {
        let mut x = vec![0.0; self.nr_feature()];
        for (j, slot) in x.iter_mut().take(self.nr_field).enumerate() {
            *slot = self.ranked[j][i].value;
        }
        for &j in self.sparse_row(i) {
            x[self.nr_field + j as usize] = 1.0;
        }
        x
    }

    /// Mean label, the input of the log-odds prior.
    pub fn mean_label(&self) -> f64 {
        if self.nr_instance == 0 {
            return 0.0;
        }
        self.labels.iter().map(|&y| y as f64).sum::<f64>() / self.nr_instance as f64
    }
}

fn sort_dense(dense: &Array2<f32>) -> (Vec<Vec<SortedEntry>>, Vec<Vec<RankedEntry>>) {
    dense
        .columns()
        .into_iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|column| {
            let mut sorted: Vec<SortedEntry> = column
                .iter()
                .enumerate()
                .map(|(i, &value)| SortedEntry {
                    instance: i as InstanceIndex,
                    value,
                })
                .collect();
            // Stable, so tied values keep instance order.
            sorted.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

            let mut ranked = vec![RankedEntry { rank: 0, value: 0.0 }; sorted.len()];
            for (rank, entry) in sorted.iter().enumerate() {
                ranked[entry.instance as usize] = RankedEntry {
                    rank: rank as u32,
                    value: entry.value,
                };
            }
            (sorted, ranked)
        })
        .unzip()
}

fn build_sparse(
    mut rows: Vec<Vec<u32>>,
    nr_sparse_field: usize,
) -> (Vec<u64>, Vec<u32>, Vec<u64>, Vec<u32>) {
    let mut row_ptr = Vec::with_capacity(rows.len() + 1);
    let mut row_features = Vec::new();
    let mut columns: Vec<Vec<u32>> = vec![Vec::new(); nr_sparse_field];

    row_ptr.push(0);
    for (i, row) in rows.iter_mut().enumerate() {
        row.sort_unstable();
        let before = row.len();
        row.dedup();
        if row.len() != before {
            log::debug!("instance {} lists a sparse feature more than once", i);
        }
        for &j in row.iter() {
            columns[j as usize].push(i as u32);
        }
        row_features.extend_from_slice(row);
        row_ptr.push(row_features.len() as u64);
    }

    let mut column_ptr = Vec::with_capacity(nr_sparse_field + 1);
    let mut column_instances = Vec::with_capacity(row_features.len());
    column_ptr.push(0);
    for column in columns {
        column_instances.extend(column);
        column_ptr.push(column_instances.len() as u64);
    }

    (row_ptr, row_features, column_ptr, column_instances)
}

/// Dataset builder for constructing datasets with validation
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    dense: Option<Array2<f32>>,
    sparse_rows: Option<Vec<Vec<u32>>>,
    labels: Option<Array1<Label>>,
    nr_sparse_field: Option<usize>,
}

impl DatasetBuilder {
    /// Create a new dataset builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dense feature matrix (instances × fields)
    pub fn dense(mut self, dense: Array2<f32>) -> Self {
        self.dense = Some(dense);
        self
    }

    /// Set per-instance lists of present 0-based sparse feature ids
    pub fn sparse_rows(mut self, rows: Vec<Vec<u32>>) -> Self {
        self.sparse_rows = Some(rows);
        self
    }

    /// Set labels in `{-1, +1}`
    pub fn labels(mut self, labels: Array1<Label>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Declare the sparse feature range; ids outside it are rejected
    pub fn nr_sparse_field(mut self, nr_sparse_field: usize) -> Self {
        self.nr_sparse_field = Some(nr_sparse_field);
        self
    }

    /// Build the dataset
    pub fn build(self) -> Result<Dataset> {
        let labels = self
            .labels
            .ok_or_else(|| CartError::dataset("Labels are required"))?;
        let nr_instance = labels.len();

        let dense = self
            .dense
            .unwrap_or_else(|| Array2::zeros((nr_instance, 0)));
        let sparse_rows = self
            .sparse_rows
            .unwrap_or_else(|| vec![Vec::new(); nr_instance]);

        Dataset::new(dense, sparse_rows, labels, self.nr_sparse_field)
    }
}
