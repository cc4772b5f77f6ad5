//! Readers for the whitespace-separated dense and sparse text formats.
//!
//! Dense files hold one instance per line: `label v1 v2 .. vF`. Sparse files
//! hold one instance per line: `label id id ..` with 1-based feature ids. The
//! two files describing one dataset must have the same number of lines; the
//! label column of the sparse file is ignored.

use crate::core::error::{CartError, Result};
use crate::core::types::Label;
use crate::dataset::dataset::Dataset;

use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parsed contents of a dense file.
#[derive(Debug, Clone)]
pub struct DenseData {
    /// Instances × fields
    pub values: Array2<f32>,
    /// Labels mapped to `{-1, +1}`
    pub labels: Array1<Label>,
}

/// Parsed contents of a sparse file.
#[derive(Debug, Clone)]
pub struct SparseData {
    /// 0-based sparse feature ids per instance
    pub rows: Vec<Vec<u32>>,
    /// One past the largest id seen
    pub nr_sparse_field: usize,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        CartError::data_loading(path.display().to_string(), 0, format!("cannot open: {}", e))
    })?;
    Ok(BufReader::new(file))
}

fn parse_label(token: &str, path: &Path, line: usize) -> Result<Label> {
    let raw: f64 = token.parse().map_err(|_| {
        CartError::data_loading(
            path.display().to_string(),
            line,
            format!("invalid label '{}'", token),
        )
    })?;
    Ok(if raw > 0.0 { 1.0 } else { -1.0 })
}

/// Read a dense file.
pub fn read_dense<P: AsRef<Path>>(path: P) -> Result<DenseData> {
    let path = path.as_ref();
    let reader = open(path)?;

    let mut values: Vec<f32> = Vec::new();
    let mut labels: Vec<Label> = Vec::new();
    let mut nr_field: Option<usize> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let mut tokens = line.split_whitespace();

        let label = match tokens.next() {
            Some(token) => parse_label(token, path, line_no)?,
            None => {
                return Err(CartError::data_loading(
                    path.display().to_string(),
                    line_no,
                    "empty line",
                ))
            }
        };

        let before = values.len();
        for token in tokens {
            let v: f32 = token.parse().map_err(|_| {
                CartError::data_loading(
                    path.display().to_string(),
                    line_no,
                    format!("invalid value '{}'", token),
                )
            })?;
            values.push(v);
        }
        let width = values.len() - before;

        match nr_field {
            None => nr_field = Some(width),
            Some(expected) if expected != width => {
                return Err(CartError::data_loading(
                    path.display().to_string(),
                    line_no,
                    format!("expected {} dense values, found {}", expected, width),
                ))
            }
            Some(_) => {}
        }
        labels.push(label);
    }

    let nr_instance = labels.len();
    let values = Array2::from_shape_vec((nr_instance, nr_field.unwrap_or(0)), values)
        .map_err(|e| CartError::dataset(format!("dense shape error: {}", e)))?;

    Ok(DenseData {
        values,
        labels: Array1::from_vec(labels),
    })
}

/// Read a sparse file.
pub fn read_sparse<P: AsRef<Path>>(path: P) -> Result<SparseData> {
    let path = path.as_ref();
    let reader = open(path)?;

    let mut rows = Vec::new();
    let mut nr_sparse_field = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let mut tokens = line.split_whitespace();

        if tokens.next().is_none() {
            return Err(CartError::data_loading(
                path.display().to_string(),
                line_no,
                "empty line",
            ));
        }

        let mut row = Vec::new();
        for token in tokens {
            let id: u32 = token.parse().map_err(|_| {
                CartError::data_loading(
                    path.display().to_string(),
                    line_no,
                    format!("invalid feature id '{}'", token),
                )
            })?;
            if id == 0 {
                return Err(CartError::data_loading(
                    path.display().to_string(),
                    line_no,
                    "feature ids are 1-based",
                ));
            }
            nr_sparse_field = nr_sparse_field.max(id as usize);
            row.push(id - 1);
        }
        rows.push(row);
    }

    Ok(SparseData {
        rows,
        nr_sparse_field,
    })
}

/// Read a dense/sparse file pair into a [`Dataset`].
pub fn read_data<P: AsRef<Path>, Q: AsRef<Path>>(dense_path: P, sparse_path: Q) -> Result<Dataset> {
    let dense_path = dense_path.as_ref();
    let sparse_path = sparse_path.as_ref();

    let dense = read_dense(dense_path)?;
    let sparse = read_sparse(sparse_path)?;

    if dense.labels.len() != sparse.rows.len() {
        return Err(CartError::dimension_mismatch(
            format!("{} lines in {}", dense.labels.len(), dense_path.display()),
            format!("{} lines in {}", sparse.rows.len(), sparse_path.display()),
        ));
    }

    let dataset = Dataset::new(
        dense.values,
        sparse.rows,
        dense.labels,
        Some(sparse.nr_sparse_field),
    )?;

    log::info!(
        "loaded {} and {}: {} instances, {} dense fields, {} sparse fields",
        dense_path.display(),
        sparse_path.display(),
        dataset.nr_instance(),
        dataset.nr_field(),
        dataset.nr_sparse_field()
    );

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_dense() {
        let file = write_file("1 0.5 2\n0 1.5\t-3\n-1 2.5 4\n");
        let data = read_dense(file.path()).unwrap();
        assert_eq!(data.values.dim(), (3, 2));
        assert_eq!(data.values[[1, 1]], -3.0);
        assert_eq!(data.labels.to_vec(), vec![1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_read_dense_ragged_row() {
        let file = write_file("1 0.5 2\n0 1.5\n");
        let err = read_dense(file.path()).unwrap_err();
        assert!(matches!(err, CartError::DataLoading { line: 2, .. }));
    }

    #[test]
    fn test_read_sparse() {
        let file = write_file("1 3 1\n0\n1 2\n");
        let data = read_sparse(file.path()).unwrap();
        assert_eq!(data.rows, vec![vec![2, 0], vec![], vec![1]]);
        assert_eq!(data.nr_sparse_field, 3);
    }

    #[test]
    fn test_read_sparse_rejects_zero_id() {
        let file = write_file("1 0\n");
        assert!(read_sparse(file.path()).is_err());
    }

    #[test]
    fn test_read_data() {
        let dense = write_file("1 1.0\n0 2.0\n");
        let sparse = write_file("1 2\n0 1 2\n");
        let ds = read_data(dense.path(), sparse.path()).unwrap();
        assert_eq!(ds.nr_instance(), 2);
        assert_eq!(ds.nr_sparse_field(), 2);
        assert_eq!(ds.sparse_column(1), &[0, 1]);
        assert_eq!(ds.feature_vector(1), vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_read_data_line_mismatch() {
        let dense = write_file("1 1.0\n0 2.0\n");
        let sparse = write_file("1 2\n");
        let err = read_data(dense.path(), sparse.path()).unwrap_err();
        assert!(matches!(err, CartError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = read_dense("/nonexistent/cartboost.dense").unwrap_err();
        assert_eq!(err.category(), "data_loading");
    }
}
