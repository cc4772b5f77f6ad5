//! Leaf-index export.
//!
//! One line per instance: the integer label (`1` or `-1`) followed by the
//! terminal node reached in each tree, space-separated. Downstream models read
//! each column as a categorical feature.

use crate::boosting::GBDT;
use crate::core::error::{CartError, Result};
use crate::dataset::Dataset;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the leaf indices of every instance of `dataset` under `model`.
pub fn write_indices_to<W: Write>(writer: &mut W, dataset: &Dataset, model: &GBDT) -> Result<()> {
    let leaves = model.leaf_indices(dataset)?;

    for (i, row) in leaves.outer_iter().enumerate() {
        let label = if dataset.label(i) > 0.0 { 1 } else { -1 };
        write!(writer, "{}", label)?;
        for leaf in row.iter() {
            write!(writer, " {}", leaf)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the leaf indices of `dataset` to the file at `path`.
pub fn write_indices<P: AsRef<Path>>(path: P, dataset: &Dataset, model: &GBDT) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        CartError::data_loading(path.display().to_string(), 0, format!("cannot create: {}", e))
    })?;

    let mut writer = BufWriter::new(file);
    write_indices_to(&mut writer, dataset, model)?;

    log::info!(
        "wrote leaf indices of {} instances over {} trees to {}",
        dataset.nr_instance(),
        model.num_trees(),
        path.display()
    );
    Ok(())
}
