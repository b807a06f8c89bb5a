//! Writing and reading a [`MatrixSet`] as one dataset per matrix.

use std::time::Instant;

use super::{BatchReport, CancelToken, Execution, ItemReport, MatrixSet};
use crate::error::{Result, StoreError};
use crate::path::{matrix_path, ObjectPath};
use crate::slab::Hyperslab;
use crate::store::ArrayStore;

/// Attribute holding `[rows, cols]` of every written matrix.
pub const DIMENSIONS: &str = "dimensions";

/// Write matrix `i` to `/matrix_<i>` with a [`DIMENSIONS`] attribute.
pub fn write_matrices<S: ArrayStore>(
    store: &S,
    set: &MatrixSet,
    exec: &Execution,
    cancel: &CancelToken,
) -> BatchReport {
    let shape = set.shape();
    let start = Instant::now();

    let items = exec.map(set.matrices(), |i, m| {
        ItemReport::run(i, matrix_path(i), cancel, |path| {
            write_matrix(store, path, &shape, m)
        })
    });

    BatchReport {
        items,
        elapsed: start.elapsed(),
    }
}

fn write_matrix<S: ArrayStore>(
    store: &S,
    path: &ObjectPath,
    shape: &[usize; 2],
    values: &[f64],
) -> Result<()> {
    let dims = shape
        .iter()
        .map(|&d| i32::try_from(d).map_err(|_| StoreError::InvalidShape(shape.to_vec())))
        .collect::<Result<Vec<i32>>>()?;

    store.put(path, shape, values)?;

    if let Err(e) = store.attach_attribute(path, DIMENSIONS, &dims, &[2]) {
        log::warn!("removing {path} after failing to attach {DIMENSIONS}");
        if let Err(re) = store.remove(path) {
            log::warn!("could not remove {path}: {re}");
        }
        return Err(e);
    }

    Ok(())
}

/// Read `/matrix_<i>` into matrix `i` of `set`. With `chunk_rows` every matrix is read in
/// hyperslabs of that many rows, otherwise in one piece.
pub fn read_matrices<S: ArrayStore>(
    store: &S,
    set: &mut MatrixSet,
    chunk_rows: Option<usize>,
    exec: &Execution,
    cancel: &CancelToken,
) -> BatchReport {
    let shape = set.shape();
    let start = Instant::now();

    let items = exec.map_mut(set.matrices_mut(), |i, m| {
        ItemReport::run(i, matrix_path(i), cancel, |path| {
            read_matrix(store, path, &shape, chunk_rows, m)
        })
    });

    BatchReport {
        items,
        elapsed: start.elapsed(),
    }
}

fn read_matrix<S: ArrayStore>(
    store: &S,
    path: &ObjectPath,
    shape: &[usize; 2],
    chunk_rows: Option<usize>,
    dst: &mut [f64],
) -> Result<()> {
    let info = store.info(path)?;
    if info.shape != shape {
        return Err(StoreError::SizeMismatch {
            expected: dst.len(),
            actual: info.len(),
        });
    }

    match chunk_rows {
        Some(rows) => {
            let cols = shape[1];
            for block in Hyperslab::row_blocks(shape, rows)? {
                let values = store.read_selection::<f64>(path, &block)?;
                let start = block.offset()[0] * cols;
                dst[start..start + values.len()].copy_from_slice(&values);
            }
        }
        None => {
            let values = store.read_full::<f64>(path)?;
            dst.copy_from_slice(&values);
        }
    }

    Ok(())
}
