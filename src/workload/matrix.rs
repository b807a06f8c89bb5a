//! Square `f64` matrices held in memory for the benchmark.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::Execution;
use crate::error::{Result, StoreError};

/// `count` row-major `n × n` matrices. The set owns its buffers and is passed by reference
/// through the phases of the benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSet {
    n: usize,
    matrices: Vec<Vec<f64>>,
}

impl MatrixSet {
    pub fn zeroed(count: usize, n: usize) -> MatrixSet {
        MatrixSet {
            n,
            matrices: vec![vec![0.; n * n]; count],
        }
    }

    /// Matrices filled with uniform values in `[0, 1)`. Row `r` of matrix `i` is drawn from its
    /// own generator seeded from `(seed, i, r)`, so the contents do not depend on `exec`.
    pub fn random(count: usize, n: usize, seed: u64, exec: &Execution) -> MatrixSet {
        let mut set = MatrixSet::zeroed(count, n);
        set.init(seed, exec);
        set
    }

    pub fn init(&mut self, seed: u64, exec: &Execution) {
        let n = self.n;
        if n == 0 {
            return;
        }

        match exec {
            Execution::Serial => {
                for (i, m) in self.matrices.iter_mut().enumerate() {
                    for (r, row) in m.chunks_mut(n).enumerate() {
                        fill_row(row, seed, i, r);
                    }
                }
            }
            Execution::Parallel(_) => exec.install(|| {
                self.matrices.par_iter_mut().enumerate().for_each(|(i, m)| {
                    m.par_chunks_mut(n)
                        .enumerate()
                        .for_each(|(r, row)| fill_row(row, seed, i, r))
                })
            }),
        }
    }

    /// Reset every element to zero.
    pub fn clear(&mut self) {
        for m in &mut self.matrices {
            m.fill(0.);
        }
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Side length.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.n, self.n]
    }

    pub fn get(&self, i: usize) -> Option<&[f64]> {
        self.matrices.get(i).map(Vec::as_slice)
    }

    pub fn matrices(&self) -> &[Vec<f64>] {
        &self.matrices
    }

    pub fn matrices_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.matrices
    }

    /// Size of one matrix in MiB.
    pub fn matrix_mb(&self) -> f64 {
        (self.n * self.n * std::mem::size_of::<f64>()) as f64 / (1024. * 1024.)
    }

    pub fn total_mb(&self) -> f64 {
        self.matrix_mb() * self.len() as f64
    }

    /// Sum of the elements of every matrix.
    pub fn checksums(&self, exec: &Execution) -> Vec<f64> {
        self.matrices.iter().map(|m| checksum(m, exec)).collect()
    }
}

fn row_seed(seed: u64, matrix: usize, row: usize) -> u64 {
    seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ (((matrix as u64) << 32) | row as u64)
}

fn fill_row(row: &mut [f64], seed: u64, matrix: usize, r: usize) {
    let mut rng = StdRng::seed_from_u64(row_seed(seed, matrix, r));
    for v in row {
        *v = rng.gen();
    }
}

/// Sum of all elements. With a parallel `exec` the partial sums are combined in an
/// unspecified order, so the result may differ in the last bits from the serial sum.
pub fn checksum(values: &[f64], exec: &Execution) -> f64 {
    match exec {
        Execution::Serial => values.iter().sum(),
        Execution::Parallel(_) => exec.install(|| values.par_iter().sum()),
    }
}

/// `c = a · b` for row-major `n × n` matrices. Every element is accumulated in the same order
/// either way, so serial and parallel results are identical.
pub fn multiply(a: &[f64], b: &[f64], c: &mut [f64], n: usize, exec: &Execution) -> Result<()> {
    for len in [a.len(), b.len(), c.len()] {
        if len != n * n {
            return Err(StoreError::SizeMismatch {
                expected: n * n,
                actual: len,
            });
        }
    }
    if n == 0 {
        return Ok(());
    }

    let row = |i: usize, out: &mut [f64]| {
        for (j, o) in out.iter_mut().enumerate() {
            *o = (0..n).map(|k| a[i * n + k] * b[k * n + j]).sum();
        }
    };

    match exec {
        Execution::Serial => c.chunks_mut(n).enumerate().for_each(|(i, out)| row(i, out)),
        Execution::Parallel(_) => exec.install(|| {
            c.par_chunks_mut(n)
                .enumerate()
                .for_each(|(i, out)| row(i, out))
        }),
    }

    Ok(())
}
