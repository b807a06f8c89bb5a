//! Benchmark configuration.

use std::path::PathBuf;

use anyhow::ensure;

#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Side length of every matrix.
    pub matrix_size: usize,
    pub num_matrices: usize,
    /// Rows per hyperslab in the parallel read, whole matrices when `None`.
    pub chunk_rows: Option<usize>,
    /// Worker threads, rayon's default when `None`.
    pub threads: Option<usize>,
    pub seed: u64,
    pub parallel_file: PathBuf,
    pub serial_file: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            matrix_size: 2000,
            num_matrices: 10,
            chunk_rows: Some(500),
            threads: None,
            seed: 0,
            parallel_file: "parallel_data.h5".into(),
            serial_file: "serial_data.h5".into(),
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.matrix_size > 0, "matrix size must be positive");
        ensure!(
            i32::try_from(self.matrix_size).is_ok(),
            "matrix size {} does not fit the dimensions attribute",
            self.matrix_size
        );
        ensure!(self.num_matrices > 0, "at least one matrix is needed");
        ensure!(self.chunk_rows != Some(0), "chunk rows must be positive");
        ensure!(self.threads != Some(0), "thread count must be positive");
        ensure!(
            self.parallel_file != self.serial_file,
            "parallel and serial runs must use different files: {:?}",
            self.parallel_file
        );
        Ok(())
    }

    /// Size of one matrix in MiB.
    pub fn matrix_mb(&self) -> f64 {
        (self.matrix_size * self.matrix_size * std::mem::size_of::<f64>()) as f64
            / (1024. * 1024.)
    }

    pub fn total_mb(&self) -> f64 {
        self.matrix_mb() * self.num_matrices as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let c = BenchConfig::default();
        c.validate().unwrap();
        assert!((c.matrix_mb() - 30.517578125).abs() < 1e-9);
        assert!((c.total_mb() - 305.17578125).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            BenchConfig {
                matrix_size: 0,
                ..Default::default()
            },
            BenchConfig {
                num_matrices: 0,
                ..Default::default()
            },
            BenchConfig {
                chunk_rows: Some(0),
                ..Default::default()
            },
            BenchConfig {
                threads: Some(0),
                ..Default::default()
            },
            BenchConfig {
                serial_file: "parallel_data.h5".into(),
                ..Default::default()
            },
        ];

        for c in bad {
            assert!(c.validate().is_err(), "{c:?}");
        }
    }
}
