//! Compare parallel and serial matrix initialization, HDF5 writes and HDF5 reads.

use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use slabstore::prelude::*;
use slabstore::workload::run_benchmark;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Side length of every matrix
    #[arg(short = 'n', long, env = "SLABSTORE_MATRIX_SIZE", default_value_t = 2000)]
    matrix_size: usize,

    /// Number of matrices (datasets)
    #[arg(short = 'm', long, env = "SLABSTORE_NUM_MATRICES", default_value_t = 10)]
    num_matrices: usize,

    /// Rows per hyperslab in the parallel read, 0 reads whole matrices
    #[arg(long, env = "SLABSTORE_CHUNK_ROWS", default_value_t = 500)]
    chunk_rows: usize,

    /// Worker threads [default: number of CPUs]
    #[arg(short, long, env = "SLABSTORE_THREADS")]
    threads: Option<usize>,

    #[arg(long, env = "SLABSTORE_SEED", default_value_t = 0)]
    seed: u64,

    #[arg(long, env = "SLABSTORE_PARALLEL_FILE", default_value = "parallel_data.h5")]
    parallel_file: PathBuf,

    #[arg(long, env = "SLABSTORE_SERIAL_FILE", default_value = "serial_data.h5")]
    serial_file: PathBuf,
}

impl From<Args> for BenchConfig {
    fn from(args: Args) -> Self {
        BenchConfig {
            matrix_size: args.matrix_size,
            num_matrices: args.num_matrices,
            chunk_rows: (args.chunk_rows > 0).then_some(args.chunk_rows),
            threads: args.threads,
            seed: args.seed,
            parallel_file: args.parallel_file,
            serial_file: args.serial_file,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BenchConfig::from(Args::parse());
    config.validate()?;

    println!("Configuration:");
    println!("  matrix size:     {0}x{0}", config.matrix_size);
    println!("  matrices:        {}", config.num_matrices);
    println!("  per matrix:      {:.2} MB", config.matrix_mb());
    println!("  total:           {:.2} MB", config.total_mb());
    match config.chunk_rows {
        Some(rows) => println!("  chunk:           {rows} rows"),
        None => println!("  chunk:           whole matrix"),
    }
    println!();

    let summary = run_benchmark(&config, &CancelToken::new())?;
    println!("Threads: {}\n", summary.threads);
    print!("{summary}");

    let failed = summary.failures().count();
    if failed > 0 {
        bail!("{failed} matrix operations failed");
    }

    println!("\nGenerated files:");
    println!("  - {} (parallel write)", config.parallel_file.display());
    println!("  - {} (serial write)", config.serial_file.display());

    Ok(())
}
