//! The four benchmark phases: initialize, write, read, verify.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use super::{
    read_matrices, timed, write_matrices, BatchReport, CancelToken, Execution, ItemReport,
    MatrixSet, PerformanceStats,
};
use crate::config::BenchConfig;
use crate::store::H5Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Write,
    Read,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Init => "Matrix initialization",
            Phase::Write => "HDF5 write",
            Phase::Read => "HDF5 read",
        }
    }
}

#[derive(Debug)]
pub struct PhaseReport {
    pub phase: Phase,
    pub stats: PerformanceStats,
    /// Items of either run that did not complete.
    pub failures: Vec<ItemReport>,
}

#[derive(Debug)]
pub struct BenchSummary {
    pub threads: usize,
    pub phases: Vec<PhaseReport>,
    /// Per matrix: sum after the parallel read, sum after the serial read.
    pub checksums: Vec<(f64, f64)>,
}

impl BenchSummary {
    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.phases.iter().flat_map(|p| p.failures.iter())
    }

    pub fn is_ok(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for BenchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.phases {
            writeln!(f, "{}", p.stats)?;
            for item in &p.failures {
                writeln!(f, "  {item}")?;
            }
        }

        writeln!(f, "=== Verification ===")?;
        for (i, (parallel, serial)) in self.checksums.iter().enumerate() {
            writeln!(
                f,
                "matrix {i}: parallel read checksum = {parallel:.6}, serial read checksum = {serial:.6}"
            )?;
        }
        Ok(())
    }
}

fn phase_report(
    phase: Phase,
    config: &BenchConfig,
    threads: usize,
    (parallel, parallel_time): (Option<BatchReport>, Duration),
    (serial, serial_time): (Option<BatchReport>, Duration),
) -> PhaseReport {
    let failures = parallel
        .into_iter()
        .chain(serial)
        .flat_map(|r| r.items)
        .filter(|i| !i.is_done())
        .collect();

    PhaseReport {
        phase,
        stats: PerformanceStats {
            operation: phase.name().to_string(),
            data_mb: config.total_mb(),
            parallel: parallel_time,
            serial: serial_time,
            threads,
        },
        failures,
    }
}

fn write_file(
    path: &Path,
    set: &MatrixSet,
    exec: &Execution,
    cancel: &CancelToken,
) -> anyhow::Result<BatchReport> {
    let store = H5Store::create(path).with_context(|| format!("creating {path:?}"))?;
    let report = write_matrices(&store, set, exec, cancel);
    store.close().with_context(|| format!("closing {path:?}"))?;

    log::info!(
        "wrote {}/{} matrices to {path:?}",
        report.succeeded(),
        report.len()
    );
    Ok(report)
}

fn read_file(
    path: &Path,
    set: &mut MatrixSet,
    chunk_rows: Option<usize>,
    exec: &Execution,
    cancel: &CancelToken,
) -> anyhow::Result<BatchReport> {
    let store = H5Store::open(path).with_context(|| format!("opening {path:?}"))?;
    let report = read_matrices(&store, set, chunk_rows, exec, cancel);

    log::info!(
        "read {}/{} matrices from {path:?}",
        report.succeeded(),
        report.len()
    );
    Ok(report)
}

/// Run every phase once on a rayon pool and once serially.
///
/// Failures of single matrices are collected in the summary. Errors creating, opening or
/// closing a file end the benchmark.
pub fn run_benchmark(config: &BenchConfig, cancel: &CancelToken) -> anyhow::Result<BenchSummary> {
    config.validate()?;

    let exec = Execution::parallel(config.threads).context("building thread pool")?;
    let serial = Execution::Serial;
    let threads = exec.threads();
    let (n, count) = (config.matrix_size, config.num_matrices);

    log::info!(
        "{count} matrices of {n}x{n} ({:.2} MB each, {:.2} MB total) on {threads} threads",
        config.matrix_mb(),
        config.total_mb()
    );

    let mut matrices = MatrixSet::zeroed(count, n);
    let mut copies = MatrixSet::zeroed(count, n);
    let mut phases = Vec::with_capacity(3);

    log::info!("{}", Phase::Init.name());
    let ((), parallel_time) = timed(|| matrices.init(config.seed, &exec));
    let ((), serial_time) = timed(|| copies.init(config.seed, &serial));
    phases.push(phase_report(
        Phase::Init,
        config,
        threads,
        (None, parallel_time),
        (None, serial_time),
    ));

    log::info!("{}", Phase::Write.name());
    let (parallel, parallel_time) =
        timed(|| write_file(&config.parallel_file, &matrices, &exec, cancel));
    let (serial_report, serial_time) =
        timed(|| write_file(&config.serial_file, &matrices, &serial, cancel));
    phases.push(phase_report(
        Phase::Write,
        config,
        threads,
        (Some(parallel?), parallel_time),
        (Some(serial_report?), serial_time),
    ));

    log::info!("{}", Phase::Read.name());
    matrices.clear();
    copies.clear();
    let (parallel, parallel_time) = timed(|| {
        read_file(
            &config.parallel_file,
            &mut matrices,
            config.chunk_rows,
            &exec,
            cancel,
        )
    });
    let (serial_report, serial_time) =
        timed(|| read_file(&config.serial_file, &mut copies, None, &serial, cancel));
    phases.push(phase_report(
        Phase::Read,
        config,
        threads,
        (Some(parallel?), parallel_time),
        (Some(serial_report?), serial_time),
    ));

    let checksums = matrices
        .checksums(&exec)
        .into_iter()
        .zip(copies.checksums(&serial))
        .collect();

    Ok(BenchSummary {
        threads,
        phases,
        checksums,
    })
}
