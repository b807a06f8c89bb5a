//! The matrix benchmark: initialize a set of square matrices, write them to a store, read them
//! back and verify them, once on a rayon pool and once serially.
//!
//! Every iteration of a batch works on its own matrix and its own path, so results do not
//! depend on the number of workers. A failing iteration does not stop its siblings: each one
//! produces an [`ItemReport`], and a [`CancelToken`] is checked before every iteration starts.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::StoreError;
use crate::path::ObjectPath;

pub mod batch;
pub mod driver;
pub mod matrix;
pub mod stats;

pub use batch::{read_matrices, write_matrices, DIMENSIONS};
pub use driver::{run_benchmark, BenchSummary, Phase, PhaseReport};
pub use matrix::{checksum, multiply, MatrixSet};
pub use stats::{timed, PerformanceStats};

/// Where the iterations of a loop run.
#[derive(Debug, Clone)]
pub enum Execution {
    /// In order on the calling thread.
    Serial,
    Parallel(Arc<ThreadPool>),
}

impl Execution {
    /// A new pool with `threads` workers, or rayon's default when `None`.
    pub fn parallel(threads: Option<usize>) -> Result<Execution, rayon::ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|i| format!("slabstore-{i}"))
            .build()?;
        Ok(Execution::Parallel(Arc::new(pool)))
    }

    pub fn threads(&self) -> usize {
        match self {
            Execution::Serial => 1,
            Execution::Parallel(pool) => pool.current_num_threads(),
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Execution::Parallel(_))
    }

    /// Apply `f` to every item. Results are in the order of `items`.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync + Send,
    {
        match self {
            Execution::Serial => items.iter().enumerate().map(|(i, t)| f(i, t)).collect(),
            Execution::Parallel(pool) => pool.install(|| {
                items
                    .par_iter()
                    .enumerate()
                    .map(|(i, t)| f(i, t))
                    .collect()
            }),
        }
    }

    pub fn map_mut<T, R, F>(&self, items: &mut [T], f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, &mut T) -> R + Sync + Send,
    {
        match self {
            Execution::Serial => items
                .iter_mut()
                .enumerate()
                .map(|(i, t)| f(i, t))
                .collect(),
            Execution::Parallel(pool) => pool.install(|| {
                items
                    .par_iter_mut()
                    .enumerate()
                    .map(|(i, t)| f(i, t))
                    .collect()
            }),
        }
    }

    /// Run `op` inside the pool, so that rayon iterators in it use the pool's workers.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self {
            Execution::Serial => op(),
            Execution::Parallel(pool) => pool.install(op),
        }
    }
}

/// Index of the rayon worker running the caller, 0 outside a pool.
pub fn worker_index() -> usize {
    rayon::current_thread_index().unwrap_or(0)
}

/// Shared flag for stopping a batch between iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub enum Outcome {
    Done,
    Failed(StoreError),
    /// Not started because the batch was cancelled.
    Cancelled,
}

#[derive(Debug)]
pub struct ItemReport {
    pub index: usize,
    pub path: ObjectPath,
    pub worker: usize,
    pub outcome: Outcome,
}

impl ItemReport {
    /// Run one iteration of a batch unless `cancel` is set.
    pub(crate) fn run<F>(index: usize, path: ObjectPath, cancel: &CancelToken, f: F) -> ItemReport
    where
        F: FnOnce(&ObjectPath) -> Result<(), StoreError>,
    {
        let worker = worker_index();

        let outcome = if cancel.is_cancelled() {
            log::debug!("worker {worker}: skipping {path}, cancelled");
            Outcome::Cancelled
        } else {
            match f(&path) {
                Ok(()) => {
                    log::info!("worker {worker}: completed {path}");
                    Outcome::Done
                }
                Err(e) => {
                    log::warn!("worker {worker}: {path} failed: {e}");
                    Outcome::Failed(e)
                }
            }
        };

        ItemReport {
            index,
            path,
            worker,
            outcome,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.outcome, Outcome::Done)
    }
}

impl fmt::Display for ItemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Done => write!(f, "{}: done (worker {})", self.path, self.worker),
            Outcome::Failed(e) => write!(f, "{}: failed: {e}", self.path),
            Outcome::Cancelled => write!(f, "{}: cancelled", self.path),
        }
    }
}

/// Per-item outcomes of a batch, in item order.
#[derive(Debug)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_done()).count()
    }

    /// Items that failed or were never run.
    pub fn unfinished(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|i| !i.is_done())
    }

    pub fn is_complete(&self) -> bool {
        self.succeeded() == self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keeps_order() {
        let items = (0..100).collect::<Vec<usize>>();
        for exec in [Execution::Serial, Execution::parallel(Some(4)).unwrap()] {
            let out = exec.map(&items, |i, v| i + v);
            assert_eq!(out, (0..100).map(|i| 2 * i).collect::<Vec<_>>());
        }
    }

    #[test]
    fn map_mut_touches_every_item() {
        let exec = Execution::parallel(Some(3)).unwrap();
        assert_eq!(exec.threads(), 3);
        assert!(exec.is_parallel());

        let mut items = vec![0u32; 50];
        exec.map_mut(&mut items, |i, v| *v = i as u32);
        assert!(items.iter().enumerate().all(|(i, &v)| v as usize == i));
    }

    #[test]
    fn serial_runs_on_caller() {
        let exec = Execution::Serial;
        assert_eq!(exec.threads(), 1);
        assert_eq!(exec.map(&[(); 3], |_, _| worker_index()), [0, 0, 0]);
    }

    #[test]
    fn cancelled_items_do_not_run() {
        let cancel = CancelToken::new();
        let a = ItemReport::run(0, ObjectPath::root(), &cancel, |_| Ok(()));
        assert!(a.is_done());

        cancel.cancel();
        let b = ItemReport::run(1, ObjectPath::root(), &cancel, |_| {
            panic!("should not run")
        });
        assert!(matches!(b.outcome, Outcome::Cancelled));

        let report = BatchReport {
            items: vec![a, b],
            elapsed: Duration::ZERO,
        };
        assert_eq!(report.succeeded(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.unfinished().count(), 1);
    }
}
