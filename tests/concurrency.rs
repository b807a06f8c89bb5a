use std::sync::Arc;

use slabstore::prelude::*;
use slabstore::workload::{read_matrices, write_matrices, BatchReport, DIMENSIONS};

const COUNT: usize = 8;
const N: usize = 32;

/// Initialize, write and read back on `exec`; returns the matrices read and their sums.
fn round<S: ArrayStore>(store: &S, exec: &Execution) -> (MatrixSet, Vec<f64>) {
    let cancel = CancelToken::new();
    let set = MatrixSet::random(COUNT, N, 5, exec);

    assert!(write_matrices(store, &set, exec, &cancel).is_complete());

    let mut back = MatrixSet::zeroed(COUNT, N);
    assert!(read_matrices(store, &mut back, Some(5), exec, &cancel).is_complete());
    assert_eq!(back, set);

    let sums = back.checksums(&Execution::Serial);
    (back, sums)
}

#[test]
fn one_worker_and_many_agree_in_memory() {
    let serial = round(&MemStore::new(), &Execution::Serial);
    for threads in [1, 2, 4, 7] {
        let parallel = round(&MemStore::new(), &Execution::parallel(Some(threads)).unwrap());
        assert_eq!(serial, parallel, "{threads} threads");
    }
}

#[test]
fn one_worker_and_many_agree_on_hdf5() {
    let dir = tempfile::tempdir().unwrap();

    let serial = {
        let store = H5Store::create(dir.path().join("serial.h5")).unwrap();
        round(&store, &Execution::Serial)
    };
    let parallel = {
        let store = H5Store::create(dir.path().join("parallel.h5")).unwrap();
        round(&store, &Execution::parallel(Some(4)).unwrap())
    };
    assert_eq!(serial, parallel);

    let store = H5Store::open(dir.path().join("parallel.h5")).unwrap();
    assert_eq!(store.members("/").unwrap().len(), COUNT);
    assert_eq!(
        store
            .read_attribute::<i32>(matrix_path(0), DIMENSIONS)
            .unwrap(),
        [N as i32, N as i32]
    );
}

#[test]
fn parallel_and_serial_sums_are_close() {
    let set = MatrixSet::random(3, 100, 9, &Execution::Serial);
    let exec = Execution::parallel(Some(4)).unwrap();
    for (s, p) in set
        .checksums(&Execution::Serial)
        .into_iter()
        .zip(set.checksums(&exec))
    {
        assert!((s - p).abs() <= 1e-9 * s.abs(), "{s} != {p}");
    }
}

#[test]
fn same_path_from_many_threads() {
    let store = Arc::new(MemStore::new());
    store.put("/shared", &[4, 4], &[0i32; 16]).unwrap();

    // every thread owns one row
    std::thread::scope(|s| {
        for row in 0..4 {
            let store = Arc::clone(&store);
            s.spawn(move || {
                let slab = store.select("/shared", &[row, 0], &[1, 4]).unwrap();
                for k in 0..100 {
                    store
                        .write_selection("/shared", &slab, &[k + row as i32; 4])
                        .unwrap();
                }
            });
        }
    });

    let values = store.read_full::<i32>("/shared").unwrap();
    for (row, chunk) in values.chunks(4).enumerate() {
        assert!(chunk.iter().all(|&v| v == 99 + row as i32));
    }

    // only one of several racing creations of the same path wins
    let created = std::thread::scope(|s| {
        let handles = (0..8)
            .map(|_| s.spawn(|| store.create_group("/race", false).is_ok()))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count()
    });
    assert_eq!(created, 1);
}

#[test]
fn failures_do_not_abort_siblings() {
    let store = MemStore::new();
    let set = MatrixSet::random(6, 4, 0, &Execution::Serial);
    store.create_group(matrix_path(2), false).unwrap();
    store.create_group(matrix_path(4), false).unwrap();

    let exec = Execution::parallel(Some(3)).unwrap();
    let report: BatchReport = write_matrices(&store, &set, &exec, &CancelToken::new());

    let failed = report.unfinished().map(|i| i.index).collect::<Vec<_>>();
    assert_eq!(failed, [2, 4]);
    assert_eq!(report.succeeded(), 4);
    for i in [0, 1, 3, 5] {
        assert_eq!(
            store.read_full::<f64>(matrix_path(i)).unwrap(),
            set.get(i).unwrap()
        );
    }
}

#[test]
fn cancellation_skips_remaining_items() {
    let store = MemStore::new();
    let set = MatrixSet::random(4, 4, 0, &Execution::Serial);
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = write_matrices(&store, &set, &Execution::Serial, &cancel);
    assert_eq!(report.len(), 4);
    assert!(report
        .items
        .iter()
        .all(|i| matches!(i.outcome, Outcome::Cancelled)));
    assert!(store.members("/").unwrap().is_empty());
}
