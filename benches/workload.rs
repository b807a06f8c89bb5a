use divan::Bencher;

use slabstore::prelude::*;
use slabstore::workload::{multiply, read_matrices, write_matrices};

const COUNT: usize = 8;
const N: usize = 256;

fn main() {
    divan::main();
}

fn executions() -> [(&'static str, Execution); 2] {
    [
        ("serial", Execution::Serial),
        ("parallel", Execution::parallel(None).unwrap()),
    ]
}

#[divan::bench(args = ["serial", "parallel"])]
fn init(b: Bencher, exec: &str) {
    let (_, exec) = executions().into_iter().find(|(n, _)| *n == exec).unwrap();
    let mut set = MatrixSet::zeroed(COUNT, N);

    b.bench_local(|| set.init(1, &exec));
}

#[divan::bench(args = ["serial", "parallel"])]
fn multiply_matrices(b: Bencher, exec: &str) {
    let (_, exec) = executions().into_iter().find(|(n, _)| *n == exec).unwrap();
    let set = MatrixSet::random(2, N, 1, &Execution::Serial);
    let mut c = vec![0.; N * N];

    b.bench_local(|| {
        multiply(
            set.get(0).unwrap(),
            set.get(1).unwrap(),
            &mut c,
            N,
            &exec,
        )
        .unwrap()
    });
}

mod h5 {
    use super::*;

    #[divan::bench(args = ["serial", "parallel"])]
    fn write(b: Bencher, exec: &str) {
        let (_, exec) = executions().into_iter().find(|(n, _)| *n == exec).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let set = MatrixSet::random(COUNT, N, 1, &Execution::Serial);
        let cancel = CancelToken::new();

        b.bench_local(|| {
            let store = H5Store::create(dir.path().join("write.h5")).unwrap();
            let report = write_matrices(&store, &set, &exec, &cancel);
            store.close().unwrap();
            report
        });
    }

    /// Rows per hyperslab, 0 for whole matrices.
    #[divan::bench(args = [0, 1, 32])]
    fn read_parallel(b: Bencher, chunk_rows: usize) {
        let chunk_rows = (chunk_rows > 0).then_some(chunk_rows);
        let dir = tempfile::tempdir().unwrap();
        let set = MatrixSet::random(COUNT, N, 1, &Execution::Serial);
        let exec = Execution::parallel(None).unwrap();
        let cancel = CancelToken::new();

        let path = dir.path().join("read.h5");
        {
            let store = H5Store::create(&path).unwrap();
            assert!(write_matrices(&store, &set, &Execution::Serial, &cancel).is_complete());
            store.close().unwrap();
        }

        let store = H5Store::open(&path).unwrap();
        let mut back = MatrixSet::zeroed(COUNT, N);
        b.bench_local(|| read_matrices(&store, &mut back, chunk_rows, &exec, &cancel));
    }
}
