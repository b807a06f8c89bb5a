use divan::Bencher;

use slabstore::prelude::*;
use slabstore::slab::gather;

fn main() {
    divan::main();
}

const SHAPE: [usize; 2] = [2000, 2000];

fn matrix() -> Vec<f64> {
    (0..SHAPE[0] * SHAPE[1]).map(|v| v as f64).collect()
}

#[divan::bench]
fn gather_rows(b: Bencher) {
    let src = matrix();
    let slab = Hyperslab::new(&SHAPE, &[500, 0], &[500, 2000]).unwrap();

    b.bench_local(|| gather(&src, &SHAPE, &slab).unwrap());
}

#[divan::bench]
fn gather_columns(b: Bencher) {
    let src = matrix();
    let slab = Hyperslab::new(&SHAPE, &[0, 500], &[2000, 500]).unwrap();

    b.bench_local(|| gather(&src, &SHAPE, &slab).unwrap());
}

#[divan::bench]
fn mem_quadrants(b: Bencher) {
    let store = MemStore::new();
    store.put("/m", &SHAPE, &matrix()).unwrap();
    let quadrants = store.quadrants("/m").unwrap();

    b.bench_local(|| {
        for (_, q) in &quadrants {
            divan::black_box(store.read_selection::<f64>("/m", q).unwrap());
        }
    });
}

#[divan::bench]
fn h5_quadrants(b: Bencher) {
    let dir = tempfile::tempdir().unwrap();
    let store = H5Store::create(dir.path().join("quadrants.h5")).unwrap();
    store.put("/m", &SHAPE, &matrix()).unwrap();
    let quadrants = store.quadrants("/m").unwrap();

    b.bench_local(|| {
        for (_, q) in &quadrants {
            divan::black_box(store.read_selection::<f64>("/m", q).unwrap());
        }
    });
}
