use slabstore::prelude::*;

fn check_relative_paths<S: ArrayStore>(store: &S) {
    store.create_group("/DataGroup", false).unwrap();
    store.create_group("/DataGroup/Matrices", false).unwrap();

    let group = store.group("/DataGroup").unwrap();
    group.create_group("Attributes").unwrap();
    group
        .group("Matrices")
        .unwrap()
        .put("matrix_data", &[2, 2], &[1i64, 2, 3, 4])
        .unwrap();

    for (absolute, relative) in [
        ("/DataGroup/Attributes", "Attributes"),
        ("/DataGroup/Matrices", "Matrices"),
        ("/DataGroup/Matrices/matrix_data", "Matrices/matrix_data"),
    ] {
        assert_eq!(
            store.resolve(absolute).unwrap(),
            group.resolve(relative).unwrap()
        );
    }

    // absolute names ignore the base
    assert_eq!(
        group.resolve("/DataGroup/Matrices").unwrap(),
        store.resolve("DataGroup/Matrices").unwrap()
    );

    assert!(matches!(
        group.resolve("Missing"),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.group("/DataGroup/Matrices/matrix_data"),
        Err(StoreError::InvalidPath { .. })
    ));
    assert_eq!(group.members().unwrap(), ["Attributes", "Matrices"]);
}

#[test]
fn relative_paths_in_memory() {
    check_relative_paths(&MemStore::new());
}

#[test]
fn relative_paths_on_hdf5() {
    let dir = tempfile::tempdir().unwrap();
    check_relative_paths(&H5Store::create(dir.path().join("paths.h5")).unwrap());
}

#[test]
fn malformed_paths() {
    let store = MemStore::new();
    for p in ["", "/a//b", "/a/", "a/./b", "../a"] {
        assert!(
            matches!(
                store.create_group(p, true),
                Err(StoreError::InvalidPath { .. })
            ),
            "{p:?}"
        );
    }
}

#[test]
fn duplicate_keeps_first() {
    let store = MemStore::new();
    store.put("/a", &[2], &[1.5f32, 2.5]).unwrap();
    assert!(matches!(
        store.put("/a", &[2], &[9f32, 9.]),
        Err(StoreError::DuplicatePath(_))
    ));
    assert_eq!(store.read_full::<f32>("/a").unwrap(), [1.5, 2.5]);
}
