//! # slabstore
//!
//! A hierarchical store of rectangular N-d arrays with hyperslab (sub-array) access.
//!
//! Arrays of a fixed element type live under paths like `/DataGroup/Matrices/matrix_data`, next
//! to groups and small named attributes. They can be written and read whole, or by an
//! axis-aligned [hyperslab](slab::Hyperslab) without touching the rest of the array. The same
//! [`ArrayStore`](store::ArrayStore) API is provided in memory by [`MemStore`](store::MemStore)
//! and on HDF5 files through the [bindings to the official HDF5
//! library](https://docs.rs/hdf5-metno) by [`H5Store`](store::H5Store).
//!
//! ## Usage
//!
//! ```
//! use slabstore::prelude::*;
//!
//! let store = MemStore::new();
//! store.create_group("/DataGroup", false).unwrap();
//!
//! // Relative to a group
//! let group = store.group("/DataGroup").unwrap();
//! let matrices = group.create_group("Matrices").unwrap();
//! let path = matrices
//!     .put("matrix_data", &[4, 6], &(1..=24).collect::<Vec<i32>>())
//!     .unwrap();
//! store.attach_attribute(&path, "dimensions", &[4, 6], &[2]).unwrap();
//!
//! let slab = Hyperslab::from_extents(&[4, 6], [0..2, 3..6]).unwrap();
//! let values = store.read_selection::<i32>(&path, &slab).unwrap();
//! assert_eq!(values, [4, 5, 6, 10, 11, 12]);
//! ```
//!
//! The [workload] module runs the matrix benchmark of the `slabbench` binary: batches of
//! independent writes and reads on a rayon pool, compared against a serial run.

pub mod config;
pub mod demo;
pub mod dtype;
pub mod error;
pub mod extent;
pub mod path;
pub mod slab;
pub mod store;
pub mod workload;

pub use error::{Result, StoreError};

pub mod prelude {
    pub use crate::config::BenchConfig;
    pub use crate::dtype::{Datatype, Element};
    pub use crate::error::StoreError;
    pub use crate::extent::{Extent, Extents};
    pub use crate::path::{matrix_path, AsObjectPath, ObjectPath};
    pub use crate::slab::{Hyperslab, Quadrant};
    pub use crate::store::{ArrayInfo, ArrayStore, Entity, H5Store, Location, MemStore};
    pub use crate::workload::{CancelToken, Execution, MatrixSet, Outcome};
}
