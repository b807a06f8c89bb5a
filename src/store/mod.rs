//! Array stores: a catalog of groups and N-D arrays under hierarchical paths.
//!
//! [`ArrayStore`] is implemented in memory by [`MemStore`] and on HDF5 files by [`H5Store`].
//! Both are safe to share between threads: different paths can be used concurrently and
//! calls on the same path are serialized.
//!
//! ```
//! use slabstore::prelude::*;
//!
//! let store = MemStore::new();
//! store.create_group("/DataGroup/Matrices", true).unwrap();
//! store
//!     .put("/DataGroup/Matrices/matrix_data", &[4, 6], &(1..=24).collect::<Vec<i32>>())
//!     .unwrap();
//!
//! let slab = store.select("/DataGroup/Matrices/matrix_data", &[0, 3], &[2, 3]).unwrap();
//! let values = store
//!     .read_selection::<i32>("/DataGroup/Matrices/matrix_data", &slab)
//!     .unwrap();
//! assert_eq!(values, [4, 5, 6, 10, 11, 12]);
//! ```

use crate::dtype::{Datatype, Element};
use crate::error::{Result, StoreError};
use crate::path::{AsObjectPath, ObjectPath};
use crate::slab::{checked_len, Hyperslab, Quadrant};

pub mod h5;
pub mod mem;

pub use h5::H5Store;
pub use mem::MemStore;

/// Shape and element type of a stored array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayInfo {
    pub path: ObjectPath,
    pub shape: Vec<usize>,
    pub dtype: Datatype,
}

impl ArrayInfo {
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Group,
    Array(ArrayInfo),
}

/// Number of elements of an array of `shape`. Rank 0, empty axes and element counts that do
/// not fit in `usize` are `InvalidShape`.
pub(crate) fn check_shape(shape: &[usize]) -> Result<usize> {
    match checked_len(shape) {
        Some(len) if !shape.is_empty() && len > 0 => Ok(len),
        _ => Err(StoreError::InvalidShape(shape.to_vec())),
    }
}

pub(crate) fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(StoreError::SizeMismatch { expected, actual })
    }
}

pub(crate) fn check_dtype<T: Element>(stored: Datatype) -> Result<()> {
    if stored == T::DTYPE {
        Ok(())
    } else {
        Err(StoreError::TypeMismatch {
            stored,
            requested: T::DTYPE,
        })
    }
}

pub trait ArrayStore: Send + Sync {
    /// Create a group. With `parents` missing intermediate groups are created as well.
    fn create_group(&self, path: impl AsObjectPath, parents: bool) -> Result<()>;

    fn resolve(&self, path: impl AsObjectPath) -> Result<Entity>;

    /// Sorted names of the members of a group.
    fn members(&self, path: impl AsObjectPath) -> Result<Vec<String>>;

    /// Create a zero-filled array. The parent group must exist.
    fn create_array(&self, path: impl AsObjectPath, shape: &[usize], dtype: Datatype)
        -> Result<()>;

    /// Remove an array, or a group with everything below it.
    fn remove(&self, path: impl AsObjectPath) -> Result<()>;

    fn write_full<T: Element>(&self, path: impl AsObjectPath, data: &[T]) -> Result<()>;

    /// All elements in row-major order.
    fn read_full<T: Element>(&self, path: impl AsObjectPath) -> Result<Vec<T>>;

    /// Elements of `slab` in row-major order relative to `slab.count()`.
    fn read_selection<T: Element>(
        &self,
        path: impl AsObjectPath,
        slab: &Hyperslab,
    ) -> Result<Vec<T>>;

    fn write_selection<T: Element>(
        &self,
        path: impl AsObjectPath,
        slab: &Hyperslab,
        data: &[T],
    ) -> Result<()>;

    fn attach_attribute<T: Element>(
        &self,
        path: impl AsObjectPath,
        name: &str,
        data: &[T],
        shape: &[usize],
    ) -> Result<()>;

    fn read_attribute<T: Element>(&self, path: impl AsObjectPath, name: &str) -> Result<Vec<T>>;

    fn attribute_names(&self, path: impl AsObjectPath) -> Result<Vec<String>>;

    /// Shape and type of the array at `path`.
    fn info(&self, path: impl AsObjectPath) -> Result<ArrayInfo> {
        let path = path.object_path()?;
        match self.resolve(&path)? {
            Entity::Array(info) => Ok(info),
            Entity::Group => Err(StoreError::invalid_path(
                path.to_string(),
                "is a group, not an array",
            )),
        }
    }

    /// Validate a hyperslab against the array at `path`.
    fn select(&self, path: impl AsObjectPath, offset: &[usize], count: &[usize]) -> Result<Hyperslab> {
        let info = self.info(path)?;
        Hyperslab::new(&info.shape, offset, count)
    }

    /// The four quadrants of the 2-D array at `path`.
    fn quadrants(&self, path: impl AsObjectPath) -> Result<[(Quadrant, Hyperslab); 4]> {
        let info = self.info(path)?;
        Hyperslab::quadrants(&info.shape)
    }

    /// Create an array and write `data` to it. If the write fails the new array is removed
    /// again before the error is returned.
    fn put<T: Element>(&self, path: impl AsObjectPath, shape: &[usize], data: &[T]) -> Result<()> {
        let path = path.object_path()?;
        check_len(check_shape(shape)?, data.len())?;

        self.create_array(&path, shape, T::DTYPE)?;
        if let Err(e) = self.write_full(&path, data) {
            log::warn!("write to {path} failed, removing it: {e}");
            if let Err(re) = self.remove(&path) {
                log::warn!("could not remove {path}: {re}");
            }
            return Err(e);
        }
        Ok(())
    }

    /// A handle on the group at `path` for addressing objects relative to it.
    fn group(&self, path: impl AsObjectPath) -> Result<Location<'_, Self>>
    where
        Self: Sized,
    {
        let path = path.object_path()?;
        match self.resolve(&path)? {
            Entity::Group => Ok(Location {
                store: self,
                base: path,
            }),
            Entity::Array(_) => Err(StoreError::invalid_path(
                path.to_string(),
                "is an array, not a group",
            )),
        }
    }

    fn root(&self) -> Location<'_, Self>
    where
        Self: Sized,
    {
        Location {
            store: self,
            base: ObjectPath::root(),
        }
    }
}

/// A group in a store. Names given to a location are resolved relative to it, unless they
/// start with `/`.
pub struct Location<'s, S: ArrayStore> {
    store: &'s S,
    base: ObjectPath,
}

impl<'s, S: ArrayStore> Location<'s, S> {
    pub fn path(&self) -> &ObjectPath {
        &self.base
    }

    pub fn join(&self, name: &str) -> Result<ObjectPath> {
        self.base.join(name)
    }

    pub fn create_group(&self, name: &str) -> Result<Location<'s, S>> {
        let path = self.join(name)?;
        self.store.create_group(&path, false)?;
        Ok(Location {
            store: self.store,
            base: path,
        })
    }

    pub fn group(&self, name: &str) -> Result<Location<'s, S>> {
        self.store.group(self.join(name)?)
    }

    pub fn resolve(&self, name: &str) -> Result<Entity> {
        self.store.resolve(self.join(name)?)
    }

    pub fn members(&self) -> Result<Vec<String>> {
        self.store.members(&self.base)
    }

    pub fn create_array(&self, name: &str, shape: &[usize], dtype: Datatype) -> Result<ObjectPath> {
        let path = self.join(name)?;
        self.store.create_array(&path, shape, dtype)?;
        Ok(path)
    }

    pub fn put<T: Element>(&self, name: &str, shape: &[usize], data: &[T]) -> Result<ObjectPath> {
        let path = self.join(name)?;
        self.store.put(&path, shape, data)?;
        Ok(path)
    }

    pub fn read_full<T: Element>(&self, name: &str) -> Result<Vec<T>> {
        self.store.read_full(self.join(name)?)
    }
}
