//! Array store on an HDF5 file.
//!
//! Groups map to HDF5 groups, arrays to contiguous datasets and attributes to HDF5 attributes
//! on the dataset. Every HDF5 object opened here is dropped before the call returns, so
//! handles are released child first on all exit paths.

use std::iter;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use hdf5::{Dataset, File, SliceOrIndex};
use ndarray::{ArrayD, ArrayViewD, IxDyn};

use super::{check_dtype, check_len, check_shape, ArrayInfo, ArrayStore, Entity};
use crate::dtype::{Datatype, Element};
use crate::error::{Result, StoreError};
use crate::path::{AsObjectPath, ObjectPath};
use crate::slab::Hyperslab;

enum Object {
    Dataset(Dataset),
    Group,
}

pub struct H5Store {
    file: File,
    path: PathBuf,

    /// Held while the object structure is checked and changed.
    structure: Mutex<()>,
}

impl H5Store {
    /// Create a new file, truncating any existing one.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<H5Store> {
        let path = path.as_ref();
        log::debug!("creating {path:?}");
        Ok(H5Store::with_file(File::create(path)?, path))
    }

    /// Open an existing file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<H5Store> {
        let path = path.as_ref();
        Ok(H5Store::with_file(File::open(path)?, path))
    }

    /// Open an existing file for reading and writing.
    pub fn open_rw<P: AsRef<Path>>(path: P) -> Result<H5Store> {
        let path = path.as_ref();
        Ok(H5Store::with_file(File::open_rw(path)?, path))
    }

    fn with_file(file: File, path: &Path) -> H5Store {
        H5Store {
            file,
            path: path.into(),
            structure: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying HDF5 file.
    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn flush(&self) -> Result<()> {
        Ok(self.file.flush()?)
    }

    /// Flush and close the file, reporting errors that dropping would hide.
    pub fn close(self) -> Result<()> {
        log::debug!("closing {:?}", self.path);
        self.file.flush()?;
        Ok(self.file.close()?)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.structure.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn object(&self, path: &ObjectPath) -> Result<Object> {
        if path.is_root() {
            return Ok(Object::Group);
        }

        let missing = path
            .ancestors()
            .chain(iter::once(path.clone()))
            .any(|p| !self.file.link_exists(&p.to_string()));
        if missing {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let name = path.to_string();
        if let Ok(ds) = self.file.dataset(&name) {
            Ok(Object::Dataset(ds))
        } else if self.file.group(&name).is_ok() {
            Ok(Object::Group)
        } else {
            Err(StoreError::invalid_path(
                name,
                "is neither a group nor a dataset",
            ))
        }
    }

    fn entity(&self, path: &ObjectPath) -> Result<Entity> {
        match self.object(path)? {
            Object::Dataset(ds) => Ok(Entity::Array(ArrayInfo {
                path: path.clone(),
                shape: ds.shape(),
                dtype: Datatype::from(ds.dtype()?),
            })),
            Object::Group => Ok(Entity::Group),
        }
    }

    /// Run `create` once the ancestors of `path` exist. Groups created on the way are removed
    /// again if `create` fails.
    fn with_parents<R>(
        &self,
        path: &ObjectPath,
        parents: bool,
        create: impl FnOnce() -> Result<R>,
    ) -> Result<R> {
        let mut created = Vec::new();
        let result = self
            .ensure_parents(path, parents, &mut created)
            .and_then(|()| create());

        if result.is_err() {
            for group in created.iter().rev() {
                log::debug!("removing intermediate group {group}");
                if let Err(e) = self.file.unlink(&group.to_string()) {
                    log::warn!("could not remove {group}: {e}");
                }
            }
        }
        result
    }

    fn ensure_parents(
        &self,
        path: &ObjectPath,
        parents: bool,
        created: &mut Vec<ObjectPath>,
    ) -> Result<()> {
        for ancestor in path.ancestors() {
            match self.entity(&ancestor) {
                Ok(Entity::Group) => {}
                Ok(Entity::Array(_)) => {
                    return Err(StoreError::invalid_path(
                        path.to_string(),
                        "parent is an array",
                    ))
                }
                Err(StoreError::NotFound(_)) if parents => {
                    log::debug!("creating intermediate group {ancestor}");
                    self.file.create_group(&ancestor.to_string())?;
                    created.push(ancestor);
                }
                Err(StoreError::NotFound(_)) => {
                    return Err(StoreError::invalid_path(
                        path.to_string(),
                        "parent group does not exist",
                    ))
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn array(&self, path: &ObjectPath) -> Result<Dataset> {
        match self.object(path)? {
            Object::Dataset(ds) => Ok(ds),
            Object::Group => Err(StoreError::invalid_path(
                path.to_string(),
                "is a group, not an array",
            )),
        }
    }

    /// Open the dataset at `path` and check that it holds `T`.
    fn dataset<T: Element>(&self, path: &ObjectPath) -> Result<Dataset> {
        let ds = self.array(path)?;
        check_dtype::<T>(Datatype::from(ds.dtype()?))?;
        Ok(ds)
    }

    fn new_dataset<T: Element>(&self, name: &str, shape: &[usize]) -> Result<Dataset> {
        Ok(self
            .file
            .new_dataset::<T>()
            .shape(shape.to_vec())
            .create(name)?)
    }
}

/// Convert a hyperslab to an HDF5 selection.
fn selection(slab: &Hyperslab) -> hdf5::Selection {
    let dims = slab
        .offset()
        .iter()
        .zip(slab.count())
        .map(|(&o, &c)| SliceOrIndex::from(o..o + c))
        .collect::<Vec<_>>();

    hdf5::Selection::from(hdf5::Hyperslab::from(dims))
}

impl ArrayStore for H5Store {
    fn create_group(&self, path: impl AsObjectPath, parents: bool) -> Result<()> {
        let path = path.object_path()?;
        let _guard = self.lock();

        match self.entity(&path) {
            Ok(_) => return Err(StoreError::DuplicatePath(path.to_string())),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        self.with_parents(&path, parents, || {
            log::debug!("create group {path}");
            self.file.create_group(&path.to_string())?;
            Ok(())
        })
    }

    fn resolve(&self, path: impl AsObjectPath) -> Result<Entity> {
        let path = path.object_path()?;
        self.entity(&path)
    }

    fn members(&self, path: impl AsObjectPath) -> Result<Vec<String>> {
        let path = path.object_path()?;
        if let Entity::Array(_) = self.entity(&path)? {
            return Err(StoreError::invalid_path(
                path.to_string(),
                "is an array, not a group",
            ));
        }

        let mut names = self.file.group(&path.to_string())?.member_names()?;
        names.sort();
        Ok(names)
    }

    fn create_array(
        &self,
        path: impl AsObjectPath,
        shape: &[usize],
        dtype: Datatype,
    ) -> Result<()> {
        let path = path.object_path()?;
        check_shape(shape)?;
        let _guard = self.lock();

        match self.entity(&path) {
            Ok(_) => return Err(StoreError::DuplicatePath(path.to_string())),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        self.with_parents(&path, false, || {
            let name = path.to_string();
            log::debug!("create dataset {name}: {shape:?} of {dtype:?}");
            match dtype {
                Datatype::Int(4) => self.new_dataset::<i32>(&name, shape)?,
                Datatype::Int(8) => self.new_dataset::<i64>(&name, shape)?,
                Datatype::Float(4) => self.new_dataset::<f32>(&name, shape)?,
                Datatype::Float(8) => self.new_dataset::<f64>(&name, shape)?,
                dtype => return Err(StoreError::UnsupportedType(dtype)),
            };
            Ok(())
        })
    }

    fn remove(&self, path: impl AsObjectPath) -> Result<()> {
        let path = path.object_path()?;
        if path.is_root() {
            return Err(StoreError::invalid_path("/", "the root group cannot be removed"));
        }
        let _guard = self.lock();

        self.entity(&path)?;
        log::debug!("unlink {path}");
        self.file.unlink(&path.to_string())?;
        Ok(())
    }

    fn write_full<T: Element>(&self, path: impl AsObjectPath, data: &[T]) -> Result<()> {
        let path = path.object_path()?;
        let ds = self.dataset::<T>(&path)?;
        check_len(ds.size(), data.len())?;

        ds.write_raw(data)?;
        Ok(())
    }

    fn read_full<T: Element>(&self, path: impl AsObjectPath) -> Result<Vec<T>> {
        let path = path.object_path()?;
        let ds = self.dataset::<T>(&path)?;

        Ok(ds.read_raw::<T>()?)
    }

    fn read_selection<T: Element>(
        &self,
        path: impl AsObjectPath,
        slab: &Hyperslab,
    ) -> Result<Vec<T>> {
        let path = path.object_path()?;
        let ds = self.dataset::<T>(&path)?;
        let shape = ds.shape();
        slab.check(&shape)?;

        if slab.is_full(&shape) {
            return Ok(ds.read_raw::<T>()?);
        }

        log::trace!("read {slab} from {path}");
        let values: ArrayD<T> = ds.read_slice(selection(slab))?;
        Ok(values.iter().copied().collect())
    }

    fn write_selection<T: Element>(
        &self,
        path: impl AsObjectPath,
        slab: &Hyperslab,
        data: &[T],
    ) -> Result<()> {
        let path = path.object_path()?;
        let ds = self.dataset::<T>(&path)?;
        slab.check(&ds.shape())?;
        check_len(slab.len(), data.len())?;

        let view = ArrayViewD::from_shape(IxDyn(slab.count()), data).map_err(|_| {
            StoreError::SizeMismatch {
                expected: slab.len(),
                actual: data.len(),
            }
        })?;

        log::trace!("write {slab} to {path}");
        ds.write_slice(view, selection(slab))?;
        Ok(())
    }

    fn attach_attribute<T: Element>(
        &self,
        path: impl AsObjectPath,
        name: &str,
        data: &[T],
        shape: &[usize],
    ) -> Result<()> {
        let path = path.object_path()?;
        check_len(check_shape(shape)?, data.len())?;
        let _guard = self.lock();

        let ds = self.array(&path)?;
        if ds.attr_names()?.iter().any(|n| n == name) {
            return Err(StoreError::DuplicateAttribute {
                path: path.to_string(),
                name: name.to_string(),
            });
        }

        log::debug!("attach attribute {name} to {path}");
        let view = ArrayViewD::from_shape(IxDyn(shape), data).map_err(|_| {
            StoreError::SizeMismatch {
                expected: shape.iter().product(),
                actual: data.len(),
            }
        })?;
        // the builder deletes the attribute again if writing the values fails
        ds.new_attr_builder().with_data(view).create(name)?;
        Ok(())
    }

    fn read_attribute<T: Element>(&self, path: impl AsObjectPath, name: &str) -> Result<Vec<T>> {
        let path = path.object_path()?;
        let ds = self.array(&path)?;
        if !ds.attr_names()?.iter().any(|n| n == name) {
            return Err(StoreError::NotFound(format!("{path}@{name}")));
        }

        let attr = ds.attr(name)?;
        check_dtype::<T>(Datatype::from(attr.dtype()?))?;
        Ok(attr.read_raw::<T>()?)
    }

    fn attribute_names(&self, path: impl AsObjectPath) -> Result<Vec<String>> {
        let path = path.object_path()?;
        let ds = self.array(&path)?;

        let mut names = ds.attr_names()?;
        names.sort();
        Ok(names)
    }
}
