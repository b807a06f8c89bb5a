//! In-memory array store.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::{check_len, check_shape, ArrayInfo, ArrayStore, Entity};
use crate::dtype::{Buffer, Datatype, Element};
use crate::error::{Result, StoreError};
use crate::path::{AsObjectPath, ObjectPath};
use crate::slab::{self, Hyperslab};

#[derive(Debug)]
struct Attribute {
    shape: Vec<usize>,
    buf: Buffer,
}

#[derive(Debug)]
struct Array {
    shape: Vec<usize>,
    buf: Buffer,
    attrs: BTreeMap<String, Attribute>,
}

#[derive(Debug, Clone)]
enum Node {
    Group,
    Array(Arc<RwLock<Array>>),
}

/// Catalog and storage held in process memory.
///
/// The catalog is behind one lock, taken for writing only to add or remove entries. Every
/// array has its own lock, so I/O on different arrays never contends, and concurrent calls
/// on the same array are serialized.
#[derive(Debug, Default)]
pub struct MemStore {
    nodes: RwLock<BTreeMap<ObjectPath, Node>>,
}

impl MemStore {
    pub fn new() -> MemStore {
        MemStore::default()
    }

    fn node(&self, path: &ObjectPath) -> Result<Node> {
        if path.is_root() {
            return Ok(Node::Group);
        }
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        nodes
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn array(&self, path: &ObjectPath) -> Result<Arc<RwLock<Array>>> {
        match self.node(path)? {
            Node::Array(a) => Ok(a),
            Node::Group => Err(StoreError::invalid_path(
                path.to_string(),
                "is a group, not an array",
            )),
        }
    }

    fn read<R>(&self, path: &ObjectPath, f: impl FnOnce(&Array) -> Result<R>) -> Result<R> {
        let array = self.array(path)?;
        let array = array.read().unwrap_or_else(PoisonError::into_inner);
        f(&array)
    }

    fn write<R>(&self, path: &ObjectPath, f: impl FnOnce(&mut Array) -> Result<R>) -> Result<R> {
        let array = self.array(path)?;
        let mut array = array.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut array)
    }
}

/// Check that every ancestor of `path` is a group, creating missing ones when `parents` is
/// set.
fn ensure_parents(
    nodes: &mut BTreeMap<ObjectPath, Node>,
    path: &ObjectPath,
    parents: bool,
) -> Result<()> {
    for ancestor in path.ancestors() {
        match nodes.get(&ancestor) {
            Some(Node::Group) => {}
            Some(Node::Array(_)) => {
                return Err(StoreError::invalid_path(
                    path.to_string(),
                    "parent is an array",
                ))
            }
            None if parents => {
                log::debug!("creating intermediate group {ancestor}");
                nodes.insert(ancestor, Node::Group);
            }
            None => {
                return Err(StoreError::invalid_path(
                    path.to_string(),
                    "parent group does not exist",
                ))
            }
        }
    }
    Ok(())
}

impl ArrayStore for MemStore {
    fn create_group(&self, path: impl AsObjectPath, parents: bool) -> Result<()> {
        let path = path.object_path()?;
        if path.is_root() {
            return Err(StoreError::DuplicatePath(path.to_string()));
        }

        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if nodes.contains_key(&path) {
            return Err(StoreError::DuplicatePath(path.to_string()));
        }
        ensure_parents(&mut nodes, &path, parents)?;

        log::debug!("create group {path}");
        nodes.insert(path, Node::Group);
        Ok(())
    }

    fn resolve(&self, path: impl AsObjectPath) -> Result<Entity> {
        let path = path.object_path()?;
        match self.node(&path)? {
            Node::Group => Ok(Entity::Group),
            Node::Array(a) => {
                let a = a.read().unwrap_or_else(PoisonError::into_inner);
                Ok(Entity::Array(ArrayInfo {
                    path,
                    shape: a.shape.clone(),
                    dtype: a.buf.dtype(),
                }))
            }
        }
    }

    fn members(&self, path: impl AsObjectPath) -> Result<Vec<String>> {
        let path = path.object_path()?;
        if let Node::Array(_) = self.node(&path)? {
            return Err(StoreError::invalid_path(
                path.to_string(),
                "is an array, not a group",
            ));
        }

        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        Ok(nodes
            .keys()
            .filter(|k| k.depth() == path.depth() + 1 && k.starts_with(&path))
            .filter_map(|k| k.name().map(String::from))
            .collect())
    }

    fn create_array(
        &self,
        path: impl AsObjectPath,
        shape: &[usize],
        dtype: Datatype,
    ) -> Result<()> {
        let path = path.object_path()?;
        let len = check_shape(shape)?;
        if path.is_root() {
            return Err(StoreError::DuplicatePath(path.to_string()));
        }
        let buf = Buffer::zeroed(dtype, len)?;

        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if nodes.contains_key(&path) {
            return Err(StoreError::DuplicatePath(path.to_string()));
        }
        ensure_parents(&mut nodes, &path, false)?;

        log::debug!("create array {path}: {shape:?} of {dtype:?}");
        nodes.insert(
            path,
            Node::Array(Arc::new(RwLock::new(Array {
                shape: shape.to_vec(),
                buf,
                attrs: BTreeMap::new(),
            }))),
        );
        Ok(())
    }

    fn remove(&self, path: impl AsObjectPath) -> Result<()> {
        let path = path.object_path()?;
        if path.is_root() {
            return Err(StoreError::invalid_path("/", "the root group cannot be removed"));
        }

        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if !nodes.contains_key(&path) {
            return Err(StoreError::NotFound(path.to_string()));
        }

        log::debug!("remove {path}");
        nodes.retain(|k, _| !k.starts_with(&path));
        Ok(())
    }

    fn write_full<T: Element>(&self, path: impl AsObjectPath, data: &[T]) -> Result<()> {
        let path = path.object_path()?;
        self.write(&path, |a| {
            let buf = a.buf.as_mut_slice::<T>()?;
            check_len(buf.len(), data.len())?;
            buf.copy_from_slice(data);
            Ok(())
        })
    }

    fn read_full<T: Element>(&self, path: impl AsObjectPath) -> Result<Vec<T>> {
        let path = path.object_path()?;
        self.read(&path, |a| Ok(a.buf.as_slice::<T>()?.to_vec()))
    }

    fn read_selection<T: Element>(
        &self,
        path: impl AsObjectPath,
        slab: &Hyperslab,
    ) -> Result<Vec<T>> {
        let path = path.object_path()?;
        self.read(&path, |a| slab::gather(a.buf.as_slice::<T>()?, &a.shape, slab))
    }

    fn write_selection<T: Element>(
        &self,
        path: impl AsObjectPath,
        slab: &Hyperslab,
        data: &[T],
    ) -> Result<()> {
        let path = path.object_path()?;
        self.write(&path, |a| {
            let buf = a.buf.as_mut_slice::<T>()?;
            slab::scatter(buf, &a.shape, slab, data)
        })
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

        self.write(&path, |a| {
            if a.attrs.contains_key(name) {
                return Err(StoreError::DuplicateAttribute {
                    path: path.to_string(),
                    name: name.to_string(),
                });
            }
            log::debug!("attach attribute {name} to {path}");
            a.attrs.insert(
                name.to_string(),
                Attribute {
                    shape: shape.to_vec(),
                    buf: T::into_buffer(data.to_vec()),
                },
            );
            Ok(())
        })
    }

    fn read_attribute<T: Element>(&self, path: impl AsObjectPath, name: &str) -> Result<Vec<T>> {
        let path = path.object_path()?;
        self.read(&path, |a| {
            let attr = a
                .attrs
                .get(name)
                .ok_or_else(|| StoreError::NotFound(format!("{path}@{name}")))?;
            debug_assert_eq!(attr.shape.iter().product::<usize>(), attr.buf.len());
            Ok(attr.buf.as_slice::<T>()?.to_vec())
        })
    }

    fn attribute_names(&self, path: impl AsObjectPath) -> Result<Vec<String>> {
        let path = path.object_path()?;
        self.read(&path, |a| Ok(a.attrs.keys().cloned().collect()))
    }
}
