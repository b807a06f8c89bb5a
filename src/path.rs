//! Hierarchical object paths, e.g. `/DataGroup/Matrices/matrix_data`.
//!
//! An [`ObjectPath`] is always absolute and canonical. Relative names are resolved against a
//! base with [`ObjectPath::join`]; an absolute name ignores the base, as in HDF5.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectPath {
    segments: Vec<String>,
}

impl ObjectPath {
    /// The root group `/`.
    #[must_use]
    pub fn root() -> ObjectPath {
        ObjectPath::default()
    }

    /// Parse a path relative to the root. A leading `/` is optional.
    pub fn parse(s: &str) -> Result<ObjectPath> {
        ObjectPath::root().join(s)
    }

    /// Resolve `name` against `self`. Absolute names (leading `/`) replace the base.
    pub fn join(&self, name: &str) -> Result<ObjectPath> {
        if name.is_empty() {
            return Err(StoreError::invalid_path(name, "empty path"));
        }

        let (mut segments, rest) = match name.strip_prefix('/') {
            Some(rest) => (Vec::new(), rest),
            None => (self.segments.clone(), name),
        };

        if rest.is_empty() {
            // "/" on its own
            return Ok(ObjectPath { segments });
        }

        for seg in rest.split('/') {
            match seg {
                "" => return Err(StoreError::invalid_path(name, "empty segment")),
                "." | ".." => {
                    return Err(StoreError::invalid_path(name, "`.` and `..` are not supported"))
                }
                seg => segments.push(seg.to_string()),
            }
        }

        Ok(ObjectPath { segments })
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Last segment, `None` for the root.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent group, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<ObjectPath> {
        if self.is_root() {
            None
        } else {
            Some(ObjectPath {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Proper ancestors below the root, shallowest first: `/a/b/c` gives `/a`, `/a/b`.
    pub fn ancestors(&self) -> impl Iterator<Item = ObjectPath> + '_ {
        (1..self.segments.len()).map(|n| ObjectPath {
            segments: self.segments[..n].to_vec(),
        })
    }

    /// `true` if `self` is `other` or lies below it.
    #[must_use]
    pub fn starts_with(&self, other: &ObjectPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Child of `self` named `name`; `name` must be a single segment.
    pub fn child(&self, name: &str) -> Result<ObjectPath> {
        if name.contains('/') {
            return Err(StoreError::invalid_path(name, "child name contains `/`"));
        }
        self.join(name)
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        ObjectPath::parse(s)
    }
}

/// Anything that names an object: string slices are parsed relative to the root.
pub trait AsObjectPath {
    fn object_path(&self) -> Result<ObjectPath>;
}

impl AsObjectPath for str {
    fn object_path(&self) -> Result<ObjectPath> {
        ObjectPath::parse(self)
    }
}

impl AsObjectPath for String {
    fn object_path(&self) -> Result<ObjectPath> {
        ObjectPath::parse(self)
    }
}

impl AsObjectPath for ObjectPath {
    fn object_path(&self) -> Result<ObjectPath> {
        Ok(self.clone())
    }
}

impl<T: AsObjectPath + ?Sized> AsObjectPath for &T {
    fn object_path(&self) -> Result<ObjectPath> {
        (**self).object_path()
    }
}

/// Dataset name used by the matrix workload: `/matrix_<i>`.
#[must_use]
pub fn matrix_path(i: usize) -> ObjectPath {
    ObjectPath {
        segments: vec![format!("matrix_{i}")],
    }
}
