//! Errors returned by the array stores.

use std::convert::Infallible;

use crate::dtype::Datatype;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("path `{0}` already exists")]
    DuplicatePath(String),

    #[error("`{0}` not found")]
    NotFound(String),

    #[error("invalid shape {0:?}")]
    InvalidShape(Vec<usize>),

    #[error("size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("type mismatch: stored as {stored:?}, accessed as {requested:?}")]
    TypeMismatch {
        stored: Datatype,
        requested: Datatype,
    },

    #[error("unsupported element type {0:?}")]
    UnsupportedType(Datatype),

    #[error("selection out of bounds: offset {offset:?}, count {count:?} in shape {shape:?}")]
    SelectionOutOfBounds {
        offset: Vec<i64>,
        count: Vec<i64>,
        shape: Vec<usize>,
    },

    #[error("unsupported selection: {0}")]
    UnsupportedSelection(&'static str),

    #[error("attribute `{name}` already exists on `{path}`")]
    DuplicateAttribute { path: String, name: String },

    #[error("storage backend failure: {0}")]
    StorageBackendFailure(#[from] hdf5::Error),
}

impl StoreError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: &'static str) -> StoreError {
        StoreError::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    pub(crate) fn out_of_bounds(offset: &[usize], count: &[usize], shape: &[usize]) -> StoreError {
        StoreError::SelectionOutOfBounds {
            offset: offset.iter().map(|&o| o as i64).collect(),
            count: count.iter().map(|&c| c as i64).collect(),
            shape: shape.to_vec(),
        }
    }
}

impl From<Infallible> for StoreError {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
