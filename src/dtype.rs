//! Element types and typed buffers.

use std::fmt::Debug;

use hdf5::H5Type;

use crate::error::{Result, StoreError};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Datatype {
    UInt(usize),
    Int(usize),
    Float(usize),
    Custom(usize),
}

impl Datatype {
    pub fn dsize(&self) -> usize {
        use Datatype::*;

        match self {
            UInt(sz) | Int(sz) | Float(sz) | Custom(sz) => *sz,
        }
    }
}

impl From<hdf5::Datatype> for Datatype {
    fn from(dtype: hdf5::Datatype) -> Self {
        Datatype::from(&dtype)
    }
}

impl From<&hdf5::Datatype> for Datatype {
    fn from(dtype: &hdf5::Datatype) -> Self {
        match dtype {
            _ if dtype.is::<u8>() => Datatype::UInt(dtype.size()),
            _ if dtype.is::<u16>() => Datatype::UInt(dtype.size()),
            _ if dtype.is::<u32>() => Datatype::UInt(dtype.size()),
            _ if dtype.is::<u64>() => Datatype::UInt(dtype.size()),
            _ if dtype.is::<i8>() => Datatype::Int(dtype.size()),
            _ if dtype.is::<i16>() => Datatype::Int(dtype.size()),
            _ if dtype.is::<i32>() => Datatype::Int(dtype.size()),
            _ if dtype.is::<i64>() => Datatype::Int(dtype.size()),
            _ if dtype.is::<f32>() => Datatype::Float(dtype.size()),
            _ if dtype.is::<f64>() => Datatype::Float(dtype.size()),
            _ => Datatype::Custom(dtype.size()),
        }
    }
}

/// Owned, typed storage for the elements of an array or attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Buffer {
    /// Zero-filled buffer of `len` elements.
    pub fn zeroed(dtype: Datatype, len: usize) -> Result<Buffer> {
        Ok(match dtype {
            Datatype::Int(4) => Buffer::I32(vec![0; len]),
            Datatype::Int(8) => Buffer::I64(vec![0; len]),
            Datatype::Float(4) => Buffer::F32(vec![0.; len]),
            Datatype::Float(8) => Buffer::F64(vec![0.; len]),
            dtype => return Err(StoreError::UnsupportedType(dtype)),
        })
    }

    pub fn dtype(&self) -> Datatype {
        match self {
            Buffer::I32(_) => i32::DTYPE,
            Buffer::I64(_) => i64::DTYPE,
            Buffer::F32(_) => f32::DTYPE,
            Buffer::F64(_) => f64::DTYPE,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Buffer::I32(v) => v.len(),
            Buffer::I64(v) => v.len(),
            Buffer::F32(v) => v.len(),
            Buffer::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the elements as `T`, failing with `TypeMismatch` for any other type.
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        T::slice(self).ok_or(StoreError::TypeMismatch {
            stored: self.dtype(),
            requested: T::DTYPE,
        })
    }

    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T]> {
        let stored = self.dtype();
        T::slice_mut(self).ok_or(StoreError::TypeMismatch {
            stored,
            requested: T::DTYPE,
        })
    }
}

/// Scalar types that can be stored in an array.
pub trait Element: H5Type + Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    const DTYPE: Datatype;

    fn slice(buf: &Buffer) -> Option<&[Self]>;

    fn slice_mut(buf: &mut Buffer) -> Option<&mut [Self]>;

    fn into_buffer(values: Vec<Self>) -> Buffer;
}

macro_rules! impl_element {
    ($t: ty, $variant: ident, $dtype: expr) => {
        impl Element for $t {
            const DTYPE: Datatype = $dtype;

            fn slice(buf: &Buffer) -> Option<&[Self]> {
                match buf {
                    Buffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn slice_mut(buf: &mut Buffer) -> Option<&mut [Self]> {
                match buf {
                    Buffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_buffer(values: Vec<Self>) -> Buffer {
                Buffer::$variant(values)
            }
        }
    };
}

impl_element!(i32, I32, Datatype::Int(4));
impl_element!(i64, I64, Datatype::Int(8));
impl_element!(f32, F32, Datatype::Float(4));
impl_element!(f64, F64, Datatype::Float(8));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_buffers() {
        let b = Buffer::zeroed(Datatype::Int(4), 6).unwrap();
        assert_eq!(b.dtype(), Datatype::Int(4));
        assert_eq!(b.as_slice::<i32>().unwrap(), &[0; 6]);

        let b = Buffer::zeroed(Datatype::Float(8), 3).unwrap();
        assert_eq!(b.as_slice::<f64>().unwrap(), &[0.; 3]);

        assert!(matches!(
            Buffer::zeroed(Datatype::UInt(2), 3),
            Err(StoreError::UnsupportedType(Datatype::UInt(2)))
        ));
    }

    #[test]
    fn typed_access_is_checked() {
        let mut b = i32::into_buffer(vec![1, 2, 3]);
        assert!(matches!(
            b.as_slice::<f64>(),
            Err(StoreError::TypeMismatch {
                stored: Datatype::Int(4),
                requested: Datatype::Float(8)
            })
        ));
        b.as_mut_slice::<i32>().unwrap()[1] = 7;
        assert_eq!(b, Buffer::I32(vec![1, 7, 3]));
    }

    #[test]
    fn from_hdf5_datatype() {
        let dt = hdf5::Datatype::from_type::<f64>().unwrap();
        assert_eq!(Datatype::from(dt), Datatype::Float(8));

        let dt = hdf5::Datatype::from_type::<i32>().unwrap();
        assert_eq!(Datatype::from(&dt), Datatype::Int(4));
    }
}
