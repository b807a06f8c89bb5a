//! Extents used for building hyperslabs from ranges.

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// An extent along one axis.
///
/// ```rust
/// # use slabstore::extent::Extent;
/// fn take_extent(e: impl Into<Extent>) {}
/// take_extent(3);
/// take_extent(..);
/// take_extent(..5);
/// take_extent(3..);
/// take_extent(3..=74);
/// // Start at 3 with 74 elements
/// take_extent((3, 74));
/// ```
pub enum Extent {
    /// From `start` to the end of the axis
    Slice { start: usize },
    /// From `start` up to, not including, `end`
    SliceEnd { start: usize, end: usize },
    /// `count` elements from `start`
    SliceCount { start: usize, count: usize },
    /// A single index (the axis is kept, with size 1)
    Index(usize),
}

impl From<usize> for Extent {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

impl From<RangeFrom<usize>> for Extent {
    fn from(range: RangeFrom<usize>) -> Self {
        Self::Slice { start: range.start }
    }
}

impl From<Range<usize>> for Extent {
    fn from(range: Range<usize>) -> Self {
        Self::SliceEnd {
            start: range.start,
            end: range.end,
        }
    }
}

impl From<RangeTo<usize>> for Extent {
    fn from(range: RangeTo<usize>) -> Self {
        Self::SliceEnd {
            start: 0,
            end: range.end,
        }
    }
}

impl From<RangeToInclusive<usize>> for Extent {
    fn from(range: RangeToInclusive<usize>) -> Self {
        Self::SliceEnd {
            start: 0,
            end: range.end + 1,
        }
    }
}

impl From<RangeInclusive<usize>> for Extent {
    fn from(range: RangeInclusive<usize>) -> Self {
        Self::SliceEnd {
            start: *range.start(),
            end: range.end() + 1,
        }
    }
}

impl From<RangeFull> for Extent {
    fn from(_: RangeFull) -> Self {
        Self::Slice { start: 0 }
    }
}

impl From<(usize, usize)> for Extent {
    fn from((start, count): (usize, usize)) -> Self {
        Self::SliceCount { start, count }
    }
}

impl Extent {
    /// Starting index and number of elements along an axis of size `dimsize`.
    fn start_count(&self, dimsize: usize) -> (usize, usize) {
        match *self {
            Self::Index(idx) => (idx, 1),
            Self::Slice { start } => (start, dimsize.saturating_sub(start)),
            Self::SliceEnd { start, end } => (start, end.saturating_sub(start)),
            Self::SliceCount { start, count } => (start, count),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// A selection in every axis of an array.
///
/// ```rust
/// # use slabstore::extent::{Extent, Extents};
/// fn take_extents(extents: impl TryInto<Extents>) {}
/// // Everything
/// take_extents(..);
/// // The first two rows, last three columns
/// take_extents([0..2, 3..6]);
/// // (start, count) per axis
/// take_extents([(0, 2), (3, 3)]);
/// // Offsets and counts as separate arrays
/// take_extents(([0, 3], [2, 3]));
/// // Mixed kinds
/// take_extents(vec![Extent::Index(1), (2..).into()]);
/// // The `ndarray::s!` macro
/// take_extents(ndarray::s![1..3, 2..]);
/// ```
pub enum Extents {
    /// The full array
    #[default]
    All,
    /// One extent per axis
    Extent(Vec<Extent>),
}

impl From<RangeFull> for Extents {
    fn from(_: RangeFull) -> Self {
        Self::All
    }
}

impl From<Vec<Extent>> for Extents {
    fn from(extents: Vec<Extent>) -> Self {
        Self::Extent(extents)
    }
}

impl<const N: usize> From<[Extent; N]> for Extents {
    fn from(extents: [Extent; N]) -> Self {
        Self::Extent(extents.to_vec())
    }
}

macro_rules! impl_extent_arrlike {
    ($item: ty) => {
        impl From<&'_ [$item]> for Extents {
            fn from(slice: &[$item]) -> Self {
                Self::Extent(slice.iter().cloned().map(Extent::from).collect())
            }
        }

        impl From<Vec<$item>> for Extents {
            fn from(slice: Vec<$item>) -> Self {
                Self::from(slice.as_slice())
            }
        }

        impl<const N: usize> From<[$item; N]> for Extents {
            fn from(slice: [$item; N]) -> Self {
                Self::from(slice.as_slice())
            }
        }
    };
}

impl_extent_arrlike!(usize);
impl_extent_arrlike!(Range<usize>);
impl_extent_arrlike!(RangeFrom<usize>);
impl_extent_arrlike!(RangeTo<usize>);
impl_extent_arrlike!(RangeInclusive<usize>);
impl_extent_arrlike!(RangeFull);
impl_extent_arrlike!((usize, usize));

impl<const N: usize> From<([usize; N], [usize; N])> for Extents {
    fn from((start, count): ([usize; N], [usize; N])) -> Self {
        Self::Extent(
            start
                .iter()
                .zip(&count)
                .map(|(&start, &count)| Extent::SliceCount { start, count })
                .collect(),
        )
    }
}

impl TryFrom<(&[usize], &[usize])> for Extents {
    type Error = StoreError;

    fn try_from((start, count): (&[usize], &[usize])) -> Result<Self> {
        if start.len() != count.len() {
            return Err(StoreError::out_of_bounds(start, count, &[]));
        }
        Ok(Self::Extent(
            start
                .iter()
                .zip(count)
                .map(|(&start, &count)| Extent::SliceCount { start, count })
                .collect(),
        ))
    }
}

impl Extents {
    /// Offsets and counts along each axis of `shape`. Bounds are checked by the caller.
    pub(crate) fn start_count(&self, shape: &[usize]) -> Result<(Vec<usize>, Vec<usize>)> {
        match self {
            Extents::All => Ok((vec![0; shape.len()], shape.to_vec())),
            Extents::Extent(extents) => {
                if extents.len() != shape.len() {
                    return Err(StoreError::SelectionOutOfBounds {
                        offset: Vec::new(),
                        count: Vec::new(),
                        shape: shape.to_vec(),
                    });
                }
                Ok(extents
                    .iter()
                    .zip(shape)
                    .map(|(e, &sz)| e.start_count(sz))
                    .unzip())
            }
        }
    }
}

mod ndarray_impl {
    use super::*;
    use ndarray::{Dimension, SliceInfo, SliceInfoElem};

    impl<T, Din: Dimension, Dout: Dimension> TryFrom<&'_ SliceInfo<T, Din, Dout>> for Extents
    where
        T: AsRef<[SliceInfoElem]>,
    {
        type Error = StoreError;

        fn try_from(slice: &SliceInfo<T, Din, Dout>) -> Result<Self> {
            let slice: &[SliceInfoElem] = slice.as_ref();
            let unsupported = StoreError::UnsupportedSelection;

            Ok(slice
                .iter()
                .map(|&s| match s {
                    SliceInfoElem::Slice { start, end, step } => {
                        let start =
                            usize::try_from(start).map_err(|_| unsupported("negative start"))?;
                        if step != 1 {
                            Err(unsupported("strides are not supported"))
                        } else if let Some(end) = end {
                            let end =
                                usize::try_from(end).map_err(|_| unsupported("negative end"))?;
                            Ok(Extent::SliceEnd { start, end })
                        } else {
                            Ok(Extent::Slice { start })
                        }
                    }
                    SliceInfoElem::Index(index) => usize::try_from(index)
                        .map(Extent::Index)
                        .map_err(|_| unsupported("negative index")),
                    SliceInfoElem::NewAxis => Err(unsupported("can't add new axis")),
                })
                .collect::<Result<Vec<Extent>>>()?
                .into())
        }
    }

    impl<T, Din: Dimension, Dout: Dimension> TryFrom<SliceInfo<T, Din, Dout>> for Extents
    where
        T: AsRef<[SliceInfoElem]>,
    {
        type Error = StoreError;

        fn try_from(slice: SliceInfo<T, Din, Dout>) -> Result<Self> {
            Self::try_from(&slice)
        }
    }
}
