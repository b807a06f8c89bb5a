//! Hyperslabs: axis-aligned rectangular sub-regions of an array.
//!
//! A [`Hyperslab`] is an `offset` and a `count` per axis, validated against the shape of the
//! array it is used with. Extraction from and insertion into a row-major buffer is done by
//! walking the contiguous runs of the selection (see [`Runs`]).

use std::fmt;

use itertools::izip;

use crate::error::{Result, StoreError};
use crate::extent::Extents;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hyperslab {
    offset: Vec<usize>,
    count: Vec<usize>,
}

impl Hyperslab {
    /// Select `count` elements from `offset` along each axis of an array of `shape`.
    pub fn new(shape: &[usize], offset: &[usize], count: &[usize]) -> Result<Hyperslab> {
        let slab = Hyperslab {
            offset: offset.to_vec(),
            count: count.to_vec(),
        };
        slab.check(shape)?;
        Ok(slab)
    }

    /// Like [`Hyperslab::new`], for callers holding signed coordinates. Negative offsets or
    /// counts are out of bounds.
    pub fn from_signed(shape: &[usize], offset: &[i64], count: &[i64]) -> Result<Hyperslab> {
        let oob = || StoreError::SelectionOutOfBounds {
            offset: offset.to_vec(),
            count: count.to_vec(),
            shape: shape.to_vec(),
        };

        let offset = offset
            .iter()
            .map(|&o| usize::try_from(o).map_err(|_| oob()))
            .collect::<Result<Vec<_>>>()?;
        let count = count
            .iter()
            .map(|&c| usize::try_from(c).map_err(|_| oob()))
            .collect::<Result<Vec<_>>>()?;

        Hyperslab::new(shape, &offset, &count)
    }

    /// Resolve range-style extents against `shape`.
    pub fn from_extents<E>(shape: &[usize], extents: E) -> Result<Hyperslab>
    where
        E: TryInto<Extents>,
        E::Error: Into<StoreError>,
    {
        let extents: Extents = extents.try_into().map_err(Into::into)?;
        let (offset, count) = extents.start_count(shape)?;
        Hyperslab::new(shape, &offset, &count)
    }

    /// The whole array.
    pub fn all(shape: &[usize]) -> Hyperslab {
        Hyperslab {
            offset: vec![0; shape.len()],
            count: shape.to_vec(),
        }
    }

    /// Check that the selection lies within an array of `shape`.
    pub fn check(&self, shape: &[usize]) -> Result<()> {
        let fits = self.offset.len() == shape.len()
            && self.count.len() == shape.len()
            && checked_len(shape).is_some()
            && izip!(&self.offset, &self.count, shape)
                .all(|(&o, &c, &sz)| c > 0 && o.checked_add(c).is_some_and(|end| end <= sz));

        if fits {
            Ok(())
        } else {
            Err(StoreError::out_of_bounds(&self.offset, &self.count, shape))
        }
    }

    pub fn offset(&self) -> &[usize] {
        &self.offset
    }

    pub fn count(&self) -> &[usize] {
        &self.count
    }

    pub fn rank(&self) -> usize {
        self.count.len()
    }

    /// Number of selected elements.
    pub fn len(&self) -> usize {
        self.count.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if the selection covers all of `shape`.
    pub fn is_full(&self, shape: &[usize]) -> bool {
        self.offset.iter().all(|&o| o == 0) && self.count == shape
    }

    pub fn contains(&self, coords: &[usize]) -> bool {
        coords.len() == self.rank()
            && izip!(coords, &self.offset, &self.count).all(|(&x, &o, &c)| x >= o && x < o + c)
    }

    /// Split a 2-D array in four at `shape[i] / 2`. With odd sizes the bottom and right
    /// halves get the extra row or column.
    pub fn quadrants(shape: &[usize]) -> Result<[(Quadrant, Hyperslab); 4]> {
        let &[rows, cols] = shape else {
            return Err(StoreError::InvalidShape(shape.to_vec()));
        };
        if rows < 2 || cols < 2 {
            return Err(StoreError::InvalidShape(shape.to_vec()));
        }

        let (r0, c0) = (rows / 2, cols / 2);
        let (r1, c1) = (rows - r0, cols - c0);

        let slab = |offset: [usize; 2], count: [usize; 2]| Hyperslab {
            offset: offset.to_vec(),
            count: count.to_vec(),
        };

        Ok([
            (Quadrant::TopLeft, slab([0, 0], [r0, c0])),
            (Quadrant::TopRight, slab([0, c0], [r0, c1])),
            (Quadrant::BottomLeft, slab([r0, 0], [r1, c0])),
            (Quadrant::BottomRight, slab([r0, c0], [r1, c1])),
        ])
    }

    /// Split axis 0 into blocks of at most `rows` rows, covering the whole array.
    pub fn row_blocks(shape: &[usize], rows: usize) -> Result<Vec<Hyperslab>> {
        if shape.is_empty() || shape.contains(&0) || rows == 0 {
            return Err(StoreError::InvalidShape(shape.to_vec()));
        }

        Ok((0..shape[0])
            .step_by(rows)
            .map(|start| {
                let mut offset = vec![0; shape.len()];
                let mut count = shape.to_vec();
                offset[0] = start;
                count[0] = rows.min(shape[0] - start);
                Hyperslab { offset, count }
            })
            .collect())
    }

    /// Contiguous runs `(start, len)` in a row-major buffer of `shape`. Must be checked
    /// against `shape` first.
    pub fn runs(&self, shape: &[usize]) -> Runs {
        Runs::new(self, shape)
    }
}

impl fmt::Display for Hyperslab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset: {:?}, size: {:?}", self.offset, self.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub fn name(&self) -> &'static str {
        match self {
            Quadrant::TopLeft => "Top-Left",
            Quadrant::TopRight => "Top-Right",
            Quadrant::BottomLeft => "Bottom-Left",
            Quadrant::BottomRight => "Bottom-Right",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row-major strides (in elements) of `shape`.
pub fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

pub fn coords_to_offset(coords: &[usize], strides: &[usize]) -> usize {
    coords.iter().zip(strides).map(|(c, s)| c * s).sum()
}

/// Convert an offset in a row-major buffer to coordinates.
pub fn offset_to_coords(offset: usize, strides: &[usize]) -> Vec<usize> {
    strides
        .iter()
        .scan(offset, |offset, &s| {
            let c = *offset / s;
            *offset -= c * s;
            Some(c)
        })
        .collect()
}

/// Iterator over the contiguous runs of a hyperslab in a row-major buffer.
///
/// Starting at the last axis, every trailing axis that is selected in full is merged into
/// the run of the axis before it, so a selection of whole rows yields a single run.
pub struct Runs {
    strides: Vec<usize>,
    offset: Vec<usize>,
    count: Vec<usize>,
    /// Number of outer axes walked by `index`.
    outer: usize,
    /// Elements per run.
    run: usize,
    /// Position among the outer axes, `None` when exhausted.
    index: Option<Vec<usize>>,
}

impl Runs {
    fn new(slab: &Hyperslab, shape: &[usize]) -> Runs {
        debug_assert!(slab.check(shape).is_ok());

        let strides = strides(shape);
        let rank = shape.len();

        // Merge fully selected trailing axes into the innermost partially selected one.
        let mut inner = rank.saturating_sub(1);
        while inner > 0 && slab.offset[inner] == 0 && slab.count[inner] == shape[inner] {
            inner -= 1;
        }
        let run = if rank == 0 {
            1
        } else {
            slab.count[inner] * strides[inner]
        };

        Runs {
            strides,
            offset: slab.offset.clone(),
            count: slab.count.clone(),
            outer: inner,
            run,
            index: Some(vec![0; inner]),
        }
    }
}

impl Iterator for Runs {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index.as_mut()?;

        let inner = self
            .offset
            .get(self.outer)
            .map_or(0, |o| o * self.strides[self.outer]);
        let start = izip!(index.iter(), &self.offset, &self.strides)
            .map(|(i, o, s)| (i + o) * s)
            .sum::<usize>()
            + inner;

        // advance the odometer over the outer axes
        let mut axis = self.outer;
        loop {
            if axis == 0 {
                self.index = None;
                break;
            }
            axis -= 1;
            index[axis] += 1;
            if index[axis] < self.count[axis] {
                break;
            }
            index[axis] = 0;
        }

        Some((start, self.run))
    }
}

/// Product of `dims`, or `None` if it does not fit in `usize`.
pub(crate) fn checked_len(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

fn array_len(shape: &[usize]) -> Result<usize> {
    checked_len(shape).ok_or_else(|| StoreError::InvalidShape(shape.to_vec()))
}

/// Copy the selected elements of `src` (row-major, `shape`) into a new buffer, row-major
/// relative to `slab.count()`.
pub fn gather<T: Copy>(src: &[T], shape: &[usize], slab: &Hyperslab) -> Result<Vec<T>> {
    slab.check(shape)?;
    let expected = array_len(shape)?;
    if src.len() != expected {
        return Err(StoreError::SizeMismatch {
            expected,
            actual: src.len(),
        });
    }

    let mut dst = Vec::with_capacity(slab.len());
    for (start, len) in slab.runs(shape) {
        dst.extend_from_slice(&src[start..start + len]);
    }
    debug_assert_eq!(dst.len(), slab.len());

    Ok(dst)
}

/// Inverse of [`gather`]: write `data` into the selected elements of `dst`.
pub fn scatter<T: Copy>(dst: &mut [T], shape: &[usize], slab: &Hyperslab, data: &[T]) -> Result<()> {
    slab.check(shape)?;
    if data.len() != slab.len() {
        return Err(StoreError::SizeMismatch {
            expected: slab.len(),
            actual: data.len(),
        });
    }
    let expected = array_len(shape)?;
    if dst.len() != expected {
        return Err(StoreError::SizeMismatch {
            expected,
            actual: dst.len(),
        });
    }

    let mut data = data;
    for (start, len) in slab.runs(shape) {
        let (head, tail) = data.split_at(len);
        dst[start..start + len].copy_from_slice(head);
        data = tail;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: usize, cols: usize) -> Vec<i32> {
        (0..rows * cols).map(|v| v as i32 + 1).collect()
    }

    #[test]
    fn test_offset_to_coords() {
        assert_eq!(strides(&[4, 6]), [6, 1]);
        assert_eq!(strides(&[2, 4, 8]), [32, 8, 1]);

        assert_eq!(offset_to_coords(0, &[8, 4, 1]), [0, 0, 0]);
        assert_eq!(offset_to_coords(2, &[8, 4, 1]), [0, 0, 2]);
        assert_eq!(offset_to_coords(4, &[8, 4, 1]), [0, 1, 0]);
        assert_eq!(offset_to_coords(16 + 4, &[8, 4, 1]), [2, 1, 0]);

        assert_eq!(coords_to_offset(&[2, 1, 0], &[8, 4, 1]), 16 + 4);
        assert_eq!(coords_to_offset(&[0, 1, 0], &[8, 4, 1]), 4);
        assert_eq!(coords_to_offset(&[0, 0, 2], &[8, 4, 1]), 2);
    }

    #[test]
    fn select_top_right() {
        let shape = [4, 6];
        let m = matrix(4, 6);
        let slab = Hyperslab::new(&shape, &[0, 3], &[2, 3]).unwrap();
        assert_eq!(gather(&m, &shape, &slab).unwrap(), [4, 5, 6, 10, 11, 12]);
    }

    #[test]
    fn bounds() {
        let shape = [4, 6];
        assert!(Hyperslab::new(&shape, &[0, 0], &[4, 6]).is_ok());
        assert!(matches!(
            Hyperslab::new(&shape, &[1, 0], &[4, 6]),
            Err(StoreError::SelectionOutOfBounds { .. })
        ));
        assert!(matches!(
            Hyperslab::new(&shape, &[0, 0], &[0, 6]),
            Err(StoreError::SelectionOutOfBounds { .. })
        ));
        assert!(matches!(
            Hyperslab::new(&shape, &[0], &[1]),
            Err(StoreError::SelectionOutOfBounds { .. })
        ));
        assert!(matches!(
            Hyperslab::new(&shape, &[usize::MAX, 0], &[2, 1]),
            Err(StoreError::SelectionOutOfBounds { .. })
        ));
        assert!(matches!(
            Hyperslab::from_signed(&shape, &[-1, 0], &[2, 2]),
            Err(StoreError::SelectionOutOfBounds { .. })
        ));
        assert!(Hyperslab::from_signed(&shape, &[1, 2], &[2, 2]).is_ok());
    }

    #[test]
    fn runs_merge_full_rows() {
        let shape = [4, 6];
        let slab = Hyperslab::new(&shape, &[1, 0], &[2, 6]).unwrap();
        assert_eq!(slab.runs(&shape).collect::<Vec<_>>(), [(6, 12)]);

        let all = Hyperslab::all(&shape);
        assert_eq!(all.runs(&shape).collect::<Vec<_>>(), [(0, 24)]);

        let cols = Hyperslab::new(&shape, &[1, 2], &[3, 2]).unwrap();
        assert_eq!(
            cols.runs(&shape).collect::<Vec<_>>(),
            [(8, 2), (14, 2), (20, 2)]
        );
    }

    #[test]
    fn runs_3d() {
        let shape = [3, 4, 5];
        let src = (0..60).collect::<Vec<i32>>();
        let slab = Hyperslab::new(&shape, &[1, 1, 2], &[2, 2, 3]).unwrap();

        let mut expected = Vec::new();
        for i in 1..3 {
            for j in 1..3 {
                for k in 2..5 {
                    expected.push((i * 20 + j * 5 + k) as i32);
                }
            }
        }
        assert_eq!(gather(&src, &shape, &slab).unwrap(), expected);

        // planes [1, 3) in full
        let planes = Hyperslab::new(&shape, &[1, 0, 0], &[2, 4, 5]).unwrap();
        assert_eq!(planes.runs(&shape).collect::<Vec<_>>(), [(20, 40)]);
    }

    #[test]
    fn runs_1d() {
        let shape = [10];
        let slab = Hyperslab::new(&shape, &[3], &[4]).unwrap();
        assert_eq!(slab.runs(&shape).collect::<Vec<_>>(), [(3, 4)]);
    }

    #[test]
    fn scatter_then_gather() {
        let shape = [4, 6];
        let mut m = vec![0; 24];
        let slab = Hyperslab::new(&shape, &[2, 1], &[2, 4]).unwrap();
        scatter(&mut m, &shape, &slab, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        assert_eq!(&m[12..18], &[0, 1, 2, 3, 4, 0]);
        assert_eq!(&m[18..24], &[0, 5, 6, 7, 8, 0]);
        assert!(m[..12].iter().all(|&v| v == 0));

        assert!(matches!(
            scatter(&mut m, &shape, &slab, &[1, 2, 3]),
            Err(StoreError::SizeMismatch {
                expected: 8,
                actual: 3
            })
        ));
    }

    #[test]
    fn quadrants_even() {
        let shape = [4, 6];
        let m = matrix(4, 6);
        let q = Hyperslab::quadrants(&shape).unwrap();

        let values = q
            .iter()
            .map(|(_, s)| gather(&m, &shape, s).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(q[0].0, Quadrant::TopLeft);
        assert_eq!(values[0], [1, 2, 3, 7, 8, 9]);
        assert_eq!(values[1], [4, 5, 6, 10, 11, 12]);
        assert_eq!(values[2], [13, 14, 15, 19, 20, 21]);
        assert_eq!(values[3], [16, 17, 18, 22, 23, 24]);
    }

    #[test]
    fn quadrants_partition() {
        for shape in [[4, 6], [2, 2], [10, 8], [5, 7], [3, 2]] {
            let q = Hyperslab::quadrants(&shape).unwrap();
            let st = strides(&shape);

            for offset in 0..shape.iter().product() {
                let coords = offset_to_coords(offset, &st);
                let hits = q.iter().filter(|(_, s)| s.contains(&coords)).count();
                assert_eq!(hits, 1, "{coords:?} in {shape:?}");
            }

            let total: usize = q.iter().map(|(_, s)| s.len()).sum();
            assert_eq!(total, shape.iter().product::<usize>());
        }

        assert!(Hyperslab::quadrants(&[1, 4]).is_err());
        assert!(Hyperslab::quadrants(&[4, 4, 4]).is_err());
    }

    #[test]
    fn row_blocks_cover() {
        let shape = [10, 3];
        let blocks = Hyperslab::row_blocks(&shape, 4).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[2].offset(), [8, 0]);
        assert_eq!(blocks[2].count(), [2, 3]);
        assert_eq!(blocks.iter().map(Hyperslab::len).sum::<usize>(), 30);

        assert!(Hyperslab::row_blocks(&shape, 0).is_err());
    }

    #[test]
    fn from_extents() {
        let shape = [4, 6];
        let a = Hyperslab::from_extents(&shape, [0..2, 3..6]).unwrap();
        let b = Hyperslab::new(&shape, &[0, 3], &[2, 3]).unwrap();
        assert_eq!(a, b);

        let all = Hyperslab::from_extents(&shape, ..).unwrap();
        assert!(all.is_full(&shape));

        assert!(Hyperslab::from_extents(&shape, [0..5, 0..1]).is_err());
    }

    #[test]
    fn overflowing_shape() {
        let shape = [1 << 33, 1 << 33];
        assert_eq!(checked_len(&shape), None);
        assert!(matches!(
            Hyperslab::new(&shape, &[0, 0], &[1, 1]),
            Err(StoreError::SelectionOutOfBounds { .. })
        ));
        assert!(matches!(
            gather(&[0i32], &shape, &Hyperslab::all(&[1, 1])),
            Err(StoreError::SelectionOutOfBounds { .. })
        ));
    }
}
