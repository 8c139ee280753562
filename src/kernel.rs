//! Odometer traversal of strided layouts.
//!
//! The generic reduction path walks a layout the way an odometer counts: the
//! innermost axis increments first and overflow carries outward. The linear
//! offset is maintained incrementally, so each step costs a few adds instead
//! of a full index/stride dot product.

use crate::layout::Layout;

/// Incremental multi-index cursor yielding linear offsets in logical order.
///
/// Axis 0 is outermost, the last axis fastest. An empty layout yields
/// nothing; a rank-0 layout yields a single zero offset. At every step the
/// yielded offset equals `linear_offset` of the current multi-index.
pub(crate) struct Odometer {
    shape: Vec<usize>,
    stride: Vec<isize>,
    index: Vec<usize>,
    offset: isize,
    remaining: usize,
}

impl Odometer {
    pub(crate) fn new(layout: &Layout) -> Self {
        Self::over(layout.shape(), layout.stride())
    }

    /// Cursor over an explicit shape/stride pair, e.g. the outer axes of a
    /// layout whose innermost axis is handled by a tight loop.
    pub(crate) fn over(shape: &[usize], stride: &[isize]) -> Self {
        debug_assert_eq!(shape.len(), stride.len());
        Self {
            shape: shape.to_vec(),
            stride: stride.to_vec(),
            index: vec![0; shape.len()],
            offset: 0,
            remaining: shape.iter().product(),
        }
    }
}

impl Iterator for Odometer {
    type Item = isize;

    fn next(&mut self) -> Option<isize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.offset;
        for axis in (0..self.index.len()).rev() {
            self.index[axis] += 1;
            self.offset += self.stride[axis];
            if self.index[axis] < self.shape[axis] {
                return Some(current);
            }
            // overflow: rewind this axis and carry outward
            self.offset -= self.shape[axis] as isize * self.stride[axis];
            self.index[axis] = 0;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Odometer {}
