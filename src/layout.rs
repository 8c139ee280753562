//! Layout descriptors: the shape/stride metadata of a strided array.

use std::sync::Arc;

use crate::{ArrayError, Result};

/// Shape and per-axis strides of a strided array.
///
/// Strides count elements, not bytes, and may be negative (an axis walked
/// backwards through the buffer). A zero stride is only legal on a degenerate
/// axis (extent 0 or 1); the broadcast constructor on views is the one place
/// that produces zero strides on wider axes deliberately.
///
/// Shape and strides are shared (`Arc`), so views derived from one another
/// clone the descriptor cheaply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Arc<[usize]>,
    stride: Arc<[isize]>,
}

impl Layout {
    /// Build a layout from explicit shape and strides.
    pub fn new(shape: &[usize], stride: &[isize]) -> Result<Self> {
        if shape.len() != stride.len() {
            return Err(ArrayError::InvalidLayout(format!(
                "shape has {} axes but stride has {}",
                shape.len(),
                stride.len()
            )));
        }
        for (axis, (&n, &s)) in shape.iter().zip(stride.iter()).enumerate() {
            if s == 0 && n > 1 {
                return Err(ArrayError::InvalidLayout(format!(
                    "zero stride on axis {axis} with extent {n}"
                )));
            }
        }
        Ok(Self {
            shape: shape.into(),
            stride: stride.into(),
        })
    }

    /// Contiguous row-major layout: the last axis is unit-stride.
    pub fn row_major(shape: &[usize]) -> Self {
        let mut stride = vec![1isize; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            // degenerate extents keep unit runs so empty shapes never
            // produce zero strides
            stride[i] = stride[i + 1] * shape[i + 1].max(1) as isize;
        }
        Self {
            shape: shape.into(),
            stride: stride.into(),
        }
    }

    pub(crate) fn new_unchecked(shape: &[usize], stride: &[isize]) -> Self {
        debug_assert_eq!(shape.len(), stride.len());
        Self {
            shape: shape.into(),
            stride: stride.into(),
        }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn stride(&self) -> &[isize] {
        &self.stride
    }

    /// Number of logical elements: the product of all extents.
    ///
    /// A rank-0 layout holds one element; any zero extent makes the whole
    /// layout empty.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the innermost axis is unit-stride.
    ///
    /// Deliberately cheap: it inspects the last axis only and says nothing
    /// about outer axes, so a row-gapped two-dimensional layout still passes.
    /// Rank 0 counts as contiguous. [`is_contiguous`](Self::is_contiguous)
    /// is the full check.
    pub fn is_fast_contiguous(&self) -> bool {
        match self.stride.last() {
            Some(&s) => s == 1,
            None => true,
        }
    }

    /// Whether visiting every element in logical order walks the buffer as a
    /// single unit-stride run.
    ///
    /// Axes of extent 0 or 1 contribute nothing to the walk and are skipped;
    /// each remaining axis must step exactly one run of the axes inside it.
    /// Strictly stronger than the last-axis check except on layouts whose
    /// trailing axes are degenerate.
    pub fn is_contiguous(&self) -> bool {
        let mut run = 1isize;
        for (&n, &s) in self.shape.iter().zip(self.stride.iter()).rev() {
            if n <= 1 {
                continue;
            }
            if s != run {
                return false;
            }
            run = run.saturating_mul(n as isize);
        }
        true
    }

    /// Linear element offset of a multi-dimensional index.
    ///
    /// The sum of `index[i] * stride[i]`, signed: reversed axes produce
    /// negative offsets relative to the view origin.
    pub fn linear_offset(&self, index: &[usize]) -> Result<isize> {
        if index.len() != self.rank() {
            return Err(ArrayError::InvalidLayout(format!(
                "index has {} components for a rank-{} layout",
                index.len(),
                self.rank()
            )));
        }
        let mut offset = 0isize;
        for (axis, (&i, (&n, &s))) in index
            .iter()
            .zip(self.shape.iter().zip(self.stride.iter()))
            .enumerate()
        {
            if i >= n {
                return Err(ArrayError::IndexOutOfRange {
                    axis,
                    index: i,
                    extent: n,
                });
            }
            offset += i as isize * s;
        }
        Ok(offset)
    }

    /// Smallest and largest linear offsets reachable by an in-range index.
    ///
    /// Only meaningful when `size() > 0`; callers skip the bounds check for
    /// empty layouts because no element is ever addressed.
    pub(crate) fn offset_extents(&self) -> Result<(isize, isize)> {
        let overflow = || ArrayError::InvalidLayout("stride arithmetic overflow".into());
        let mut min = 0isize;
        let mut max = 0isize;
        for (&n, &s) in self.shape.iter().zip(self.stride.iter()) {
            let span = s.checked_mul(n.saturating_sub(1) as isize).ok_or_else(overflow)?;
            if span >= 0 {
                max = max.checked_add(span).ok_or_else(overflow)?;
            } else {
                min = min.checked_add(span).ok_or_else(overflow)?;
            }
        }
        Ok((min, max))
    }

    /// Copy of this layout with one axis replaced.
    ///
    /// Bypasses the zero-stride validation; the slicing and broadcast paths
    /// guarantee the combination stays sound.
    pub(crate) fn with_axis(&self, axis: usize, extent: usize, stride: isize) -> Self {
        let mut shape = self.shape.to_vec();
        let mut strides = self.stride.to_vec();
        shape[axis] = extent;
        strides[axis] = stride;
        Self {
            shape: shape.into(),
            stride: strides.into(),
        }
    }
}
