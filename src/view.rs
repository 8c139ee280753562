//! Strided views over caller-owned memory and the owned row-major array.
//!
//! A [`StridedView`] borrows a plain slice and reinterprets it through a
//! [`Layout`]: per-axis extents and signed element strides relative to an
//! origin offset. Nothing is copied; the borrow keeps the buffer alive for as
//! long as the view exists. Construction validates once that every reachable
//! offset lands inside the buffer, so element access and the reduction
//! kernels can skip per-access checks.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut, Range, RangeFull};

use crate::element::{DType, Element};
use crate::kernel::Odometer;
use crate::layout::Layout;
use crate::{ArrayError, Result};

/// Half-open index window with a step, for per-axis slicing.
///
/// `start..end` always names the low-to-high window; the sign of `step`
/// decides the walking direction. A positive step visits `start`,
/// `start + step`, ...; a negative step visits the same window from its high
/// end downward, so `every(-1)` reverses an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridedRange {
    pub start: usize,
    pub end: usize,
    pub step: isize,
}

impl StridedRange {
    pub fn new(start: usize, end: usize, step: isize) -> Self {
        Self { start, end, step }
    }

    /// The whole axis, stepped. The end is clamped to the extent at slice
    /// time.
    pub fn every(step: isize) -> Self {
        Self {
            start: 0,
            end: usize::MAX,
            step,
        }
    }
}

impl From<Range<usize>> for StridedRange {
    fn from(r: Range<usize>) -> Self {
        Self::new(r.start, r.end, 1)
    }
}

impl From<RangeFull> for StridedRange {
    fn from(_: RangeFull) -> Self {
        Self::every(1)
    }
}

fn validate_span(layout: &Layout, offset: isize, len: usize) -> Result<()> {
    if layout.size() == 0 {
        return Ok(());
    }
    let overflow = || ArrayError::InvalidLayout("offset arithmetic overflow".into());
    let (min, max) = layout.offset_extents()?;
    let lo = offset.checked_add(min).ok_or_else(overflow)?;
    let hi = offset.checked_add(max).ok_or_else(overflow)?;
    if lo < 0 || hi >= len as isize {
        return Err(ArrayError::BufferTooSmall {
            min_offset: lo,
            max_offset: hi,
            len,
        });
    }
    Ok(())
}

/// Borrowed strided view of a slice.
#[derive(Clone)]
pub struct StridedView<'a, T: Element> {
    ptr: *const T,
    data: &'a [T],
    layout: Layout,
    offset: isize,
}

// SAFETY: the pointer is derived from the borrowed slice and never outlives
// it; the view grants the same access as &[T].
unsafe impl<T: Element> Send for StridedView<'_, T> {}
unsafe impl<T: Element> Sync for StridedView<'_, T> {}

impl<'a, T: Element> StridedView<'a, T> {
    /// Borrow `data` as a strided view.
    ///
    /// `offset` is the element index of the view origin inside `data`;
    /// negative strides walk backwards from there. Fails with
    /// [`ArrayError::BufferTooSmall`] unless every index reachable through
    /// `shape`/`stride` lands inside `data`. A zero-size layout performs no
    /// access and accepts any buffer, including an empty one.
    pub fn new(data: &'a [T], shape: &[usize], stride: &[isize], offset: isize) -> Result<Self> {
        let layout = Layout::new(shape, stride)?;
        Self::from_layout(data, layout, offset)
    }

    /// Borrow `data` without bounds validation.
    ///
    /// # Safety
    ///
    /// Every offset reachable through `shape`/`stride` from `offset` must lie
    /// inside `data`, and `shape`/`stride` must be of equal length.
    pub unsafe fn new_unchecked(
        data: &'a [T],
        shape: &[usize],
        stride: &[isize],
        offset: isize,
    ) -> Self {
        Self {
            ptr: data.as_ptr().wrapping_offset(offset),
            data,
            layout: Layout::new_unchecked(shape, stride),
            offset,
        }
    }

    pub(crate) fn from_layout(data: &'a [T], layout: Layout, offset: isize) -> Result<Self> {
        validate_span(&layout, offset, data.len())?;
        Ok(Self {
            ptr: data.as_ptr().wrapping_offset(offset),
            data,
            layout,
            offset,
        })
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn stride(&self) -> &[isize] {
        self.layout.stride()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Element offset of the view origin inside the underlying buffer.
    pub fn offset(&self) -> isize {
        self.offset
    }

    pub(crate) fn origin_ptr(&self) -> *const T {
        self.ptr
    }

    /// Checked element read.
    pub fn get(&self, index: &[usize]) -> Result<T> {
        let off = self.layout.linear_offset(index)?;
        // SAFETY: the index was bounds-checked and construction validated
        // every reachable offset.
        Ok(unsafe { *self.ptr.offset(off) })
    }

    /// Iterate elements in logical order, axis 0 outermost.
    pub fn iter(&self) -> Iter<'a, T> {
        Iter {
            base: self.ptr,
            om: Odometer::new(&self.layout),
            _marker: PhantomData,
        }
    }

    /// The view's elements as one contiguous slice, when the layout walks
    /// the buffer as a single unit-stride run.
    pub fn as_contiguous_slice(&self) -> Option<&'a [T]> {
        if !self.layout.is_contiguous() {
            return None;
        }
        if self.size() == 0 {
            return Some(&[]);
        }
        // SAFETY: a single-run layout addresses exactly size() elements
        // forward from the origin, all validated at construction.
        Some(unsafe { std::slice::from_raw_parts(self.ptr, self.size()) })
    }

    /// Restrict one axis to a stepped window.
    ///
    /// The window is clamped to the axis extent; the result shares the
    /// buffer. `step == 0` is invalid. Accepts a [`StridedRange`], a plain
    /// `start..end`, or `..` for the full axis.
    pub fn slice_axis(&self, axis: usize, range: impl Into<StridedRange>) -> Result<Self> {
        let (layout, offset) = self.sliced_layout(axis, range.into())?;
        Self::from_layout(self.data, layout, offset)
    }

    /// Reverse the logical order of one axis.
    pub fn reverse_axis(&self, axis: usize) -> Result<Self> {
        self.slice_axis(axis, StridedRange::every(-1))
    }

    /// Repeat a degenerate axis without copying.
    ///
    /// The axis must currently have extent 1; it becomes `extent` logical
    /// copies sharing one stored element (stride 0). This is the only
    /// constructor that pairs a zero stride with a wider axis.
    pub fn broadcast_axis(&self, axis: usize, extent: usize) -> Result<Self> {
        if axis >= self.rank() {
            return Err(ArrayError::InvalidLayout(format!(
                "axis {axis} out of range for rank {}",
                self.rank()
            )));
        }
        let current = self.layout.shape()[axis];
        if current != 1 {
            return Err(ArrayError::InvalidLayout(format!(
                "broadcast axis {axis} has extent {current}, expected 1"
            )));
        }
        let layout = self.layout.with_axis(axis, extent, 0);
        Self::from_layout(self.data, layout, self.offset)
    }

    /// Arithmetic mean of all elements; `0.0` for an empty view.
    pub fn mean(&self) -> f64 {
        crate::reduce::mean(self)
    }

    /// Sum of all elements in the widened accumulator type.
    pub fn sum(&self) -> T::Accum {
        crate::reduce::sum(self)
    }

    fn sliced_layout(&self, axis: usize, r: StridedRange) -> Result<(Layout, isize)> {
        if axis >= self.rank() {
            return Err(ArrayError::InvalidLayout(format!(
                "axis {axis} out of range for rank {}",
                self.rank()
            )));
        }
        if r.step == 0 {
            return Err(ArrayError::InvalidLayout("slice step must be nonzero".into()));
        }
        let extent = self.layout.shape()[axis];
        let stride = self.layout.stride()[axis];
        let start = r.start.min(extent);
        let end = r.end.min(extent);
        let width = end.saturating_sub(start);
        let count = width.div_ceil(r.step.unsigned_abs());
        let first = if count == 0 {
            start
        } else if r.step > 0 {
            start
        } else {
            end - 1
        };
        let overflow = || ArrayError::InvalidLayout("stride arithmetic overflow".into());
        let new_stride = stride.checked_mul(r.step).ok_or_else(overflow)?;
        let offset = self
            .offset
            .checked_add((first as isize).checked_mul(stride).ok_or_else(overflow)?)
            .ok_or_else(overflow)?;
        Ok((self.layout.with_axis(axis, count, new_stride), offset))
    }
}

impl<T: Element> fmt::Debug for StridedView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedView")
            .field("dtype", &T::DTYPE.name())
            .field("shape", &self.shape())
            .field("stride", &self.stride())
            .field("offset", &self.offset)
            .finish()
    }
}

/// Logical-order element iterator of a view. Yields copies.
pub struct Iter<'a, T: Element> {
    base: *const T,
    om: Odometer,
    _marker: PhantomData<&'a [T]>,
}

impl<T: Element> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        // SAFETY: the odometer only produces offsets validated when the view
        // was constructed.
        self.om.next().map(|off| unsafe { *self.base.offset(off) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.om.size_hint()
    }
}

impl<T: Element> ExactSizeIterator for Iter<'_, T> {}

/// Mutable strided view of a slice.
///
/// Same layout rules as [`StridedView`], with checked element writes. The
/// exclusive borrow keeps the buffer uniquely ours for the view's lifetime.
pub struct StridedViewMut<'a, T: Element> {
    ptr: *mut T,
    len: usize,
    layout: Layout,
    offset: isize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: the pointer is derived from the exclusively borrowed slice; the
// view grants the same access as &mut [T].
unsafe impl<T: Element> Send for StridedViewMut<'_, T> {}

impl<'a, T: Element> StridedViewMut<'a, T> {
    /// Borrow `data` mutably as a strided view. Bounds rules match
    /// [`StridedView::new`].
    pub fn new(
        data: &'a mut [T],
        shape: &[usize],
        stride: &[isize],
        offset: isize,
    ) -> Result<Self> {
        let layout = Layout::new(shape, stride)?;
        validate_span(&layout, offset, data.len())?;
        Ok(Self {
            ptr: data.as_mut_ptr().wrapping_offset(offset),
            len: data.len(),
            layout,
            offset,
            _marker: PhantomData,
        })
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn stride(&self) -> &[isize] {
        self.layout.stride()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Checked element read.
    pub fn get(&self, index: &[usize]) -> Result<T> {
        let off = self.layout.linear_offset(index)?;
        // SAFETY: see StridedView::get.
        Ok(unsafe { *self.ptr.offset(off) })
    }

    /// Checked element write.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        let off = self.layout.linear_offset(index)?;
        // SAFETY: see StridedView::get; the borrow is exclusive.
        unsafe { *self.ptr.offset(off) = value };
        Ok(())
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> StridedView<'_, T> {
        let base = self.ptr.wrapping_offset(-self.offset) as *const T;
        // SAFETY: base..base+len is the buffer this view was built over,
        // exclusively borrowed for 'a and reborrowed shared here.
        let data = unsafe { std::slice::from_raw_parts(base, self.len) };
        StridedView {
            ptr: self.ptr as *const T,
            data,
            layout: self.layout.clone(),
            offset: self.offset,
        }
    }

    pub fn mean(&self) -> f64 {
        self.as_view().mean()
    }

    pub fn sum(&self) -> T::Accum {
        self.as_view().sum()
    }
}

impl<T: Element> fmt::Debug for StridedViewMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedViewMut")
            .field("dtype", &T::DTYPE.name())
            .field("shape", &self.shape())
            .field("stride", &self.stride())
            .field("offset", &self.offset)
            .finish()
    }
}

/// Owned row-major array.
#[derive(Debug, Clone)]
pub struct StridedArray<T: Element> {
    data: Vec<T>,
    layout: Layout,
}

impl<T: Element> StridedArray<T> {
    /// Zero-filled array. Any zero extent yields a valid empty array.
    pub fn zeros(shape: &[usize]) -> Self {
        let layout = Layout::row_major(shape);
        Self {
            data: vec![T::zero(); layout.size()],
            layout,
        }
    }

    /// Wrap a row-major buffer; its length must equal the shape's size.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let layout = Layout::row_major(shape);
        if data.len() != layout.size() {
            return Err(ArrayError::InvalidLayout(format!(
                "buffer holds {} elements but shape {:?} needs {}",
                data.len(),
                shape,
                layout.size()
            )));
        }
        Ok(Self { data, layout })
    }

    /// Build from a function of the multi-index, filling in row-major order.
    pub fn from_fn(shape: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Self {
        let layout = Layout::row_major(shape);
        let size = layout.size();
        let mut data = Vec::with_capacity(size);
        let mut index = vec![0usize; shape.len()];
        for _ in 0..size {
            data.push(f(&index));
            for axis in (0..shape.len()).rev() {
                index[axis] += 1;
                if index[axis] < shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        Self { data, layout }
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn stride(&self) -> &[isize] {
        self.layout.stride()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Borrow the whole array as a view.
    pub fn view(&self) -> StridedView<'_, T> {
        StridedView {
            ptr: self.data.as_ptr(),
            data: &self.data,
            layout: self.layout.clone(),
            offset: 0,
        }
    }

    /// Borrow the whole array as a mutable view.
    pub fn view_mut(&mut self) -> StridedViewMut<'_, T> {
        StridedViewMut {
            ptr: self.data.as_mut_ptr(),
            len: self.data.len(),
            layout: self.layout.clone(),
            offset: 0,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, index: &[usize]) -> Result<T> {
        self.view().get(index)
    }

    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        self.view_mut().set(index, value)
    }

    pub fn mean(&self) -> f64 {
        self.view().mean()
    }

    pub fn sum(&self) -> T::Accum {
        self.view().sum()
    }
}

impl<T: Element> Index<&[usize]> for StridedArray<T> {
    type Output = T;

    fn index(&self, index: &[usize]) -> &T {
        match self.layout.linear_offset(index) {
            Ok(off) => &self.data[off as usize],
            Err(e) => panic!("index {index:?}: {e}"),
        }
    }
}

impl<T: Element> IndexMut<&[usize]> for StridedArray<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut T {
        match self.layout.linear_offset(index) {
            Ok(off) => &mut self.data[off as usize],
            Err(e) => panic!("index {index:?}: {e}"),
        }
    }
}
