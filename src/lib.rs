//! Strided N-dimensional array views with widened reductions and a
//! call-path timing profiler.
//!
//! # Core Types
//!
//! - [`Layout`]: shape and signed per-axis strides, with the cheap last-axis
//!   contiguity check and the full single-run check.
//! - [`StridedView`] / [`StridedViewMut`]: non-owning views over caller
//!   slices. The borrow pins the buffer; construction validates the whole
//!   reachable span once.
//! - [`StridedArray`]: owned row-major container.
//! - [`CallProfiler`] / [`SpanReport`]: wall-time spans aggregated by call
//!   path into a `{name, total_time, count, children}` tree.
//!
//! # Reductions
//!
//! [`mean`] and [`sum`] pick between a flat unit-stride pass and an odometer
//! walk per call, and accumulate in a widened type per element kind
//! (integers in 64 bits or more, floats in `f64`), so strided and
//! contiguous views of the same elements agree.
//!
//! # Example
//!
//! ```
//! use strided_stats::StridedView;
//!
//! // every other element of a contiguous buffer, no copy
//! let data = [1.0f64, 2.0, 3.0, 4.0];
//! let view = StridedView::new(&data, &[2], &[2], 0)?;
//! assert_eq!(view.mean(), 2.0);
//!
//! // reversed axis over the same buffer
//! let full = StridedView::new(&data, &[4], &[1], 0)?;
//! let rev = full.reverse_axis(0)?;
//! assert_eq!(rev.get(&[0])?, 4.0);
//! assert_eq!(rev.mean(), full.mean());
//! # Ok::<(), strided_stats::ArrayError>(())
//! ```
//!
//! # Profiling
//!
//! ```
//! use strided_stats::profile;
//!
//! profile::reset();
//! {
//!     let _span = profile::scope("load");
//!     // timed work, ended on every exit path
//! }
//! let report = profile::result();
//! assert_eq!(report.children[0].name, "load");
//! assert_eq!(report.children[0].count, 1);
//! ```

pub mod element;
mod kernel;
pub mod layout;
pub mod profile;
pub mod reduce;
pub mod view;

// ============================================================================
// Core containers and layout metadata
// ============================================================================
pub use element::{DType, Element};
pub use layout::Layout;
pub use view::{Iter, StridedArray, StridedRange, StridedView, StridedViewMut};

// ============================================================================
// Reduction entry points
// ============================================================================
pub use reduce::{mean, select_strategy, sum, Strategy};

// ============================================================================
// Profiler surface
// ============================================================================
pub use profile::{CallProfiler, ProfileError, ScopedSpan, SpanReport};

/// Errors from layout and view construction or element access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrayError {
    /// Shape/stride combination that cannot describe an array.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// A reachable element offset falls outside the provided buffer.
    #[error("buffer of {len} elements cannot hold offsets {min_offset}..={max_offset}")]
    BufferTooSmall {
        min_offset: isize,
        max_offset: isize,
        len: usize,
    },

    /// A multi-index component is outside its axis extent.
    #[error("index {index} out of range for axis {axis} with extent {extent}")]
    IndexOutOfRange {
        axis: usize,
        index: usize,
        extent: usize,
    },
}

/// Crate-wide result alias for array errors.
pub type Result<T> = std::result::Result<T, ArrayError>;
