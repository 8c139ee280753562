//! Sum and mean over strided views.
//!
//! Each call picks one of two strategies from the view's layout. `Flat` runs
//! a single unit-stride pass when the whole view collapses to one linear run;
//! `Generic` walks the odometer otherwise, with a tight inner loop over the
//! last axis. Both accumulate in the element's widened type and agree on the
//! same logical elements to floating rounding.

use log::trace;
use num_traits::Zero;

use crate::element::Element;
use crate::kernel::Odometer;
use crate::view::StridedView;

#[cfg(feature = "call-profiler")]
use crate::profile;

/// Iteration strategy for one reduction call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One unit-stride pass over the underlying run.
    Flat,
    /// Odometer traversal of the full index space.
    Generic,
}

/// Pick the strategy for a view.
///
/// `Flat` requires the cheap last-axis check *and* the single-run collapse.
/// Layouts that are only last-axis contiguous (row gaps) fall back to
/// `Generic`, as do collapsible layouts whose trailing degenerate axis
/// carries a non-unit stride: the cheap check stays the gate.
pub fn select_strategy<T: Element>(view: &StridedView<'_, T>) -> Strategy {
    let layout = view.layout();
    if layout.is_fast_contiguous() && layout.is_contiguous() {
        Strategy::Flat
    } else {
        Strategy::Generic
    }
}

/// Sum every element of the view in the widened accumulator type.
pub fn sum<T: Element>(view: &StridedView<'_, T>) -> T::Accum {
    #[cfg(feature = "call-profiler")]
    let _span = profile::scope("sum");

    let strategy = select_strategy(view);
    trace!(
        "sum over {} elements, shape {:?}: {strategy:?} path",
        view.size(),
        view.shape()
    );
    if strategy == Strategy::Flat {
        if let Some(run) = view.as_contiguous_slice() {
            return sum_flat(run);
        }
    }
    sum_generic(view)
}

/// Arithmetic mean of the view in `f64`; an empty view yields `0.0`.
pub fn mean<T: Element>(view: &StridedView<'_, T>) -> f64 {
    #[cfg(feature = "call-profiler")]
    let _span = profile::scope("mean");

    let n = view.size();
    if n == 0 {
        return 0.0;
    }
    T::accum_to_f64(sum(view)) / n as f64
}

fn sum_flat<T: Element>(run: &[T]) -> T::Accum {
    #[cfg(feature = "call-profiler")]
    let _span = profile::scope("sum_flat");

    let mut acc = T::Accum::zero();
    for &x in run {
        acc = acc + x.widen();
    }
    acc
}

fn sum_generic<T: Element>(view: &StridedView<'_, T>) -> T::Accum {
    #[cfg(feature = "call-profiler")]
    let _span = profile::scope("sum_generic");

    let layout = view.layout();
    let mut acc = T::Accum::zero();
    if layout.size() == 0 {
        return acc;
    }
    let base = view.origin_ptr();
    let rank = layout.rank();
    if rank == 0 {
        // SAFETY: size is 1 and the origin was validated at construction.
        return unsafe { *base }.widen();
    }
    let inner_n = layout.shape()[rank - 1];
    let inner_s = layout.stride()[rank - 1];
    for row in Odometer::over(&layout.shape()[..rank - 1], &layout.stride()[..rank - 1]) {
        let mut off = row;
        for _ in 0..inner_n {
            // SAFETY: every offset enumerated here was validated when the
            // view was constructed.
            acc = acc + unsafe { *base.offset(off) }.widen();
            off += inner_s;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{StridedArray, StridedRange, StridedView};
    use approx::assert_relative_eq;

    #[test]
    fn strategy_selection_table() {
        let data = vec![0.0f64; 400];

        let contiguous = StridedView::new(&data, &[10, 10], &[10, 1], 0).unwrap();
        assert_eq!(select_strategy(&contiguous), Strategy::Flat);

        let row_gapped = StridedView::new(&data, &[10, 10], &[20, 1], 0).unwrap();
        assert_eq!(select_strategy(&row_gapped), Strategy::Generic);

        let stepped = StridedView::new(&data, &[5], &[2], 0).unwrap();
        assert_eq!(select_strategy(&stepped), Strategy::Generic);

        // collapsible, but the trailing degenerate stride fails the gate
        let trailing = StridedView::new(&data, &[5, 1], &[1, 7], 0).unwrap();
        assert_eq!(select_strategy(&trailing), Strategy::Generic);

        let scalar = StridedView::new(&data, &[], &[], 0).unwrap();
        assert_eq!(select_strategy(&scalar), Strategy::Flat);

        let windowed = StridedView::new(&data, &[10], &[1], 37).unwrap();
        assert_eq!(select_strategy(&windowed), Strategy::Flat);
    }

    #[test]
    fn both_paths_agree_on_the_same_elements() {
        let data: Vec<f64> = (0..24).map(|i| (i as f64).sin()).collect();

        // same 24 elements, flat vs generic routing
        let flat = StridedView::new(&data, &[24], &[1], 0).unwrap();
        let generic = StridedView::new(&data, &[24, 1], &[1, 5], 0).unwrap();
        assert_eq!(select_strategy(&flat), Strategy::Flat);
        assert_eq!(select_strategy(&generic), Strategy::Generic);
        assert_relative_eq!(sum(&flat), sum(&generic), max_relative = 1e-12);
        assert_relative_eq!(mean(&flat), mean(&generic), max_relative = 1e-12);
    }

    #[test]
    fn generic_path_handles_contiguous_input_too() {
        let data: Vec<i32> = (0..60).collect();
        let v = StridedView::new(&data, &[3, 4, 5], &[20, 5, 1], 0).unwrap();
        assert_eq!(sum_generic(&v), (0..60).sum::<i32>() as i64);
        assert_eq!(sum_generic(&v), sum(&v));
    }

    #[test]
    fn scalar_and_empty_views() {
        let data = [42.0f64];
        let scalar = StridedView::new(&data, &[], &[], 0).unwrap();
        assert_eq!(sum(&scalar), 42.0);
        assert_eq!(mean(&scalar), 42.0);
        assert_eq!(sum_generic(&scalar), 42.0);

        let none: [f64; 0] = [];
        let empty = StridedView::new(&none, &[0], &[1], 0).unwrap();
        assert_eq!(sum(&empty), 0.0);
        assert_eq!(mean(&empty), 0.0);
    }

    #[test]
    fn stride_two_mean_is_exact() {
        let data = [1.0f64, 2.0, 3.0, 4.0];
        let v = StridedView::new(&data, &[2], &[2], 0).unwrap();
        assert_eq!(mean(&v), 2.0);
    }

    #[test]
    fn integer_kinds_widen_before_summing() {
        let bytes = vec![200u8; 100];
        let v = StridedView::new(&bytes, &[50], &[2], 0).unwrap();
        assert_eq!(sum(&v), 50u64 * 200);
        assert_eq!(mean(&v), 200.0);

        let signed: Vec<i8> = (0..100).map(|i| if i % 2 == 0 { 100 } else { -100 }).collect();
        let v = StridedView::new(&signed, &[100], &[1], 0).unwrap();
        assert_eq!(sum(&v), 0i64);
        assert_eq!(mean(&v), 0.0);

        let wide = vec![i64::MAX / 2; 4];
        let v = StridedView::new(&wide, &[4], &[1], 0).unwrap();
        assert_eq!(sum(&v), (i64::MAX / 2) as i128 * 4);
    }

    #[test]
    fn reversed_views_sum_like_forward_ones() {
        let arr = StridedArray::from_fn(&[100], |idx| idx[0] as f64 * 0.125);
        let fwd = arr.view();
        let rev = fwd.reverse_axis(0).unwrap();
        assert_eq!(select_strategy(&rev), Strategy::Generic);
        assert_relative_eq!(sum(&rev), sum(&fwd), max_relative = 1e-12);
    }

    #[test]
    fn broadcast_axes_count_every_logical_element() {
        let one = [3.0f64];
        let v = StridedView::new(&one, &[1], &[1], 0).unwrap();
        let wide = v.broadcast_axis(0, 8).unwrap();
        assert_eq!(sum(&wide), 24.0);
        assert_eq!(mean(&wide), 3.0);
    }

    #[test]
    fn windowed_slices_reduce_their_window_only() {
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let v = StridedView::new(&data, &[100], &[1], 0).unwrap();
        let w = v.slice_axis(0, StridedRange::new(10, 20, 1)).unwrap();
        assert_eq!(select_strategy(&w), Strategy::Flat);
        assert_eq!(mean(&w), 14.5);
    }
}
