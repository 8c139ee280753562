//! Call-path profiling scenarios: nested call trees, aggregation across
//! repeated calls, reset semantics, and the report's field contract.

use std::thread::sleep;
use std::time::Duration;

use strided_stats::{profile, CallProfiler, ProfileError, SpanReport, StridedView};

fn foo3(p: &mut CallProfiler) {
    p.begin_span("foo3");
    sleep(Duration::from_millis(7));
    p.end_span().unwrap();
}

fn foo2(p: &mut CallProfiler) {
    p.begin_span("foo2");
    sleep(Duration::from_millis(5));
    foo3(p);
    p.end_span().unwrap();
}

fn foo1(p: &mut CallProfiler) {
    p.begin_span("foo1");
    sleep(Duration::from_millis(3));
    foo2(p);
    p.end_span().unwrap();
}

#[test]
fn nested_calls_build_a_path_tree() {
    let mut p = CallProfiler::new();
    foo1(&mut p);

    let root = p.result();
    assert_eq!(root.name, "");
    assert_eq!(root.count, 0);
    assert_eq!(root.children.len(), 1);

    let f1 = &root.children[0];
    assert_eq!(f1.name, "foo1");
    assert_eq!(f1.count, 1);
    assert!(f1.total_time >= 0.015);

    let f2 = f1.child("foo2").unwrap();
    assert_eq!(f2.count, 1);
    assert!(f2.total_time >= 0.012);
    // a parent's time covers its children
    assert!(f1.total_time >= f2.total_time);

    let f3 = f2.child("foo3").unwrap();
    assert!(f3.total_time >= 0.007);
    assert!(f3.children.is_empty());
}

#[test]
fn repeated_paths_aggregate_into_the_same_nodes() {
    let mut p = CallProfiler::new();
    for _ in 0..3 {
        foo1(&mut p);
    }

    let root = p.result();
    assert_eq!(root.children.len(), 1);
    let f1 = &root.children[0];
    assert_eq!(f1.count, 3);
    assert!(f1.total_time >= 3.0 * 0.015);
    assert_eq!(f1.children.len(), 1);
    let f2 = f1.child("foo2").unwrap();
    assert_eq!(f2.count, 3);
    assert_eq!(f2.children.len(), 1);
    assert_eq!(f2.child("foo3").unwrap().count, 3);
}

#[test]
fn same_name_at_different_positions_stays_distinct() {
    let mut p = CallProfiler::new();
    foo1(&mut p);
    foo2(&mut p);

    let root = p.result();
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].name, "foo1");
    assert_eq!(root.children[1].name, "foo2");
    // the top-level foo2 did not merge with foo1's child
    assert_eq!(root.children[1].count, 1);
    assert_eq!(root.children[0].child("foo2").unwrap().count, 1);
    assert!(root.children[1].total_time >= 0.012);
}

#[test]
fn unbalanced_end_reports_the_error() {
    let mut p = CallProfiler::new();
    assert_eq!(p.end_span(), Err(ProfileError::UnterminatedSpan));

    p.begin_span("only");
    p.end_span().unwrap();
    assert_eq!(p.end_span(), Err(ProfileError::UnterminatedSpan));
}

#[test]
fn reset_produces_an_empty_tree() {
    let mut p = CallProfiler::new();
    foo1(&mut p);
    p.begin_span("dangling");
    p.reset();

    let root = p.result();
    assert!(root.children.is_empty());
    assert_eq!(p.end_span(), Err(ProfileError::UnterminatedSpan));
}

#[test]
fn report_round_trips_with_stable_field_names() {
    let mut p = CallProfiler::new();
    foo1(&mut p);
    let report = p.result();

    let v = serde_json::to_value(&report).unwrap();
    assert!(v.get("name").is_some());
    assert!(v.get("total_time").is_some());
    assert!(v.get("count").is_some());
    let kids = v.get("children").unwrap().as_array().unwrap();
    assert_eq!(kids[0]["name"], "foo1");
    assert!(kids[0]["total_time"].as_f64().unwrap() >= 0.015);
    assert_eq!(kids[0]["count"], 1);

    let back: SpanReport = serde_json::from_value(v).unwrap();
    assert_eq!(back, report);
}

// A single test touches the process-wide profiler so parallel test threads
// cannot interleave spans into its tree.
#[test]
fn global_profiler_and_engine_spans() {
    profile::reset();
    {
        let _span = profile::scope("workload");
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let contiguous = StridedView::new(&data, &[100], &[1], 0).unwrap();
        let stepped = StridedView::new(&data, &[50], &[2], 0).unwrap();
        assert_eq!(contiguous.mean(), 49.5);
        assert_eq!(stepped.mean(), 49.0);
    }

    let report = profile::result();
    let w = report.child("workload").unwrap();
    assert_eq!(w.count, 1);

    #[cfg(feature = "call-profiler")]
    {
        let m = w.child("mean").unwrap();
        assert_eq!(m.count, 2);
        let s = m.child("sum").unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.child("sum_flat").unwrap().count, 1);
        assert_eq!(s.child("sum_generic").unwrap().count, 1);
        assert!(m.total_time >= s.total_time);
    }

    // reset under a live guard: the guard's drop stays quiet
    {
        let _span = profile::scope("will_vanish");
        profile::reset();
    }
    assert!(profile::result().children.is_empty());

    // the explicit surface still balances after all of the above
    profile::begin_span("tail");
    profile::end_span().unwrap();
    assert_eq!(profile::result().children[0].name, "tail");
    profile::reset();
}
