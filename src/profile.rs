//! Call-path timing profiler.
//!
//! Spans aggregate into a tree keyed by call path: `begin_span("f")` while
//! `"g"` is active lands on the node for path `g/f`, and repeating the same
//! path accumulates into that node instead of growing siblings. The same name
//! at different positions stays distinct. Timing uses monotonic [`Instant`]s;
//! counts tick at `end_span`, so a span abandoned by
//! [`CallProfiler::reset`] leaves no trace.
//!
//! The crate keeps one process-wide profiler behind the module functions
//! ([`reset`], [`begin_span`], [`end_span`], [`result`], [`scope`]). The
//! reduction engine reports into it when the `call-profiler` feature is on.
//! Aggregation is meaningful for single-threaded use: the global instance is
//! lock-protected, but call paths from interleaved threads merge into one
//! tree.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Profiler misuse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// `end_span` was called with no span in progress.
    #[error("no span in progress to end")]
    UnterminatedSpan,
}

#[derive(Debug)]
struct SpanNode {
    name: String,
    total: Duration,
    count: u64,
    /// Arena indices of children, in first-seen order.
    children: Vec<usize>,
}

impl SpanNode {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            total: Duration::ZERO,
            count: 0,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Frame {
    node: usize,
    started: Instant,
}

/// Aggregating span timer.
///
/// See the module docs for the path-keyed model. Methods are cheap; the tree
/// only grows the first time a call path appears. `nodes[0]` is the synthetic
/// root every top-level span hangs off.
#[derive(Debug)]
pub struct CallProfiler {
    nodes: Vec<SpanNode>,
    stack: Vec<Frame>,
}

impl CallProfiler {
    pub fn new() -> Self {
        Self {
            nodes: vec![SpanNode::named("")],
            stack: Vec::new(),
        }
    }

    /// Drop every recorded span and abandon any in progress.
    pub fn reset(&mut self) {
        debug!(
            "profiler reset: dropping {} nodes and {} active spans",
            self.nodes.len() - 1,
            self.stack.len()
        );
        self.nodes.clear();
        self.nodes.push(SpanNode::named(""));
        self.stack.clear();
    }

    /// Open a span named `name` under the innermost active span.
    pub fn begin_span(&mut self, name: &str) {
        let parent = self.stack.last().map_or(0, |f| f.node);
        let node = self.child_named(parent, name);
        self.stack.push(Frame {
            node,
            started: Instant::now(),
        });
    }

    /// Close the innermost active span, charging its elapsed wall time and
    /// ticking its count.
    pub fn end_span(&mut self) -> Result<(), ProfileError> {
        let frame = self.stack.pop().ok_or(ProfileError::UnterminatedSpan)?;
        let node = &mut self.nodes[frame.node];
        node.total += frame.started.elapsed();
        node.count += 1;
        Ok(())
    }

    /// Depth of the active span stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Snapshot the aggregated tree.
    ///
    /// The root is synthetic (empty name, zero time and count); top-level
    /// spans are its children in first-seen order. Spans still in progress
    /// contribute nothing until their `end_span`.
    pub fn result(&self) -> SpanReport {
        self.report_of(0)
    }

    fn report_of(&self, node: usize) -> SpanReport {
        let n = &self.nodes[node];
        SpanReport {
            name: n.name.clone(),
            total_time: n.total.as_secs_f64(),
            count: n.count,
            children: n.children.iter().map(|&c| self.report_of(c)).collect(),
        }
    }

    fn child_named(&mut self, parent: usize, name: &str) -> usize {
        let found = self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].name == name);
        match found {
            Some(c) => c,
            None => {
                let c = self.nodes.len();
                self.nodes.push(SpanNode::named(name));
                self.nodes[parent].children.push(c);
                c
            }
        }
    }
}

impl Default for CallProfiler {
    fn default() -> Self {
        Self::new()
    }
}

/// One node of a profiling snapshot.
///
/// The field names are a stable interchange contract: `name`, `total_time`
/// (seconds), `count`, `children`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanReport {
    pub name: String,
    pub total_time: f64,
    pub count: u64,
    pub children: Vec<SpanReport>,
}

impl SpanReport {
    /// Child with the given name, if that path was recorded.
    pub fn child(&self, name: &str) -> Option<&SpanReport> {
        self.children.iter().find(|c| c.name == name)
    }
}

static GLOBAL: Lazy<Mutex<CallProfiler>> = Lazy::new(|| Mutex::new(CallProfiler::new()));

fn with_global<R>(f: impl FnOnce(&mut CallProfiler) -> R) -> R {
    let mut profiler = GLOBAL.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut profiler)
}

/// Clear the process-wide profiler.
pub fn reset() {
    with_global(CallProfiler::reset);
}

/// Open a span on the process-wide profiler.
pub fn begin_span(name: &str) {
    with_global(|p| p.begin_span(name));
}

/// Close the innermost span on the process-wide profiler.
pub fn end_span() -> Result<(), ProfileError> {
    with_global(CallProfiler::end_span)
}

/// Snapshot the process-wide profiler.
pub fn result() -> SpanReport {
    with_global(|p| p.result())
}

/// RAII span on the process-wide profiler: opens now, closes on drop, so
/// every exit path of the guarded scope ends the span. The drop swallows the
/// unbalanced-stack error a [`reset`] under a live guard would cause.
#[must_use]
pub fn scope(name: &str) -> ScopedSpan {
    begin_span(name);
    ScopedSpan { _priv: () }
}

pub struct ScopedSpan {
    _priv: (),
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        let _ = end_span();
    }
}
