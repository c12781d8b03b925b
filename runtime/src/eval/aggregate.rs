use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::marker::PhantomData;

use tracing::{field, trace_span};
use uniquery_ast::AggregateOp;
use uniquery_common::hash::FastHashMap;
use uniquery_common::label::{Labels, METRIC_NAME_LABEL};

use crate::eval::{EvalNodeHelper, EvalSeriesHelper};
use crate::types::{Sample, Vector};
use crate::utils::{float_cmp_desc_nan_last, float_cmp_nan_last};
use crate::{RuntimeError, RuntimeResult};

/// Computes the grouping key of `metric` for an aggregation `by (grouping)` or
/// `without (grouping)`.
pub fn generate_grouping_key(metric: &Labels, grouping: &[String], without: bool) -> u64 {
    if without {
        return *metric.hash_without_labels(grouping);
    }
    if grouping.is_empty() {
        // No grouping labels: every series lands in the same group.
        return 0;
    }
    *metric.hash_for_labels(grouping)
}

/// Decides which heap element sits on top.
trait HeapOrder {
    fn cmp(a: f64, b: f64) -> Ordering;
}

/// Smallest value on top, NaN above everything. Used by `topk`.
struct SmallestFirst;

/// Largest value on top, NaN above everything. Used by `bottomk`.
struct LargestFirst;

impl HeapOrder for SmallestFirst {
    fn cmp(a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        }
    }
}

impl HeapOrder for LargestFirst {
    fn cmp(a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }
}

struct Ranked<O> {
    sample: Sample,
    _order: PhantomData<O>,
}

impl<O> Ranked<O> {
    fn new(sample: Sample) -> Self {
        Self {
            sample,
            _order: PhantomData,
        }
    }
}

impl<O: HeapOrder> PartialEq for Ranked<O> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<O: HeapOrder> Eq for Ranked<O> {}

impl<O: HeapOrder> PartialOrd for Ranked<O> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<O: HeapOrder> Ord for Ranked<O> {
    fn cmp(&self, other: &Self) -> Ordering {
        O::cmp(self.sample.v, other.sample.v)
    }
}

/// A heap holding at most `k` samples.
struct BoundedHeap<O: HeapOrder> {
    heap: BinaryHeap<Ranked<O>>,
    k: usize,
}

impl<O: HeapOrder> BoundedHeap<O> {
    fn new(k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(k),
            k,
        }
    }

    fn peek_value(&self) -> Option<f64> {
        self.heap.peek().map(|r| r.sample.v)
    }

    /// Pushes `sample` when there is room or when it outranks the top element.
    /// `outranks(top, v)` is only consulted once the heap is full.
    fn offer(&mut self, sample: &Sample, outranks: impl Fn(f64, f64) -> bool) {
        if self.heap.len() < self.k {
            self.heap.push(Ranked::new(sample.clone()));
            return;
        }
        let Some(top) = self.peek_value() else {
            return;
        };
        if outranks(top, sample.v) || top.is_nan() {
            self.heap.pop();
            self.heap.push(Ranked::new(sample.clone()));
        }
    }

    fn into_samples(self) -> Vec<Sample> {
        self.heap.into_iter().map(|r| r.sample).collect()
    }
}

enum GroupState {
    Plain,
    TopK(BoundedHeap<SmallestFirst>),
    BottomK(BoundedHeap<LargestFirst>),
}

struct GroupedAggregation {
    labels: Labels,
    value: f64,
    mean: f64,
    group_count: usize,
    state: GroupState,
}

fn is_supported(op: AggregateOp) -> bool {
    use AggregateOp::*;
    matches!(op, Sum | Avg | Count | Min | Max | TopK | BottomK)
}

/// Largest float below 2^63 that converts to `i64` without overflow.
const MAX_I64_FLOAT: f64 = 9_223_372_036_854_774_784.0;
const MIN_I64_FLOAT: f64 = -9_223_372_036_854_775_808.0;

fn convertible_to_i64(v: f64) -> bool {
    (MIN_I64_FLOAT..=MAX_I64_FLOAT).contains(&v)
}

/// Aggregates `vector` into one sample per group (one per kept sample for
/// `topk`/`bottomk`). `series_helper[i].grouping_key` must be the key of
/// `vector[i]` as produced by [`generate_grouping_key`].
///
/// Groups are emitted in the order they are first seen.
pub fn aggregation(
    op: AggregateOp,
    grouping: &[String],
    without: bool,
    param: Option<f64>,
    vector: &[Sample],
    series_helper: &[EvalSeriesHelper],
    enh: &mut EvalNodeHelper,
) -> RuntimeResult<Vector> {
    if !is_supported(op) {
        return Err(RuntimeError::UnsupportedAggregation(op.as_str().to_string()));
    }
    if series_helper.len() != vector.len() {
        return Err(RuntimeError::ArgumentError(format!(
            "aggregation needs one grouping key per sample; got {} keys for {} samples",
            series_helper.len(),
            vector.len()
        )));
    }

    let span = trace_span!(
        "aggregation",
        op = op.as_str(),
        without,
        groups = field::Empty
    )
    .entered();

    let mut k: usize = 0;
    if matches!(op, AggregateOp::TopK | AggregateOp::BottomK) {
        let f = param.ok_or_else(|| {
            RuntimeError::ArgumentError(format!("{} requires a numeric parameter", op.as_str()))
        })?;
        if !convertible_to_i64(f) {
            return Err(RuntimeError::Int64Overflow(f));
        }
        let n = f as i64;
        if n < 1 {
            return Ok(Vec::new());
        }
        // a group never holds more samples than the input has
        k = (n as u64).min(vector.len() as u64) as usize;
    }

    let mut index: FastHashMap<u64, usize> = FastHashMap::default();
    let mut groups: Vec<GroupedAggregation> = Vec::new();

    for (s, helper) in vector.iter().zip(series_helper.iter()) {
        let Some(&gi) = index.get(&helper.grouping_key) else {
            enh.lb.reset(&s.metric);
            if without {
                enh.lb.del(grouping);
                enh.lb.del(&[METRIC_NAME_LABEL]);
            } else {
                enh.lb.keep(grouping);
            }
            let state = match op {
                AggregateOp::TopK => {
                    let mut heap = BoundedHeap::new(k);
                    heap.offer(s, |_, _| false);
                    GroupState::TopK(heap)
                }
                AggregateOp::BottomK => {
                    let mut heap = BoundedHeap::new(k);
                    heap.offer(s, |_, _| false);
                    GroupState::BottomK(heap)
                }
                _ => GroupState::Plain,
            };
            index.insert(helper.grouping_key, groups.len());
            groups.push(GroupedAggregation {
                labels: enh.lb.labels(),
                value: s.v,
                mean: s.v,
                group_count: 1,
                state,
            });
            continue;
        };

        let group = &mut groups[gi];
        match op {
            AggregateOp::Sum => group.value += s.v,
            AggregateOp::Avg => {
                group.group_count += 1;
                if group.mean.is_infinite() {
                    if s.v.is_infinite() && (group.mean > 0.0) == (s.v > 0.0) {
                        // Same-signed infinities: the mean is already correct
                        // and subtracting them would yield NaN.
                        continue;
                    }
                    if !s.v.is_infinite() && !s.v.is_nan() {
                        continue;
                    }
                }
                let n = group.group_count as f64;
                // Divide each side of the `-` by the count to avoid overflow.
                group.mean += s.v / n - group.mean / n;
            }
            AggregateOp::Count => group.group_count += 1,
            AggregateOp::Max => {
                if group.value < s.v || group.value.is_nan() {
                    group.value = s.v;
                }
            }
            AggregateOp::Min => {
                if group.value > s.v || group.value.is_nan() {
                    group.value = s.v;
                }
            }
            AggregateOp::TopK => {
                if let GroupState::TopK(heap) = &mut group.state {
                    heap.offer(s, |top, v| top < v);
                }
            }
            AggregateOp::BottomK => {
                if let GroupState::BottomK(heap) = &mut group.state {
                    heap.offer(s, |top, v| top > v);
                }
            }
            _ => return Err(RuntimeError::UnsupportedAggregation(op.as_str().to_string())),
        }
    }

    span.record("groups", groups.len());

    let ts = enh.ts;
    for group in groups {
        match group.state {
            GroupState::TopK(heap) => {
                let mut samples = heap.into_samples();
                samples.sort_by(|a, b| float_cmp_desc_nan_last(a.v, b.v));
                enh.out.extend(samples.into_iter().map(|s| Sample::new(s.metric, ts, s.v)));
            }
            GroupState::BottomK(heap) => {
                let mut samples = heap.into_samples();
                samples.sort_by(|a, b| float_cmp_nan_last(a.v, b.v));
                enh.out.extend(samples.into_iter().map(|s| Sample::new(s.metric, ts, s.v)));
            }
            GroupState::Plain => {
                let value = match op {
                    AggregateOp::Avg => group.mean,
                    AggregateOp::Count => group.group_count as f64,
                    _ => group.value,
                };
                enh.out.push(Sample::new(group.labels, ts, value));
            }
        }
    }

    Ok(enh.take_output())
}
