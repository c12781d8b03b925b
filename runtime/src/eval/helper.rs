use uniquery_ast::{VectorMatchCardinality, VectorMatching};
use uniquery_common::hash::{FastHashMap, FastHashSet, Signature};
use uniquery_common::label::{Labels, LabelsBuilder, METRIC_NAME_LABEL};

use crate::types::Vector;

/// Per-series data computed once before aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalSeriesHelper {
    /// Hash of the labels the series is grouped by.
    pub grouping_key: u64,
}

/// Scratch state for evaluating one node at one step.
///
/// A helper is owned by exactly one evaluation step. Its caches assume that
/// every call made between two [`reset`](EvalNodeHelper::reset)s belongs to the
/// same expression node.
#[derive(Debug, Default)]
pub struct EvalNodeHelper {
    /// Evaluation timestamp in milliseconds.
    pub ts: i64,
    /// Output buffer.
    pub out: Vector,

    sig_on: bool,
    sig_names: Vec<String>,
    sig_cache: FastHashMap<Signature, Signature>,
    pub(crate) right_sigs: FastHashMap<Signature, usize>,
    pub(crate) matched_sigs: FastHashSet<Signature>,
    result_metric: FastHashMap<Signature, Labels>,
    pub(crate) lb: LabelsBuilder,
    /// Rewritten label sets keyed by the input label-set hash.
    pub(crate) dmn: FastHashMap<u64, Labels>,
}

impl EvalNodeHelper {
    pub fn new(ts: i64) -> Self {
        Self {
            ts,
            ..Default::default()
        }
    }

    /// Clears every cache and buffer while keeping their allocations.
    pub fn reset(&mut self, ts: i64) {
        self.ts = ts;
        self.out.clear();
        self.sig_on = false;
        self.sig_names.clear();
        self.sig_cache.clear();
        self.right_sigs.clear();
        self.matched_sigs.clear();
        self.result_metric.clear();
        self.dmn.clear();
    }

    pub(crate) fn take_output(&mut self) -> Vector {
        std::mem::take(&mut self.out)
    }

    /// Match key of `labels`: only `names` when `on`, otherwise everything
    /// except `names` and the metric name.
    pub fn signature(&mut self, on: bool, names: &[String], labels: &Labels) -> Signature {
        if self.sig_on != on || self.sig_names != names {
            self.sig_on = on;
            self.sig_names.clear();
            self.sig_names.extend_from_slice(names);
            self.sig_cache.clear();
        }
        let key = labels.signature();
        if let Some(sig) = self.sig_cache.get(&key) {
            return *sig;
        }
        let sig = if on {
            labels.hash_for_labels(names)
        } else {
            labels.hash_without_labels(names)
        };
        self.sig_cache.insert(key, sig);
        sig
    }

    /// Label set of a one-to-one match result built from the left side.
    pub(crate) fn result_metric(
        &mut self,
        lhs: &Labels,
        rhs: &Labels,
        matching: &VectorMatching,
        drop_metric_name: bool,
    ) -> Labels {
        let key = Signature::from_pair(
            Signature::from_pair(lhs.signature(), rhs.signature()),
            Signature::from(drop_metric_name as u64),
        );
        if let Some(labels) = self.result_metric.get(&key) {
            return labels.clone();
        }

        self.lb.reset(lhs);
        if drop_metric_name {
            self.lb.del(&[METRIC_NAME_LABEL]);
        }
        if matching.card == VectorMatchCardinality::OneToOne {
            if matching.on {
                self.lb.keep(&matching.matching_labels);
            } else {
                self.lb.del(&matching.matching_labels);
            }
        }
        let labels = self.lb.labels();
        self.result_metric.insert(key, labels.clone());
        labels
    }
}
