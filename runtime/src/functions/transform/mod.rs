use uniquery_common::label::{Labels, METRIC_NAME_LABEL};

use crate::eval::EvalNodeHelper;

pub(crate) use clamp::*;
pub(crate) use greatest::*;
pub(crate) use labels::*;
pub(crate) use math::*;
pub(crate) use rank::*;
pub(crate) use sort::*;

mod clamp;
mod greatest;
mod labels;
mod math;
mod rank;
mod sort;


/// `metric` without its `__name__` label.
pub(crate) fn drop_metric_name(enh: &mut EvalNodeHelper, metric: &Labels) -> Labels {
    if !metric.has(METRIC_NAME_LABEL) {
        return metric.clone();
    }
    enh.lb.reset(metric);
    enh.lb.del(&[METRIC_NAME_LABEL]);
    enh.lb.labels()
}
