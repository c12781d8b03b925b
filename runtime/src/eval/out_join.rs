use std::borrow::Cow;

use tracing::trace;
use uniquery_ast::{Operator, VectorMatching};
use uniquery_common::label::{Labels, LabelsBuilder, TSID_LABEL};

use crate::eval::binop::vector_elem_binop;
use crate::eval::vector_matching::labels_match;
use crate::types::{ContainsSameLabelset, Sample, Vector};
use crate::{RuntimeError, RuntimeResult};

/// Copies the labels of `metric` named in `matching` or `include` into `lb`.
fn add_joined_labels(lb: &mut LabelsBuilder, metric: &Labels, matching: &[String], include: &[String]) {
    for name in matching.iter().chain(include.iter()) {
        if let Some(value) = metric.get(name) {
            lb.set(name.as_str(), value);
        }
    }
}

/// The matching labels for `metric`. A series identified only by its id is
/// matched by that id.
fn matching_labels_for<'a>(metric: &Labels, matching: &'a [String]) -> Cow<'a, [String]> {
    match metric.as_slice() {
        [only] if only.name == TSID_LABEL => Cow::Owned(vec![TSID_LABEL.to_string()]),
        _ => Cow::Borrowed(matching),
    }
}

fn joined_sample(op: Operator, t: i64, lv: f64, rv: f64, metric: Labels) -> RuntimeResult<Sample> {
    let (value, _) = vector_elem_binop(op, lv, rv)?;
    Ok(Sample::new(metric, t, value))
}

/// Full outer join of two vectors keyed by the matching labels.
///
/// Matched rows carry the matching labels plus `include_left` from the left
/// row and `include_right` from the right row. Unmatched rows take part in the
/// operation with `0` standing in for the missing side.
pub(crate) fn out_join(
    op: Operator,
    lhs: &[Sample],
    rhs: &[Sample],
    matching: &VectorMatching,
) -> RuntimeResult<Vector> {
    let mut right_matched = vec![false; rhs.len()];
    let mut out: Vector = Vec::with_capacity(lhs.len().max(rhs.len()));
    let mut lb = LabelsBuilder::default();
    let mut matched: Vec<usize> = Vec::new();

    for left in lhs {
        let matching_labels = matching_labels_for(&left.metric, &matching.matching_labels);

        matched.clear();
        for (i, right) in rhs.iter().enumerate() {
            if labels_match(&left.metric, &right.metric, &matching_labels) {
                matched.push(i);
                right_matched[i] = true;
            }
        }

        if matched.len() > 1 && matching.include_left.is_empty() && matching.include_right.is_empty() {
            // only the matching labels would remain, so the rows collide
            return Err(RuntimeError::AmbiguousOutJoin);
        }

        lb.reset(&Labels::new());
        add_joined_labels(&mut lb, &left.metric, &matching_labels, &matching.include_left);

        if matched.is_empty() {
            out.push(joined_sample(op, left.t, left.v, 0.0, lb.labels())?);
            continue;
        }

        let left_labels = lb.labels();
        for &ri in matched.iter() {
            let right = &rhs[ri];
            lb.reset(&left_labels);
            add_joined_labels(&mut lb, &right.metric, &[], &matching.include_right);
            out.push(joined_sample(op, left.t, left.v, right.v, lb.labels())?);
        }
    }

    for (right, _) in rhs
        .iter()
        .zip(right_matched.iter())
        .filter(|(_, matched)| !**matched)
    {
        let matching_labels = matching_labels_for(&right.metric, &matching.matching_labels);
        lb.reset(&Labels::new());
        add_joined_labels(&mut lb, &right.metric, &matching_labels, &matching.include_right);
        out.push(joined_sample(op, right.t, 0.0, right.v, lb.labels())?);
    }

    trace!(
        left = lhs.len(),
        right = rhs.len(),
        series = out.len(),
        "out join assembled"
    );

    if out.contains_same_labelset() {
        return Err(RuntimeError::DuplicateResultLabelset);
    }
    Ok(out)
}
