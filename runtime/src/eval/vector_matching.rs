use tracing::{debug, field, trace, trace_span};
use uniquery_ast::{Operator, VectorMatchCardinality, VectorMatching};
use uniquery_common::hash::FastHashSet;
use uniquery_common::label::{Labels, TSID_LABEL};

use crate::eval::binop::{check_distinct_labelsets, should_drop_metric_name, vector_elem_binop};
use crate::eval::out_join::out_join;
use crate::eval::EvalNodeHelper;
use crate::types::{Sample, Vector};
use crate::{RuntimeError, RuntimeResult};

/// Evaluates a binary operation between two vectors, excluding set operators.
pub fn vector_binop(
    op: Operator,
    lhs: &[Sample],
    rhs: &[Sample],
    matching: &VectorMatching,
    return_bool: bool,
    enh: &mut EvalNodeHelper,
) -> RuntimeResult<Vector> {
    use VectorMatchCardinality::*;

    let span = trace_span!(
        "vector binop",
        op = op.as_str(),
        card = %matching.card,
        series = field::Empty
    )
    .entered();

    let result = match matching.card {
        ManyToMany => Err(RuntimeError::UnsupportedCardinality(
            "many-to-many only allowed for set operators".to_string(),
        )),
        ManyToOne | OneToMany => Err(RuntimeError::UnsupportedCardinality(
            "many-to-one or one-to-many operators is not supported".to_string(),
        )),
        LeftJoin => left_join(op, lhs, rhs, matching, enh),
        OutJoin => out_join(op, lhs, rhs, matching),
        OneToOne => one_to_one(op, lhs, rhs, matching, return_bool, enh),
    };

    match &result {
        Ok(vector) => {
            span.record("series", vector.len());
        }
        Err(err) => debug!(op = op.as_str(), card = %matching.card, "vector binop failed: {err}"),
    }
    result
}

fn one_to_one(
    op: Operator,
    lhs: &[Sample],
    rhs: &[Sample],
    matching: &VectorMatching,
    return_bool: bool,
    enh: &mut EvalNodeHelper,
) -> RuntimeResult<Vector> {
    let on = matching.on;
    let names = &matching.matching_labels;

    // All samples from the rhs keyed by the matching label/values.
    enh.right_sigs.clear();
    for (i, rs) in rhs.iter().enumerate() {
        let sig = enh.signature(on, names, &rs.metric);
        // The rhs is the 'one' side. Two samples with the same signature means
        // the matching is many-to-many.
        if enh.right_sigs.insert(sig, i).is_some() {
            return Err(RuntimeError::DuplicateMatchGroup);
        }
    }

    enh.matched_sigs.clear();
    let drop_name = should_drop_metric_name(op, return_bool);
    for ls in lhs {
        let sig = enh.signature(on, names, &ls.metric);
        if !enh.matched_sigs.insert(sig) {
            return Err(RuntimeError::AmbiguousMatch);
        }

        let Some(&ri) = enh.right_sigs.get(&sig) else {
            continue;
        };
        let rs = &rhs[ri];

        let (mut value, mut keep) = vector_elem_binop(op, ls.v, rs.v)?;
        if return_bool {
            value = if keep { 1.0 } else { 0.0 };
            keep = true;
        }
        if !keep {
            continue;
        }

        let metric = enh.result_metric(&ls.metric, &rs.metric, matching, drop_name);
        enh.out.push(Sample::new(metric, ls.t, value));
    }

    let out = enh.take_output();
    if drop_name {
        check_distinct_labelsets("vector binop", &out)?;
    }
    Ok(out)
}

/// Reports whether `left` and `right` agree on the matching labels. Only the
/// matching labels present on the left constrain the match. When both sides
/// carry a series id, it alone decides.
pub(crate) fn labels_match(left: &Labels, right: &Labels, matching_labels: &[String]) -> bool {
    if matching_labels.is_empty() {
        return false;
    }
    if left.is_empty() && right.is_empty() {
        return true;
    }
    if let (Some(l), Some(r)) = (left.get(TSID_LABEL), right.get(TSID_LABEL)) {
        return l == r;
    }

    let mut constrained = false;
    for name in matching_labels {
        if let Some(lv) = left.get(name) {
            constrained = true;
            if right.get(name) != Some(lv) {
                return false;
            }
        }
    }
    constrained
}

fn left_join(
    op: Operator,
    lhs: &[Sample],
    rhs: &[Sample],
    matching: &VectorMatching,
    enh: &mut EvalNodeHelper,
) -> RuntimeResult<Vector> {
    if rhs.is_empty() {
        return Ok(lhs.to_vec());
    }

    let mut out = Vec::with_capacity(lhs.len());
    let mut matched: Vec<&Sample> = Vec::new();
    for left in lhs {
        matched.clear();
        matched.extend(
            rhs.iter()
                .filter(|right| labels_match(&left.metric, &right.metric, &matching.matching_labels)),
        );

        if matched.is_empty() {
            out.push(left.clone());
            continue;
        }

        if matched.len() > 1 {
            trace!(
                left = %left.metric,
                matches = matched.len(),
                "left join expands one-to-many"
            );
            if matching.include.is_empty() {
                return Err(RuntimeError::AmbiguousOneToMany);
            }
            let mut seen = FastHashSet::with_capacity(matched.len());
            for right in matched.iter() {
                let key: Vec<&str> = matching
                    .include
                    .iter()
                    .map(|name| right.metric.get_or_empty(name))
                    .collect();
                if !seen.insert(key) {
                    return Err(RuntimeError::DuplicateResultLabelset);
                }
            }
        }

        for right in matched.iter() {
            let (value, _) = vector_elem_binop(op, left.v, right.v)?;
            enh.lb.reset(&left.metric);
            for name in matching.include.iter() {
                if let Some(v) = right.metric.get(name) {
                    enh.lb.set(name.as_str(), v);
                }
            }
            out.push(Sample::new(enh.lb.labels(), left.t, value));
        }
    }

    Ok(out)
}
