use tracing::{debug, field, trace_span};
use uniquery_ast::Operator;
use uniquery_common::label::METRIC_NAME_LABEL;

use crate::eval::EvalNodeHelper;
use crate::types::{ContainsSameLabelset, Matrix, Sample, Scalar, Vector};
use crate::{RuntimeError, RuntimeResult};

#[inline]
fn btos(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Evaluates a binary operation between two scalars. Comparisons yield 1 or 0.
pub fn scalar_binop(op: Operator, lhs: f64, rhs: f64) -> RuntimeResult<f64> {
    use Operator::*;
    let value = match op {
        Add => lhs + rhs,
        Sub => lhs - rhs,
        Mul => lhs * rhs,
        Div => lhs / rhs,
        Pow => lhs.powf(rhs),
        Mod => lhs % rhs,
        Eql => btos(lhs == rhs),
        NotEq => btos(lhs != rhs),
        Gt => btos(lhs > rhs),
        Lt => btos(lhs < rhs),
        Gte => btos(lhs >= rhs),
        Lte => btos(lhs <= rhs),
        _ => {
            return Err(RuntimeError::UnsupportedOperator(
                op.as_str().to_string(),
                "Scalar operations",
            ))
        }
    };
    Ok(value)
}

/// Evaluates a binary operation between two vector elements. Returns the
/// value and whether the element is kept. Comparisons return the left operand.
pub fn vector_elem_binop(op: Operator, lhs: f64, rhs: f64) -> RuntimeResult<(f64, bool)> {
    use Operator::*;
    let res = match op {
        Add => (lhs + rhs, true),
        Sub => (lhs - rhs, true),
        Mul => (lhs * rhs, true),
        Div => (lhs / rhs, true),
        Pow => (lhs.powf(rhs), true),
        Mod => (lhs % rhs, true),
        Eql => (lhs, lhs == rhs),
        NotEq => (lhs, lhs != rhs),
        Gt => (lhs, lhs > rhs),
        Lt => (lhs, lhs < rhs),
        Gte => (lhs, lhs >= rhs),
        Lte => (lhs, lhs <= rhs),
        _ => {
            return Err(RuntimeError::UnsupportedOperator(
                op.as_str().to_string(),
                "operations between Vectors",
            ))
        }
    };
    Ok(res)
}

/// Whether results of `op` lose the metric name of their operands.
#[inline]
pub(crate) fn should_drop_metric_name(op: Operator, return_bool: bool) -> bool {
    op.is_arithmetic() || return_bool
}

/// Fails when dropping `__name__` left two elements with the same label set.
pub(crate) fn check_distinct_labelsets<T>(what: &str, elems: &[T]) -> RuntimeResult<()>
where
    [T]: ContainsSameLabelset,
{
    if elems.contains_same_labelset() {
        debug!(what, "result contains duplicate label sets");
        return Err(RuntimeError::DuplicateResultLabelset);
    }
    Ok(())
}

/// Evaluates a binary operation between a vector and a scalar. `swap` is set
/// when the scalar was written on the left-hand side.
pub fn vector_scalar_binop(
    op: Operator,
    lhs: &[Sample],
    rhs: Scalar,
    swap: bool,
    return_bool: bool,
    enh: &mut EvalNodeHelper,
) -> RuntimeResult<Vector> {
    let span = trace_span!(
        "vector scalar binop",
        op = op.as_str(),
        swap,
        series = field::Empty
    )
    .entered();

    let drop_name = should_drop_metric_name(op, return_bool);
    enh.out.reserve(lhs.len());
    for sample in lhs {
        let (lv, rv) = if swap {
            (rhs.v, sample.v)
        } else {
            (sample.v, rhs.v)
        };
        let (mut value, mut keep) = vector_elem_binop(op, lv, rv)?;
        // The vector element value is the result of a comparison even when the
        // scalar is on the left.
        if op.is_comparison() && swap {
            value = rv;
        }
        if return_bool {
            value = btos(keep);
            keep = true;
        }
        if keep {
            let mut out = sample.clone();
            out.v = value;
            if drop_name {
                enh.lb.reset(&out.metric);
                enh.lb.del(&[METRIC_NAME_LABEL]);
                out.metric = enh.lb.labels();
            }
            enh.out.push(out);
        }
    }

    span.record("series", enh.out.len());
    let out = enh.take_output();
    if drop_name {
        check_distinct_labelsets("vector scalar binop", &out)?;
    }
    Ok(out)
}

/// Unary minus over a vector.
pub fn negate_vector(vector: Vector, enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
    let out: Vector = vector
        .into_iter()
        .map(|mut sample| {
            sample.v = -sample.v;
            if sample.metric.has(METRIC_NAME_LABEL) {
                enh.lb.reset(&sample.metric);
                enh.lb.del(&[METRIC_NAME_LABEL]);
                sample.metric = enh.lb.labels();
            }
            sample
        })
        .collect();
    check_distinct_labelsets("unary minus", &out)?;
    Ok(out)
}

/// Unary minus over a matrix.
pub fn negate_matrix(matrix: Matrix, enh: &mut EvalNodeHelper) -> RuntimeResult<Matrix> {
    let out: Matrix = matrix
        .into_iter()
        .map(|mut series| {
            for p in series.points.iter_mut() {
                p.v = -p.v;
            }
            if series.metric.has(METRIC_NAME_LABEL) {
                enh.lb.reset(&series.metric);
                enh.lb.del(&[METRIC_NAME_LABEL]);
                series.metric = enh.lb.labels();
            }
            series
        })
        .collect();
    check_distinct_labelsets("unary minus", &out)?;
    Ok(out)
}
