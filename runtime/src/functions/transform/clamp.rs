use uniquery_ast::Expr;

use crate::eval::{check_distinct_labelsets, EvalNodeHelper};
use crate::functions::arg_parse::{get_number_arg, get_vector_arg};
use crate::functions::transform::drop_metric_name;
use crate::functions::FunctionCall;
use crate::types::{QueryValue, Sample, Vector};
use crate::RuntimeResult;

/// A bound is either a literal in the call or an evaluated scalar argument.
fn get_bound(func: &str, values: &[QueryValue], args: &[Expr], arg_num: usize) -> RuntimeResult<f64> {
    match values.get(arg_num) {
        Some(QueryValue::Scalar(s)) => Ok(s.v),
        _ => get_number_arg(func, args, arg_num),
    }
}

fn clamp_values(
    func: &str,
    values: &[QueryValue],
    enh: &mut EvalNodeHelper,
    f: impl Fn(f64) -> f64,
) -> RuntimeResult<Vector> {
    let vector = get_vector_arg(func, values, 0)?;
    let ts = enh.ts;
    let mut out = Vec::with_capacity(vector.len());
    for el in vector {
        let metric = drop_metric_name(enh, &el.metric);
        out.push(Sample::new(metric, ts, f(el.v)));
    }
    check_distinct_labelsets(func, &out)?;
    Ok(out)
}

/// `clamp(v, min, max)`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Clamp;

impl FunctionCall for Clamp {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(&self, values: &[QueryValue], args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        let min = get_bound("clamp", values, args, 1)?;
        let max = get_bound("clamp", values, args, 2)?;
        if min.is_nan() || max.is_nan() {
            return clamp_values("clamp", values, enh, |_| min);
        }
        if min > max {
            return Ok(Vec::new());
        }
        clamp_values("clamp", values, enh, |v| {
            if v.is_nan() {
                v
            } else {
                v.max(min).min(max)
            }
        })
    }
}

/// `clamp_max(v, max)`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ClampMax;

impl FunctionCall for ClampMax {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(&self, values: &[QueryValue], args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        let max = get_bound("clamp_max", values, args, 1)?;
        if max.is_nan() {
            return clamp_values("clamp_max", values, enh, |_| max);
        }
        clamp_values("clamp_max", values, enh, |v| if v.is_nan() { v } else { v.min(max) })
    }
}

/// `clamp_min(v, min)`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ClampMin;

impl FunctionCall for ClampMin {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(&self, values: &[QueryValue], args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        let min = get_bound("clamp_min", values, args, 1)?;
        if min.is_nan() {
            return clamp_values("clamp_min", values, enh, |_| min);
        }
        clamp_values("clamp_min", values, enh, |v| if v.is_nan() { v } else { v.max(min) })
    }
}
