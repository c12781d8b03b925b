use tracing::debug;
use uniquery_ast::Expr;
use uniquery_common::hash::{FastHashMap, Signature};

use crate::eval::EvalNodeHelper;
use crate::functions::arg_parse::get_vector_arg;
use crate::functions::FunctionCall;
use crate::types::{QueryValue, Sample, Vector};
use crate::{RuntimeError, RuntimeResult};

/// NaN wins over any other value.
fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

/// Matches the elements of every vector argument one-to-one on their labels
/// (the metric name excluded) and reduces each match with `pick`. Elements of
/// the first vector without a partner in every other vector are dropped. The
/// first vector's label sets are kept.
fn pick_across_vectors(
    func: &str,
    values: &[QueryValue],
    enh: &mut EvalNodeHelper,
    pick: fn(f64, f64) -> f64,
) -> RuntimeResult<Vector> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let first = get_vector_arg(func, values, 0)?;
    if values.len() == 1 {
        return Ok(first.clone());
    }

    enh.right_sigs.clear();
    let mut first_sigs: Vec<Signature> = Vec::with_capacity(first.len());
    for (i, s) in first.iter().enumerate() {
        let sig = enh.signature(false, &[], &s.metric);
        if enh.right_sigs.insert(sig, i).is_some() {
            debug!(func, metric = %s.metric, "duplicate series for the match group");
            return Err(RuntimeError::DuplicateMatchGroup);
        }
        first_sigs.push(sig);
    }

    let mut others: Vec<FastHashMap<Signature, f64>> = Vec::with_capacity(values.len() - 1);
    for arg_num in 1..values.len() {
        let vector = get_vector_arg(func, values, arg_num)?;
        let mut by_sig = FastHashMap::with_capacity(vector.len());
        for s in vector {
            let sig = enh.signature(false, &[], &s.metric);
            if by_sig.insert(sig, s.v).is_some() {
                debug!(func, arg_num, metric = %s.metric, "multiple matches for labels");
                return Err(RuntimeError::AmbiguousMatch);
            }
        }
        others.push(by_sig);
    }

    let ts = enh.ts;
    let mut out = Vec::with_capacity(first.len());
    'samples: for (s, sig) in first.iter().zip(first_sigs.iter()) {
        let mut value = s.v;
        for by_sig in others.iter() {
            let Some(v) = by_sig.get(sig) else {
                continue 'samples;
            };
            value = pick(value, *v);
        }
        out.push(Sample::new(s.metric.clone(), ts, value));
    }
    Ok(out)
}

/// `greatest(v1, v2, ...)`: per matched series, the largest value.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Greatest;

impl FunctionCall for Greatest {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(&self, values: &[QueryValue], _args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        pick_across_vectors("greatest", values, enh, nan_max)
    }
}

/// `least(v1, v2, ...)`: per matched series, the smallest value.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Least;

impl FunctionCall for Least {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(&self, values: &[QueryValue], _args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        pick_across_vectors("least", values, enh, nan_min)
    }
}
