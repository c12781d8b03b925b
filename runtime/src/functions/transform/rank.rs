use uniquery_ast::Expr;

use crate::eval::EvalNodeHelper;
use crate::functions::arg_parse::{get_number_arg, get_vector_arg};
use crate::functions::FunctionCall;
use crate::types::{QueryValue, Sample, Vector};
use crate::{RuntimeError, RuntimeResult};

const MAX_PRECISION: i64 = 16;

/// Non-NaN values of `vector`, ascending.
fn sorted_values(vector: &[Sample]) -> Vec<f64> {
    let mut sorted: Vec<f64> = vector.iter().map(|s| s.v).filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Number of values in `sorted` strictly below `v`.
#[inline]
fn count_below(sorted: &[f64], v: f64) -> usize {
    sorted.partition_point(|x| *x < v)
}

/// Number of values in `sorted` strictly above `v`.
#[inline]
fn count_above(sorted: &[f64], v: f64) -> usize {
    sorted.len() - sorted.partition_point(|x| *x <= v)
}

/// Cuts `num` down to `places` decimal places. Negative `places` zero out
/// digits left of the point.
fn truncate_float(num: f64, places: i64) -> f64 {
    let multiplier = 10f64.powi(places as i32);
    (num * multiplier).trunc() / multiplier
}

/// `rank(v, order)`: competition rank of every value, equal values sharing a
/// rank. `order == 0` ranks the largest value first, anything else the
/// smallest. NaN and infinite values are passed through unranked.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Rank;

#[derive(Debug, Clone, Copy)]
struct RankCall {
    ascending: bool,
}

impl FunctionCall for Rank {
    fn instantiate(&self, args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        let order = get_number_arg("rank", args, 1)?;
        Ok(Box::new(RankCall {
            ascending: order as i64 != 0,
        }))
    }

    fn call(&self, values: &[QueryValue], args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        self.instantiate(args)?.call(values, args, enh)
    }
}

impl FunctionCall for RankCall {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(&self, values: &[QueryValue], _args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        let vector = get_vector_arg("rank", values, 0)?;
        let sorted = sorted_values(vector);
        let ts = enh.ts;
        let out = vector
            .iter()
            .map(|s| {
                let v = if s.v.is_finite() {
                    let ahead = if self.ascending {
                        count_below(&sorted, s.v)
                    } else {
                        count_above(&sorted, s.v)
                    };
                    (ahead + 1) as f64
                } else {
                    s.v
                };
                Sample::new(s.metric.clone(), ts, v)
            })
            .collect();
        Ok(out)
    }
}

/// `percent_rank(v, precision)`: share of the vector below each value, in
/// percent, truncated to `precision - 2` decimal places. A single finite value
/// ranks at 100. NaN and infinite values are passed through unranked.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PercentRank;

#[derive(Debug, Clone, Copy)]
struct PercentRankCall {
    precision: i64,
}

impl FunctionCall for PercentRank {
    fn instantiate(&self, args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        let precision = get_number_arg("percent_rank", args, 1)? as i64;
        if precision < 1 {
            return Err(RuntimeError::ArgumentError(format!(
                "invalid precision in percent_rank(): {precision}"
            )));
        }
        Ok(Box::new(PercentRankCall {
            precision: precision.min(MAX_PRECISION),
        }))
    }

    fn call(&self, values: &[QueryValue], args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        self.instantiate(args)?.call(values, args, enh)
    }
}

impl FunctionCall for PercentRankCall {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(&self, values: &[QueryValue], _args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        let vector = get_vector_arg("percent_rank", values, 0)?;
        let sorted = sorted_values(vector);
        let n = vector.len();
        let ts = enh.ts;
        let out = vector
            .iter()
            .map(|s| {
                let v = if !s.v.is_finite() {
                    s.v
                } else if n == 1 {
                    truncate_float(100.0, self.precision)
                } else {
                    let below = count_below(&sorted, s.v) as f64;
                    truncate_float(below / (n - 1) as f64 * 100.0, self.precision - 2)
                };
                Sample::new(s.metric.clone(), ts, v)
            })
            .collect();
        Ok(out)
    }
}
