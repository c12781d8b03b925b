use std::cmp::Ordering;

use uniquery_ast::Expr;

use crate::eval::EvalNodeHelper;
use crate::functions::arg_parse::get_vector_arg;
use crate::functions::FunctionCall;
use crate::types::{QueryValue, Vector};
use crate::utils::{float_cmp_desc_nan_last, float_cmp_nan_last};
use crate::RuntimeResult;

fn sort_by_value(
    func: &str,
    values: &[QueryValue],
    cmp: fn(f64, f64) -> Ordering,
) -> RuntimeResult<Vector> {
    let mut vector = get_vector_arg(func, values, 0)?.clone();
    vector.sort_by(|a, b| cmp(a.v, b.v));
    Ok(vector)
}

/// `sort(v)`: ascending by value, NaN last.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Sort;

impl FunctionCall for Sort {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(&self, values: &[QueryValue], _args: &[Expr], _enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        sort_by_value("sort", values, float_cmp_nan_last)
    }
}

/// `sort_desc(v)`: descending by value, NaN last.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SortDesc;

impl FunctionCall for SortDesc {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(&self, values: &[QueryValue], _args: &[Expr], _enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        sort_by_value("sort_desc", values, float_cmp_desc_nan_last)
    }
}
