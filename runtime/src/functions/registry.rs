use std::sync::LazyLock;

use tracing::trace;
use uniquery_ast::Expr;
use uniquery_common::hash::FastHashMap;

use crate::eval::EvalNodeHelper;
use crate::functions::transform::*;
use crate::functions::FunctionCall;
use crate::types::{QueryValue, Vector};
use crate::{RuntimeError, RuntimeResult};

type FunctionMap = FastHashMap<&'static str, Box<dyn FunctionCall>>;

static FUNCTIONS: LazyLock<FunctionMap> = LazyLock::new(|| {
    let mut m: FunctionMap = FastHashMap::default();
    m.insert("abs", Box::new(Abs));
    m.insert("ceil", Box::new(Ceil));
    m.insert("clamp", Box::new(Clamp));
    m.insert("clamp_max", Box::new(ClampMax));
    m.insert("clamp_min", Box::new(ClampMin));
    m.insert("exp", Box::new(Exp));
    m.insert("floor", Box::new(Floor));
    m.insert("greatest", Box::new(Greatest));
    m.insert("label_join", Box::new(LabelJoin));
    m.insert("label_replace", Box::new(LabelReplace));
    m.insert("least", Box::new(Least));
    m.insert("ln", Box::new(Ln));
    m.insert("log10", Box::new(Log10));
    m.insert("log2", Box::new(Log2));
    m.insert("percent_rank", Box::new(PercentRank));
    m.insert("rank", Box::new(Rank));
    m.insert("sort", Box::new(Sort));
    m.insert("sort_desc", Box::new(SortDesc));
    m.insert("sqrt", Box::new(Sqrt));
    m.insert("time", Box::new(Time));
    m
});

/// Looks up the prototype registered under `name`.
pub fn get_function(name: &str) -> RuntimeResult<&'static dyn FunctionCall> {
    FUNCTIONS
        .get(name)
        .map(|f| f.as_ref())
        .ok_or_else(|| RuntimeError::UnknownFunction(name.to_string()))
}

pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains_key(name)
}

/// Resolves, instantiates and calls `name` in one go. Evaluators that call the
/// same site at many steps should keep the instance from
/// [`FunctionCall::instantiate`] instead.
pub fn call_function(
    name: &str,
    values: &[QueryValue],
    args: &[Expr],
    enh: &mut EvalNodeHelper,
) -> RuntimeResult<Vector> {
    let func = get_function(name)?.instantiate(args)?;
    let out = func.call(values, args, enh)?;
    trace!(func = name, series = out.len(), "function evaluated");
    Ok(out)
}
