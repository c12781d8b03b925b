use uniquery_ast::Expr;

use crate::eval::{check_distinct_labelsets, EvalNodeHelper};
use crate::functions::arg_parse::get_vector_arg;
use crate::functions::transform::drop_metric_name;
use crate::functions::FunctionCall;
use crate::types::{Labels, QueryValue, Sample, Vector};
use crate::RuntimeResult;

fn simple_func(
    func: &str,
    values: &[QueryValue],
    enh: &mut EvalNodeHelper,
    op: fn(f64) -> f64,
) -> RuntimeResult<Vector> {
    let vector = get_vector_arg(func, values, 0)?;
    let ts = enh.ts;
    let mut out = Vec::with_capacity(vector.len());
    for el in vector {
        let metric = drop_metric_name(enh, &el.metric);
        out.push(Sample::new(metric, ts, op(el.v)));
    }
    check_distinct_labelsets(func, &out)?;
    Ok(out)
}

macro_rules! math_fn {
    ($name: ident, $func_name: literal, $op: expr) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub(crate) struct $name;

        impl FunctionCall for $name {
            fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
                Ok(Box::new(*self))
            }

            fn call(
                &self,
                values: &[QueryValue],
                _args: &[Expr],
                enh: &mut EvalNodeHelper,
            ) -> RuntimeResult<Vector> {
                simple_func($func_name, values, enh, $op)
            }
        }
    };
}

math_fn!(Abs, "abs", |x: f64| x.abs());
math_fn!(Ceil, "ceil", |x: f64| x.ceil());
math_fn!(Floor, "floor", |x: f64| x.floor());
math_fn!(Exp, "exp", |x: f64| x.exp());
math_fn!(Sqrt, "sqrt", |x: f64| x.sqrt());
math_fn!(Ln, "ln", |x: f64| x.ln());
math_fn!(Log2, "log2", |x: f64| x.log2());
math_fn!(Log10, "log10", |x: f64| x.log10());

/// `time()`: seconds since the epoch at the evaluation step.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Time;

impl FunctionCall for Time {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(*self))
    }

    fn call(
        &self,
        _values: &[QueryValue],
        _args: &[Expr],
        enh: &mut EvalNodeHelper,
    ) -> RuntimeResult<Vector> {
        Ok(vec![Sample::new(Labels::new(), enh.ts, enh.ts as f64 / 1000.0)])
    }
}
