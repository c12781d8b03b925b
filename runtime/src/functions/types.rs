use uniquery_ast::Expr;

use crate::eval::EvalNodeHelper;
use crate::types::{QueryValue, Vector};
use crate::RuntimeResult;

/// An instant-vector function such as `abs` or `label_replace`.
///
/// The registry holds one prototype per name. [`instantiate`](FunctionCall::instantiate)
/// is called once per call site with the argument expressions so literal
/// arguments (regexes, label names, bounds) are parsed and validated before the
/// first step is evaluated. The returned instance is then called for every step.
pub trait FunctionCall: Send + Sync {
    fn instantiate(&self, args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>>;

    /// Evaluates the function for the step `enh.ts`. `values` holds the
    /// evaluated arguments in call order.
    fn call(
        &self,
        values: &[QueryValue],
        args: &[Expr],
        enh: &mut EvalNodeHelper,
    ) -> RuntimeResult<Vector>;
}
