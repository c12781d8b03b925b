use std::mem;

use tracing::trace;
use uniquery_ast::{AtModifier, Expr, StepInvariantExpr};

use crate::{RuntimeError, RuntimeResult};

/// Resolves `@ start()` / `@ end()` to concrete timestamps and marks the
/// subtrees whose value does not change between evaluation steps.
///
/// An expression that is invariant as a whole is wrapped once at the top.
/// Otherwise only the invariant operands of binary expressions are wrapped, so
/// the evaluator can compute them once per query.
pub fn preprocess_expr(mut expr: Expr, start: i64, end: i64) -> RuntimeResult<Expr> {
    if preprocess_expr_helper(&mut expr, start, end)? {
        return Ok(new_step_invariant_expr(expr));
    }
    Ok(expr)
}

/// Wraps `expr` in a step-invariant marker. Enclosing parentheses are dropped
/// so the marker sits directly on the inner expression.
pub fn new_step_invariant_expr(expr: Expr) -> Expr {
    match expr {
        Expr::Parens(p) => new_step_invariant_expr(*p.expr),
        other => Expr::StepInvariant(StepInvariantExpr {
            expr: Box::new(other),
        }),
    }
}

/// Replaces `slot` with its step-invariant wrapping.
fn wrap_in_place(slot: &mut Expr) {
    let inner = mem::replace(slot, Expr::number(0.0));
    *slot = new_step_invariant_expr(inner);
}

fn preprocess_expr_helper(expr: &mut Expr, start: i64, end: i64) -> RuntimeResult<bool> {
    match expr {
        Expr::VectorSelector(vs) => {
            match vs.at {
                Some(AtModifier::Start) => vs.timestamp = Some(start),
                Some(AtModifier::End) => vs.timestamp = Some(end),
                None => {}
            }
            Ok(vs.timestamp.is_some())
        }
        Expr::Aggregation(ae) => preprocess_expr_helper(&mut ae.expr, start, end),
        Expr::BinaryOperator(be) => {
            let left = preprocess_expr_helper(&mut be.left, start, end)?;
            let right = preprocess_expr_helper(&mut be.right, start, end)?;
            if left && right {
                return Ok(true);
            }
            if left {
                trace!(op = be.op.as_str(), "wrapping step invariant left operand");
                wrap_in_place(&mut be.left);
            }
            if right {
                trace!(op = be.op.as_str(), "wrapping step invariant right operand");
                wrap_in_place(&mut be.right);
            }
            Ok(false)
        }
        Expr::Parens(p) => preprocess_expr_helper(&mut p.expr, start, end),
        Expr::UnaryOperator(u) => preprocess_expr_helper(&mut u.expr, start, end),
        Expr::Number(_) | Expr::StringLiteral(_) => Ok(true),
        // Functions such as time() change with every step.
        Expr::Function(_) => Ok(false),
        Expr::MatrixSelector(_) | Expr::Subquery(_) | Expr::StepInvariant(_) => {
            Err(RuntimeError::UnexpectedNode(format!("{}: {}", expr.variant_name(), expr)))
        }
    }
}
