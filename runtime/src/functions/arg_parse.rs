use uniquery_ast::Expr;
use uniquery_common::label::is_valid_label_name;

use crate::types::{QueryValue, Vector};
use crate::{RuntimeError, RuntimeResult};

pub(crate) fn get_vector_arg<'a>(
    func: &str,
    values: &'a [QueryValue],
    arg_num: usize,
) -> RuntimeResult<&'a Vector> {
    match values.get(arg_num) {
        Some(value) => value.as_vector(),
        None => Err(RuntimeError::ArgumentError(format!(
            "{func}(): missing vector arg # {}",
            arg_num + 1
        ))),
    }
}

pub(crate) fn get_string_arg<'a>(func: &str, args: &'a [Expr], arg_num: usize) -> RuntimeResult<&'a str> {
    args.get(arg_num)
        .and_then(|arg| arg.as_string_literal())
        .ok_or_else(|| {
            RuntimeError::ArgumentError(format!(
                "{func}(): expected string literal for arg # {}",
                arg_num + 1
            ))
        })
}

pub(crate) fn get_number_arg(func: &str, args: &[Expr], arg_num: usize) -> RuntimeResult<f64> {
    args.get(arg_num)
        .and_then(|arg| arg.as_number_literal())
        .ok_or_else(|| {
            RuntimeError::ArgumentError(format!(
                "{func}(): expected number literal for arg # {}",
                arg_num + 1
            ))
        })
}

pub(crate) fn get_label_name_arg(
    func: &str,
    role: &str,
    args: &[Expr],
    arg_num: usize,
) -> RuntimeResult<String> {
    let name = get_string_arg(func, args, arg_num)?;
    if !is_valid_label_name(name) {
        return Err(RuntimeError::ArgumentError(format!(
            "invalid {role} label name in {func}(): {name}"
        )));
    }
    Ok(name.to_string())
}
