use itertools::Itertools;
use regex::Regex;
use tracing::debug;
use uniquery_ast::Expr;
use uniquery_common::label::Labels;

use crate::eval::EvalNodeHelper;
use crate::functions::arg_parse::{get_label_name_arg, get_string_arg, get_vector_arg};
use crate::functions::FunctionCall;
use crate::types::{ContainsSameLabelset, QueryValue, Sample, Vector};
use crate::{RuntimeError, RuntimeResult};

/// Rewrites the label set of every element of the first argument, reusing
/// results cached in `enh.dmn` for label sets already seen at this node.
fn relabel(
    func: &str,
    values: &[QueryValue],
    enh: &mut EvalNodeHelper,
    mut f: impl FnMut(&mut EvalNodeHelper, &Labels) -> Labels,
) -> RuntimeResult<Vector> {
    let vector = get_vector_arg(func, values, 0)?;
    let ts = enh.ts;
    let mut out: Vector = Vec::with_capacity(vector.len());
    for el in vector {
        let h = el.metric.fast_hash();
        let metric = match enh.dmn.get(&h) {
            Some(cached) => cached.clone(),
            None => {
                let metric = f(enh, &el.metric);
                enh.dmn.insert(h, metric.clone());
                metric
            }
        };
        out.push(Sample::new(metric, ts, el.v));
    }

    if out.contains_same_labelset() {
        debug!(func, "relabeling produced duplicate series");
        return Err(RuntimeError::DuplicateResultLabelset);
    }
    Ok(out)
}

/// `label_replace(v, dst, replacement, src, regex)`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LabelReplace;

#[derive(Debug, Clone)]
struct LabelReplaceCall {
    dst: String,
    replacement: String,
    src: String,
    regex: Regex,
}

impl LabelReplaceCall {
    fn new(args: &[Expr]) -> RuntimeResult<Self> {
        let regex_str = get_string_arg("label_replace", args, 4)?;
        let regex = Regex::new(&format!("^(?:{regex_str})$")).map_err(|e| {
            RuntimeError::InvalidRegex(format!(
                "invalid regular expression in label_replace(): {regex_str}: {e}"
            ))
        })?;
        let dst = get_label_name_arg("label_replace", "destination", args, 1)?;
        Ok(Self {
            dst,
            replacement: get_string_arg("label_replace", args, 2)?.to_string(),
            src: get_string_arg("label_replace", args, 3)?.to_string(),
            regex,
        })
    }

    fn apply(&self, enh: &mut EvalNodeHelper, metric: &Labels) -> Labels {
        let src_val = metric.get_or_empty(&self.src);
        let Some(caps) = self.regex.captures(src_val) else {
            // no match, no replacement
            return metric.clone();
        };
        let mut res = String::new();
        caps.expand(&self.replacement, &mut res);

        enh.lb.reset(metric);
        enh.lb.del(&[self.dst.as_str()]);
        if !res.is_empty() {
            enh.lb.set(self.dst.as_str(), res);
        }
        enh.lb.labels()
    }
}

impl FunctionCall for LabelReplace {
    fn instantiate(&self, args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(LabelReplaceCall::new(args)?))
    }

    fn call(&self, values: &[QueryValue], args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        LabelReplaceCall::new(args)?.call(values, args, enh)
    }
}

impl FunctionCall for LabelReplaceCall {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(self.clone()))
    }

    fn call(&self, values: &[QueryValue], _args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        relabel("label_replace", values, enh, |enh, metric| self.apply(enh, metric))
    }
}

/// `label_join(v, dst, separator, src...)`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LabelJoin;

#[derive(Debug, Clone)]
struct LabelJoinCall {
    dst: String,
    separator: String,
    src_labels: Vec<String>,
}

impl LabelJoinCall {
    fn new(args: &[Expr]) -> RuntimeResult<Self> {
        let dst = get_label_name_arg("label_join", "destination", args, 1)?;
        let separator = get_string_arg("label_join", args, 2)?.to_string();
        let src_labels = (3..args.len())
            .map(|i| get_label_name_arg("label_join", "source", args, i))
            .collect::<RuntimeResult<Vec<_>>>()?;
        Ok(Self {
            dst,
            separator,
            src_labels,
        })
    }

    fn apply(&self, enh: &mut EvalNodeHelper, metric: &Labels) -> Labels {
        let joined = self
            .src_labels
            .iter()
            .map(|name| metric.get_or_empty(name))
            .join(&self.separator);

        enh.lb.reset(metric);
        if joined.is_empty() {
            enh.lb.del(&[self.dst.as_str()]);
        } else {
            enh.lb.set(self.dst.as_str(), joined);
        }
        enh.lb.labels()
    }
}

impl FunctionCall for LabelJoin {
    fn instantiate(&self, args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(LabelJoinCall::new(args)?))
    }

    fn call(&self, values: &[QueryValue], args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        LabelJoinCall::new(args)?.call(values, args, enh)
    }
}

impl FunctionCall for LabelJoinCall {
    fn instantiate(&self, _args: &[Expr]) -> RuntimeResult<Box<dyn FunctionCall>> {
        Ok(Box::new(self.clone()))
    }

    fn call(&self, values: &[QueryValue], _args: &[Expr], enh: &mut EvalNodeHelper) -> RuntimeResult<Vector> {
        relabel("label_join", values, enh, |enh, metric| self.apply(enh, metric))
    }
}
