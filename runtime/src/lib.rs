//! Evaluation core for a promql-style query language.
//!
//! The crate evaluates already parsed expressions (see `uniquery_ast`) against
//! series data fetched by the caller. It covers binary operators and vector
//! matching, set operators, aggregation, step-invariant rewriting, bucket
//! alignment, gap filling and k-minute downtime.
extern crate chrono;
extern crate chrono_tz;
extern crate regex;

mod config;
mod runtime_error;
mod utils;

pub mod eval;
pub mod functions;
pub mod timeseries;
pub mod types;

pub use config::*;
pub use eval::{
    acquire_points, aggregation, generate_grouping_key, negate_matrix, negate_vector,
    new_step_invariant_expr, preprocess_expr, release_points, scalar_binop, vector_and, vector_binop,
    vector_elem_binop, vector_or, vector_scalar_binop, vector_unless, EvalNodeHelper, EvalSeriesHelper,
};
pub use functions::{call_function, get_function, is_function, FunctionCall};
pub use runtime_error::*;
pub use timeseries::*;
pub use types::*;
pub use utils::{get_local_tz, parse_timezone};
