pub use aggregate::*;
pub use binop::*;
pub use helper::*;
pub use pool::*;
pub use preprocess::*;
pub use set_ops::*;
pub use vector_matching::vector_binop;

pub(crate) use binop::check_distinct_labelsets;

mod aggregate;
mod binop;
mod helper;
mod out_join;
mod pool;
mod preprocess;
mod set_ops;
pub(crate) mod vector_matching;

#[cfg(test)]
mod binop_test;
#[cfg(test)]
mod set_ops_test;
