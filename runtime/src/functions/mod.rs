pub use registry::*;
pub use types::*;

mod arg_parse;
mod registry;
pub(crate) mod transform;
mod types;
