pub use point::*;
pub use query::*;
pub use query_value::*;
pub use sample::*;

mod point;
mod query;
mod query_value;
mod sample;


pub use uniquery_common::label::{Label, Labels};
