//! The parsed query model consumed by the evaluation core. Producing these trees
//! from query text is the job of an external parser.
pub use aggregate::*;
pub use error::*;
pub use expr::*;
pub use matching::*;
pub use operator::*;

mod aggregate;
mod error;
mod expr;
mod matching;
mod operator;
