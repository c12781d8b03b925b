pub mod hash;
pub mod label;
pub mod pool;

pub mod prelude {
    pub use crate::hash::*;
    pub use crate::label::*;
    pub use crate::pool::*;
}
