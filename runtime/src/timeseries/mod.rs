pub use availability::*;
pub use bucket::*;
pub use cumulative::*;
pub use gap_fill::*;

mod availability;
mod bucket;
mod cumulative;
mod gap_fill;

#[cfg(test)]
mod availability_test;
