pub mod bits;
pub mod dimacs;
pub mod generate;
pub mod instance;

pub use bits::BitVec256;
pub use instance::{Clause, Instance, Literal};
