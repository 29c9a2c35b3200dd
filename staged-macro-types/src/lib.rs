#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub use unsynn;

mod grammar;
pub use grammar::*;

mod descriptor;
pub use descriptor::*;
