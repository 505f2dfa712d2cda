//! Query-time access to the final index

mod accessor;

pub use accessor::*;
