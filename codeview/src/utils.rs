//! Small helpers shared by the symbol and type record iterators.

pub mod iter;
