pub mod collation;
pub mod compare;
pub mod expr;
pub mod iter;
pub mod runtime;
pub mod sort;
