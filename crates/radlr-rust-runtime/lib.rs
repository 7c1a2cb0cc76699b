//! Dependency-free types shared between the table-building crate
//! (`radlr_core`) and anything that drives a compiled parser at run time.
//!
//! Nothing in this crate depends on `regex` or on the grammar model; it only
//! describes the shapes that cross the compile/run boundary: tokens, the
//! runtime error type, and the handful of reserved symbol names every
//! grammar gets for free.

pub mod types;

pub use types::*;
