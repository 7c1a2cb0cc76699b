//!
//! Handles the integration of Grammars into a GrammarSoup

pub(crate) mod compile;

pub(crate) mod load;
pub(crate) mod merge;
pub(crate) mod build_db;
pub(crate) mod utils;
