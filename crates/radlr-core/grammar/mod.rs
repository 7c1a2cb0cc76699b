//! The grammar model (§3, §4.1): immutable symbols, productions, and
//! precedence, built incrementally through [`GrammarBuilder`] and validated
//! by [`GrammarBuilder::freeze`].

mod builder;
pub mod ebnf;

pub use builder::{Grammar, GrammarBuilder};
