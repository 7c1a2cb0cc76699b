//! Construction-time half of the library: the grammar model (§3, §4.1), the
//! scanner compiler (§4.2), the LR(0) machine builder (§4.4), the LALR
//! lookahead solver (§4.5), and the ACTION/GOTO table generator (§4.6).
//!
//! `radlr_core` never drives a parse itself — that's `radlr`'s job. This
//! crate only turns a frozen grammar + token rule set into the immutable
//! tables and compiled matcher that a driver runs against a token stream.

pub mod compile;
pub mod grammar;
pub mod journal;
pub mod scanner;
pub mod types;

pub use compile::{
  build_tables,
  lalr::solve_lookaheads,
  lr0::LrMachine,
  table::{Action, Conflict, ConflictKind, ParseTable},
  ParserTables,
};
pub use grammar::{Grammar, GrammarBuilder};
pub use journal::{BuildConfig, Journal};
pub use radlr_rust_runtime::types::{RadlrError, RadlrResult, Severity, Token};
pub use scanner::{CompiledScanner, ScannerBuilder};
pub use types::*;
