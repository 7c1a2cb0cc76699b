//! The public-facing half of the library: the scanner engine (§4.3) and the
//! shift/reduce parse driver with error recovery (§4.7, §7).
//!
//! `radlr_core` builds the immutable scanner matcher and parse tables;
//! `radlr` drives them against real input, owning the generic semantic
//! value type `V` and user context `Ctx` that `radlr_core` deliberately
//! stays ignorant of.

pub mod lexer;
pub mod parser;

pub use lexer::{LexContext, LexErrorOutcome, Lexer, LexerBuilder, TokenHandle, TokenStream};
pub use parser::{ParseErrorHook, Parser, ParserBuilder, ProdAction, ProductionArgs};
pub use radlr_core::{Grammar, Journal};
pub use radlr_rust_runtime::types::{RadlrError, RadlrResult, Severity, Token};
