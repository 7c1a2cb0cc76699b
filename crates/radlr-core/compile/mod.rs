//! LR(0) construction (§4.4), LALR lookahead solving (§4.5), and ACTION/GOTO
//! table generation with conflict resolution (§4.6).

pub mod build;
pub mod item;
pub mod lalr;
pub mod lr0;
pub mod table;

pub use build::{build as build_tables, ParserTables};
pub use item::Item;
pub use lr0::LrMachine;
