//! The parse driver (§4.7): a shift/reduce loop over `radlr_core`'s
//! generated `ParseTable`, with `error`-token recovery (§7).

mod driver;
pub mod value;

pub use driver::{ParseErrorHook, Parser, ParserBuilder, ProdAction};
pub use value::ProductionArgs;
