//! Ties the LR(0) builder, LALR solver, and table generator together into
//! the single call a `ParserBuilder` needs: grammar in, parse table out.

use super::lalr::solve_lookaheads;
use super::lr0;
use super::table::{self, ParseTable};
use crate::grammar::Grammar;
use crate::journal::Journal;

/// Everything the parse driver needs at run time: the GOTO graph's state
/// count and the generated table. The LR(0)/LALR intermediates are dropped
/// once the table is built — they're only needed to construct it, and
/// `radlr::Parser` only ever consults `ParseTable`.
pub struct ParserTables {
  pub table: ParseTable,
  pub state_count: usize,
}

pub fn build(g: &Grammar, journal: &mut Journal) -> ParserTables {
  let machine = lr0::build(g, journal);
  let lookaheads = solve_lookaheads(&machine, g, journal);
  let table = table::generate(&machine, &lookaheads, g, journal);
  ParserTables { state_count: machine.states.len(), table }
}
