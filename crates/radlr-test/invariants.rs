//! §8 "Testable Properties": structural invariants of the generated tables
//! themselves, checked directly against `radlr_core` rather than through a
//! `radlr::Parser`. These don't parse anything — they inspect the LR(0)
//! machine, the LALR lookahead sets, and the resolved `ParseTable` for an
//! intentionally ambiguous grammar.

use radlr_core::compile::lr0;
use radlr_core::{build_tables, solve_lookaheads, Action, Associativity, ConflictKind, GrammarBuilder, Journal};

fn ambiguous_expr_grammar(journal: &mut Journal) -> radlr_core::Grammar {
  let mut g = GrammarBuilder::new();
  g.add_terminal("NUMBER");
  g.add_terminal("+");
  g.add_precedence_level(Associativity::Left, &["+"]);
  g.set_start("expr");
  g.add_production("expr", "expr '+' expr", None, None, None);
  g.add_production("expr", "NUMBER", None, None, None);
  g.freeze(journal).expect("ambiguous grammar still freezes; ambiguity is a conflict, not a build error")
}

/// Every state's ACTION table has exactly one entry per (state, terminal)
/// pair once conflicts are resolved — `table.action` is a `HashMap`, so
/// this is about whether conflict resolution ever leaves two candidate
/// actions both reachable, not about the map's own uniqueness.
#[test]
fn action_table_has_one_resolved_entry_per_conflicting_cell() {
  let mut journal = Journal::new();
  let grammar = ambiguous_expr_grammar(&mut journal);
  let tables = build_tables(&grammar, &mut journal);

  assert!(!tables.table.conflicts.is_empty(), "expr + expr + expr must produce at least one shift/reduce conflict");

  for conflict in &tables.table.conflicts {
    assert_eq!(conflict.kind, ConflictKind::ShiftReduce);
    let chosen = conflict.chosen.expect("left-associative `+` always resolves, never nonassoc-errors");
    assert_eq!(tables.table.action(conflict.state, conflict.symbol), Some(chosen));
  }
}

/// `left +` must resolve every such conflict in favor of reducing — a
/// dangling shift would make `expr + expr + expr` group right-associatively
/// instead.
#[test]
fn left_associativity_always_resolves_shift_reduce_conflicts_to_reduce() {
  let mut journal = Journal::new();
  let grammar = ambiguous_expr_grammar(&mut journal);
  let tables = build_tables(&grammar, &mut journal);

  for conflict in &tables.table.conflicts {
    assert!(matches!(conflict.chosen, Some(Action::Reduce(_))));
  }
}

/// Every complete item's LALR lookahead terminals resolve to a defined
/// ACTION entry: conflict resolution always leaves *some* action in place
/// for an associative operator, never silently drops the cell.
#[test]
fn every_lookahead_of_a_complete_item_has_a_defined_action() {
  let mut journal = Journal::new();
  let grammar = ambiguous_expr_grammar(&mut journal);
  let machine = lr0::build(&grammar, &mut journal);
  let lookaheads = solve_lookaheads(&machine, &grammar, &mut journal);
  let tables = build_tables(&grammar, &mut journal);

  for (state_idx, state) in machine.states.iter().enumerate() {
    for item in &state.closure {
      if !item.is_complete(&grammar) || item.production == grammar.augmented_production {
        continue;
      }
      let Some(las) = lookaheads.get(&(state_idx, *item)) else { continue };
      for &terminal in las {
        assert!(
          tables.table.action(state_idx, terminal).is_some(),
          "state {state_idx} has a complete item with no resolved action for its lookahead"
        );
      }
    }
  }
}

/// The augmented production's reduce item is never itself schedulable:
/// reaching dot position 1 over `$end` is how `Action::Accept` is detected,
/// not an ordinary reduce.
#[test]
fn augmented_production_never_appears_as_an_ordinary_reduce_action() {
  let mut journal = Journal::new();
  let grammar = ambiguous_expr_grammar(&mut journal);
  let tables = build_tables(&grammar, &mut journal);

  for action in tables.table.action.values() {
    if let Action::Reduce(pid) = action {
      assert_ne!(*pid, grammar.augmented_production);
    }
  }
}
