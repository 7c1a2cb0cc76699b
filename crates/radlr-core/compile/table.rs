//! The ACTION/GOTO table generator (§4.6): turns the LR(0) machine plus its
//! LALR lookaheads into a deterministic table, resolving shift/reduce and
//! reduce/reduce conflicts by precedence, associativity, and declaration
//! order.

use super::item::Item;
use super::lalr::Lookaheads;
use super::lr0::LrMachine;
use crate::grammar::Grammar;
use crate::journal::{Journal, ReportPhase};
use crate::types::{Associativity, ProductionId, SymbolId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Shift(usize),
  Reduce(ProductionId),
  Accept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
  ShiftReduce,
  ReduceReduce,
}

/// A recorded conflict, resolved or not (§4.6 "The generator records every
/// conflict ... in a diagnostics log keyed by state index").
#[derive(Debug, Clone)]
pub struct Conflict {
  pub state: usize,
  pub symbol: SymbolId,
  pub kind: ConflictKind,
  pub chosen: Option<Action>,
  pub rejected: Vec<Action>,
}

/// The immutable ACTION/GOTO table (§3 "ACTION table", "GOTO table").
#[derive(Debug)]
pub struct ParseTable {
  pub action: HashMap<(usize, SymbolId), Action>,
  pub goto: HashMap<(usize, SymbolId), usize>,
  pub conflicts: Vec<Conflict>,
}

impl ParseTable {
  pub fn action(&self, state: usize, terminal: SymbolId) -> Option<Action> {
    self.action.get(&(state, terminal)).copied()
  }

  pub fn goto(&self, state: usize, nonterminal: SymbolId) -> Option<usize> {
    self.goto.get(&(state, nonterminal)).copied()
  }
}

pub fn generate(machine: &LrMachine, lookaheads: &Lookaheads, g: &Grammar, journal: &mut Journal) -> ParseTable {
  let mut action: HashMap<(usize, SymbolId), Action> = HashMap::new();
  let mut goto: HashMap<(usize, SymbolId), usize> = HashMap::new();
  let mut conflicts = vec![];
  let mut nonassoc_errors: HashSet<(usize, SymbolId)> = HashSet::new();

  for (state_idx, state) in machine.states.iter().enumerate() {
    for (&sym, &target) in &state.transitions {
      if g.is_nonterminal(sym) {
        goto.insert((state_idx, sym), target);
        continue;
      }

      let is_accept =
        sym == g.end_symbol && state.closure.contains(&Item { production: g.augmented_production, dot: 1 });

      let new_action = if is_accept { Action::Accept } else { Action::Shift(target) };
      place(&mut action, &mut conflicts, &mut nonassoc_errors, g, state_idx, sym, new_action, journal);
    }

    for item in &state.closure {
      if !item.is_complete(g) || item.production == g.augmented_production {
        continue;
      }
      let Some(las) = lookaheads.get(&(state_idx, *item)) else { continue };
      for &a in las {
        place(&mut action, &mut conflicts, &mut nonassoc_errors, g, state_idx, a, Action::Reduce(item.production), journal);
      }
    }
  }

  journal.info(ReportPhase::TableGeneration, format!("table generated: {} action cells, {} conflicts", action.len(), conflicts.len()));

  ParseTable { action, goto, conflicts }
}

#[allow(clippy::too_many_arguments)]
fn place(
  action: &mut HashMap<(usize, SymbolId), Action>,
  conflicts: &mut Vec<Conflict>,
  nonassoc_errors: &mut HashSet<(usize, SymbolId)>,
  g: &Grammar,
  state: usize,
  symbol: SymbolId,
  new_action: Action,
  journal: &mut Journal,
) {
  if nonassoc_errors.contains(&(state, symbol)) {
    return;
  }

  match action.get(&(state, symbol)).copied() {
    None => {
      action.insert((state, symbol), new_action);
    }
    Some(existing) if existing == new_action => {}
    Some(existing) => {
      let (kind, resolution) = resolve(g, symbol, &existing, &new_action);
      match resolution {
        Resolution::Keep(kept) => {
          if kept == new_action {
            action.insert((state, symbol), new_action);
          }
          journal.log_conflict(format!("state {state}, symbol {}: {kind:?} conflict resolved to {kept:?}", g.symbol(symbol).name));
          conflicts.push(Conflict { state, symbol, kind, chosen: Some(kept), rejected: vec![if kept == existing { new_action } else { existing }] });
        }
        Resolution::Error => {
          action.remove(&(state, symbol));
          nonassoc_errors.insert((state, symbol));
          journal.log_conflict(format!("state {state}, symbol {}: nonassoc conflict, no valid action", g.symbol(symbol).name));
          conflicts.push(Conflict { state, symbol, kind, chosen: None, rejected: vec![existing, new_action] });
        }
      }
    }
  }
}

enum Resolution {
  Keep(Action),
  Error,
}

/// Implements the conflict-resolution rules of §4.6. `symbol` is the
/// terminal the conflicting cell is keyed on — for a shift/reduce conflict
/// its precedence is what's compared against the reduce production's.
fn resolve(g: &Grammar, symbol: SymbolId, a: &Action, b: &Action) -> (ConflictKind, Resolution) {
  match (a, b) {
    (Action::Reduce(p1), Action::Reduce(p2)) if p1 != p2 => {
      // keep the earlier-declared production
      let kept = if p1.index() < p2.index() { *p1 } else { *p2 };
      (ConflictKind::ReduceReduce, Resolution::Keep(Action::Reduce(kept)))
    }
    (shift, reduce) | (reduce, shift) if matches!(shift, Action::Shift(_) | Action::Accept) && matches!(reduce, Action::Reduce(_)) => {
      let Action::Reduce(p) = reduce else { unreachable!() };
      let production = g.production(*p);
      let symbol_prec = g.symbol(symbol).precedence;
      match (production.precedence, symbol_prec) {
        (Some(p_prec), Some(s_prec)) if s_prec.level != p_prec.level => {
          if s_prec.level > p_prec.level {
            (ConflictKind::ShiftReduce, Resolution::Keep(*shift))
          } else {
            (ConflictKind::ShiftReduce, Resolution::Keep(*reduce))
          }
        }
        (Some(p_prec), Some(_)) => match p_prec.assoc {
          Associativity::Left => (ConflictKind::ShiftReduce, Resolution::Keep(*reduce)),
          Associativity::Right => (ConflictKind::ShiftReduce, Resolution::Keep(*shift)),
          Associativity::NonAssoc => (ConflictKind::ShiftReduce, Resolution::Error),
        },
        _ => (ConflictKind::ShiftReduce, Resolution::Keep(*shift)),
      }
    }
    _ => (ConflictKind::ReduceReduce, Resolution::Keep(*a)),
  }
}
