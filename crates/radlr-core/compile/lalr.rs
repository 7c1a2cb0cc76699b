//! The LALR(1) lookahead solver (§4.5). Computes, for every kernel item in
//! every state, the set of terminals that may follow its handle — the
//! "determining lookaheads" procedure of DeRemer & Pennello.
//!
//! Rather than literally introducing a synthetic marker terminal and
//! inspecting where it resurfaces (the textbook mechanics §4.5 describes),
//! this solver computes the *result* of that procedure directly: lookahead
//! sets are seeded (spontaneous generation) and then relaxed to a fixed
//! point over an explicit worklist (propagation), which is observably
//! equivalent — every kernel item ends up with exactly the same lookahead
//! set — and easier to verify without a marker bookkeeping pass. See
//! `DESIGN.md` for the rationale.

use super::item::Item;
use super::lr0::LrMachine;
use crate::grammar::Grammar;
use crate::journal::{Journal, ReportPhase};
use crate::types::SymbolId;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

pub type Lookaheads = HashMap<(usize, Item), BTreeSet<SymbolId>>;

struct FirstSets {
  first: HashMap<SymbolId, BTreeSet<SymbolId>>,
  nullable: BTreeSet<SymbolId>,
}

fn compute_first_sets(g: &Grammar) -> FirstSets {
  let mut first: HashMap<SymbolId, BTreeSet<SymbolId>> = HashMap::new();
  for s in &g.symbols {
    if s.is_terminal() {
      first.insert(s.id, [s.id].into_iter().collect());
    }
  }
  let mut nullable: BTreeSet<SymbolId> = BTreeSet::new();

  let mut changed = true;
  while changed {
    changed = false;
    for p in &g.productions {
      let mut all_nullable_so_far = true;
      for &sym in &p.rhs {
        if g.is_nonterminal(sym) {
          let sym_first = first.get(&sym).cloned().unwrap_or_default();
          let entry = first.entry(p.lhs).or_default();
          let before = entry.len();
          entry.extend(sym_first.iter().copied());
          if entry.len() != before {
            changed = true;
          }
        } else {
          let entry = first.entry(p.lhs).or_default();
          if entry.insert(sym) {
            changed = true;
          }
        }
        if !(g.is_nonterminal(sym) && nullable.contains(&sym)) {
          all_nullable_so_far = false;
          break;
        }
      }
      if p.is_epsilon() || all_nullable_so_far {
        if nullable.insert(p.lhs) {
          changed = true;
        }
      }
    }
  }

  FirstSets { first, nullable }
}

/// FIRST of a symbol sequence: the terminals that may begin it, plus
/// whether the whole sequence can derive ε.
fn sequence_first(seq: &[SymbolId], g: &Grammar, sets: &FirstSets) -> (BTreeSet<SymbolId>, bool) {
  let mut out = BTreeSet::new();
  for &sym in seq {
    if g.is_nonterminal(sym) {
      out.extend(sets.first.get(&sym).into_iter().flatten().copied());
      if !sets.nullable.contains(&sym) {
        return (out, false);
      }
    } else {
      out.insert(sym);
      return (out, false);
    }
  }
  (out, true)
}

/// Computes the full ε-closure of a single seed item together with its
/// lookahead set, propagating lookaheads to every closure item exactly as
/// the standard LR(1) closure procedure would (§4.5).
fn closure_with_lookaheads(seed: Item, seed_la: &BTreeSet<SymbolId>, g: &Grammar, sets: &FirstSets) -> BTreeMap<Item, BTreeSet<SymbolId>> {
  let mut map: BTreeMap<Item, BTreeSet<SymbolId>> = BTreeMap::new();
  map.insert(seed, seed_la.clone());

  loop {
    let mut changed = false;
    let snapshot: Vec<(Item, BTreeSet<SymbolId>)> = map.iter().map(|(k, v)| (*k, v.clone())).collect();
    for (item, la) in snapshot {
      let Some(sym) = item.symbol_after_dot(g) else { continue };
      if !g.is_nonterminal(sym) {
        continue;
      }
      let rest = item.rest(g);
      let beta = &rest[1..];
      let (mut beta_first, beta_nullable) = sequence_first(beta, g, sets);
      if beta_nullable {
        beta_first.extend(la.iter().copied());
      }
      for &pid in g.productions_of(sym) {
        let new_item = Item::start(pid);
        let entry = map.entry(new_item).or_default();
        let before = entry.len();
        entry.extend(beta_first.iter().copied());
        if entry.len() != before {
          changed = true;
        }
      }
    }
    if !changed {
      break;
    }
  }

  map
}

/// Solves for the LALR(1) lookahead set of every kernel item in every
/// state, seeding the augmented start item with `{$end}` and relaxing to a
/// fixed point (§4.5's "Repeat propagation to fixed point over an explicit
/// worklist").
pub fn solve_lookaheads(machine: &LrMachine, g: &Grammar, journal: &mut Journal) -> Lookaheads {
  let sets = compute_first_sets(g);

  // Lookaheads attached to kernel items only — what drives propagation
  // between states (§4.5 "propagated ... to the identified successor
  // item").
  let mut kernel_lookaheads: Lookaheads = HashMap::new();
  // Lookaheads attached to every item in every state's closure, including
  // complete items that never propagate anywhere (what the reduce side of
  // the table generator needs). A superset of `kernel_lookaheads`.
  let mut closure_lookaheads: Lookaheads = HashMap::new();

  let start_item = Item::start(g.augmented_production);
  kernel_lookaheads.insert((machine.start_state, start_item), [g.end_symbol].into_iter().collect());

  let mut worklist: VecDeque<usize> = (0..machine.states.len()).collect();
  let mut in_queue: Vec<bool> = vec![true; machine.states.len()];
  let mut iterations = 0usize;

  while let Some(state_idx) = worklist.pop_front() {
    in_queue[state_idx] = false;
    iterations += 1;

    let state = &machine.states[state_idx];
    let kernel: Vec<Item> = state.kernel.iter().copied().collect();
    let transitions = state.transitions.clone();

    let mut newly_reached: BTreeSet<usize> = BTreeSet::new();

    for item in kernel {
      let Some(la) = kernel_lookaheads.get(&(state_idx, item)).cloned() else { continue };
      if la.is_empty() {
        continue;
      }
      let closure_map = closure_with_lookaheads(item, &la, g, &sets);
      for (closure_item, closure_la) in closure_map {
        closure_lookaheads.entry((state_idx, closure_item)).or_default().extend(closure_la.iter().copied());

        let Some(sym) = closure_item.symbol_after_dot(g) else { continue };
        let Some(&next_state) = transitions.get(&sym) else { continue };
        let next_item = closure_item.advance();
        let entry = kernel_lookaheads.entry((next_state, next_item)).or_default();
        let before = entry.len();
        entry.extend(closure_la.iter().copied());
        if entry.len() != before {
          newly_reached.insert(next_state);
        }
      }
    }

    for idx in newly_reached {
      if !in_queue[idx] {
        in_queue[idx] = true;
        worklist.push_back(idx);
      }
    }
  }

  journal.info(
    ReportPhase::LalrSolve,
    format!("LALR lookaheads solved over {} states in {iterations} worklist iterations", machine.states.len()),
  );

  closure_lookaheads
}
