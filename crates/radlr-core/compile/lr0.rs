use super::item::Item;
use crate::grammar::Grammar;
use crate::journal::{Journal, ReportPhase};
use crate::types::SymbolId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub type ItemSet = BTreeSet<Item>;

/// One state of the canonical LR(0) machine: its kernel (the items that
/// define it, per §3 "Kernel"), the ε-closure of that kernel, and the GOTO
/// transitions leaving it.
#[derive(Debug, Clone)]
pub struct LrState {
  pub kernel: ItemSet,
  pub closure: ItemSet,
  pub transitions: BTreeMap<SymbolId, usize>,
}

/// The canonical LR(0) item-set collection and its GOTO graph (§4.4).
#[derive(Debug)]
pub struct LrMachine {
  pub states: Vec<LrState>,
  pub start_state: usize,
}

impl LrMachine {
  pub fn state(&self, idx: usize) -> &LrState {
    &self.states[idx]
  }
}

/// `closure(I)` (§4.4): while any item `[A -> α • B β]` with `B` a
/// nonterminal exists whose productions `B -> γ` are not yet present as
/// `[B -> • γ]`, add them.
pub fn closure(items: &ItemSet, g: &Grammar) -> ItemSet {
  let mut result: ItemSet = items.clone();
  let mut queue: VecDeque<Item> = items.iter().copied().collect();

  while let Some(item) = queue.pop_front() {
    if let Some(sym) = item.symbol_after_dot(g) {
      if g.is_nonterminal(sym) {
        for &pid in g.productions_of(sym) {
          let new_item = Item::start(pid);
          if result.insert(new_item) {
            queue.push_back(new_item);
          }
        }
      }
    }
  }

  result
}

/// `goto(I, X)` (§4.4): closure of the items advanced over `X`.
pub fn goto(closure_of_i: &ItemSet, x: SymbolId, g: &Grammar) -> ItemSet {
  let advanced: ItemSet = closure_of_i
    .iter()
    .filter(|item| item.symbol_after_dot(g) == Some(x))
    .map(|item| item.advance())
    .collect();
  closure(&advanced, g)
}

/// Builds the canonical LR(0) collection via breadth-first discovery,
/// deduplicating states by their kernel (§4.4 "keying each new state by its
/// canonical kernel").
pub fn build(g: &Grammar, journal: &mut Journal) -> LrMachine {
  let start_kernel: ItemSet = [Item::start(g.augmented_production)].into_iter().collect();
  let start_closure = closure(&start_kernel, g);

  let mut states = vec![LrState { kernel: start_kernel.clone(), closure: start_closure, transitions: BTreeMap::new() }];
  let mut kernel_to_index: BTreeMap<ItemSet, usize> = [(start_kernel, 0)].into_iter().collect();
  let mut queue: VecDeque<usize> = [0].into_iter().collect();

  while let Some(state_idx) = queue.pop_front() {
    let closure_set = states[state_idx].closure.clone();

    // Every symbol that appears immediately after a dot in this state's
    // closure induces a transition.
    let mut symbols: BTreeSet<SymbolId> = BTreeSet::new();
    for item in &closure_set {
      if let Some(sym) = item.symbol_after_dot(g) {
        symbols.insert(sym);
      }
    }

    for sym in symbols {
      let next_closure = goto(&closure_set, sym, g);
      if next_closure.is_empty() {
        continue;
      }
      let next_kernel: ItemSet = next_closure.iter().filter(|item| item.dot > 0 || g.production(item.production).is_epsilon()).copied().collect();

      let next_idx = match kernel_to_index.get(&next_kernel) {
        Some(&idx) => idx,
        None => {
          let idx = states.len();
          states.push(LrState { kernel: next_kernel.clone(), closure: next_closure, transitions: BTreeMap::new() });
          kernel_to_index.insert(next_kernel, idx);
          queue.push_back(idx);
          idx
        }
      };

      states[state_idx].transitions.insert(sym, next_idx);
    }
  }

  journal.info(ReportPhase::Lr0Construction, format!("LR(0) machine built: {} states", states.len()));
  LrMachine { states, start_state: 0 }
}
