use super::ebnf;
use crate::journal::{Journal, ReportPhase};
use crate::types::{ActionId, Associativity, Precedence, Production, ProductionId, Symbol, SymbolId, SymbolKind};
use radlr_rust_runtime::types::{constants, RadlrError, RadlrResult, Token};
use std::collections::{HashMap, HashSet, VecDeque};

/// The frozen, immutable grammar (§3 "Lifecycles": "built once ... and
/// immutable thereafter"). Produced by [`GrammarBuilder::freeze`].
#[derive(Debug)]
pub struct Grammar {
  pub symbols: Vec<Symbol>,
  name_to_symbol: HashMap<String, SymbolId>,
  pub productions: Vec<Production>,
  productions_by_lhs: HashMap<SymbolId, Vec<ProductionId>>,
  pub start: SymbolId,
  pub augmented_start: SymbolId,
  pub augmented_production: ProductionId,
  pub end_symbol: SymbolId,
  pub error_symbol: SymbolId,
  pub precedence_levels: Vec<(Associativity, Vec<SymbolId>)>,
}

impl Grammar {
  pub fn symbol(&self, id: SymbolId) -> &Symbol {
    &self.symbols[id.index()]
  }

  pub fn symbol_named(&self, name: &str) -> Option<SymbolId> {
    self.name_to_symbol.get(name).copied()
  }

  pub fn production(&self, id: ProductionId) -> &Production {
    &self.productions[id.index()]
  }

  pub fn productions_of(&self, lhs: SymbolId) -> &[ProductionId] {
    self.productions_by_lhs.get(&lhs).map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn is_nonterminal(&self, id: SymbolId) -> bool {
    self.symbol(id).is_nonterminal()
  }
}

struct PendingProduction {
  lhs: String,
  rhs: String,
  action: Option<ActionId>,
  prec_override: Option<String>,
  source: Option<Token>,
}

/// Builds a grammar incrementally from the abstract declaration shape of §6.
/// Every `add_*` method returns a stable index immediately; validation is
/// deferred to [`GrammarBuilder::freeze`] (§4.1).
pub struct GrammarBuilder {
  symbols: Vec<Symbol>,
  name_to_symbol: HashMap<String, SymbolId>,
  pending: Vec<PendingProduction>,
  start_name: Option<String>,
  precedence_levels: Vec<(Associativity, Vec<String>)>,
  helper_counter: u32,
  end_symbol: SymbolId,
  error_symbol: SymbolId,
}

impl Default for GrammarBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl GrammarBuilder {
  pub fn new() -> Self {
    let mut symbols = vec![];
    let mut name_to_symbol = HashMap::new();

    let mut register = |symbols: &mut Vec<Symbol>, name_to_symbol: &mut HashMap<String, SymbolId>, name: &str| -> SymbolId {
      let id = SymbolId(symbols.len() as u32);
      symbols.push(Symbol { id, name: name.to_string(), kind: SymbolKind::Terminal, precedence: None });
      name_to_symbol.insert(name.to_string(), id);
      id
    };

    let end_symbol = register(&mut symbols, &mut name_to_symbol, constants::END_OF_INPUT);
    let error_symbol = register(&mut symbols, &mut name_to_symbol, constants::ERROR_SYMBOL);

    Self {
      symbols,
      name_to_symbol,
      pending: vec![],
      start_name: None,
      precedence_levels: vec![],
      helper_counter: 0,
      end_symbol,
      error_symbol,
    }
  }

  pub fn end_symbol(&self) -> SymbolId {
    self.end_symbol
  }

  pub fn error_symbol(&self) -> SymbolId {
    self.error_symbol
  }

  pub fn add_terminal(&mut self, name: &str) -> SymbolId {
    self.intern(name, SymbolKind::Terminal)
  }

  pub fn add_nonterminal(&mut self, name: &str) -> SymbolId {
    self.intern(name, SymbolKind::NonTerminal)
  }

  fn intern(&mut self, name: &str, kind: SymbolKind) -> SymbolId {
    if let Some(id) = self.name_to_symbol.get(name) {
      return *id;
    }
    let id = SymbolId(self.symbols.len() as u32);
    self.symbols.push(Symbol { id, name: name.to_string(), kind, precedence: None });
    self.name_to_symbol.insert(name.to_string(), id);
    id
  }

  pub fn set_start(&mut self, nonterminal: &str) {
    self.start_name = Some(nonterminal.to_string());
  }

  /// Declares a precedence level, lowest to highest across successive
  /// calls (§4.1).
  pub fn add_precedence_level(&mut self, assoc: Associativity, terminals: &[&str]) {
    self.precedence_levels.push((assoc, terminals.iter().map(|s| s.to_string()).collect()));
  }

  /// Declares a production using the rhs symbol-string syntax of §6,
  /// including the `[ ]` / `{ }` / `|` extensions. A single declaration may
  /// expand into several concrete productions (e.g. an optional group
  /// expands into a with- and a without-variant); their `ProductionId`s are
  /// only known once [`GrammarBuilder::freeze`] runs, since EBNF expansion
  /// and helper-nonterminal synthesis happen there.
  pub fn add_production(&mut self, lhs: &str, rhs: &str, action: Option<ActionId>, prec_override: Option<&str>, source: Option<Token>) {
    self.add_nonterminal(lhs);
    self.pending.push(PendingProduction { lhs: lhs.to_string(), rhs: rhs.to_string(), action, prec_override: prec_override.map(str::to_string), source });
  }

  /// Validates and compiles the declared grammar (§4.1). Performs EBNF
  /// expansion, resolves `%prec` overrides and rightmost-terminal
  /// precedence, synthesizes the augmented start production `S' -> S $end`,
  /// and assigns stable `ProductionId`s in declaration order (helper
  /// nonterminals from EBNF expansion are appended after all user
  /// productions, so user-declared indices are stable regardless of how
  /// many helpers a later production needs).
  pub fn freeze(mut self, journal: &mut Journal) -> RadlrResult<Grammar> {
    let mut errors = vec![];

    let start_name = match self.start_name.clone() {
      Some(s) => s,
      None => self
        .pending
        .first()
        .map(|p| p.lhs.clone())
        .ok_or_else(|| RadlrError::build("grammar has no productions; cannot infer a start symbol"))?,
    };
    let start = self.add_nonterminal(&start_name);
    if !self.symbol(start).is_nonterminal() {
      errors.push(RadlrError::build_on("start symbol must be a nonterminal", &start_name));
    }

    // Precedence table: resolve terminal names now that every terminal used
    // in a precedence declaration must already be known. Declaring a
    // precedence for an unknown name auto-declares it as a terminal, which
    // mirrors how a grammar's `%token`/precedence lines typically precede
    // any production referencing them.
    let mut precedence_levels = vec![];
    for (level, (assoc, names)) in self.precedence_levels.clone().into_iter().enumerate() {
      let mut ids = vec![];
      for name in &names {
        let id = self.add_terminal(name);
        self.symbols[id.index()].precedence = Some(Precedence { level: level as u32, assoc });
        ids.push(id);
      }
      precedence_levels.push((assoc, ids));
    }

    // Expand every pending production's rhs string into plain symbol-name
    // sequences, collecting any helper productions EBNF expansion needs.
    struct Flat {
      lhs: String,
      names: Vec<String>,
      action: Option<ActionId>,
      prec_override: Option<String>,
      source: Option<Token>,
    }
    let mut flat = vec![];
    let mut helper_productions: Vec<ebnf::HelperProduction> = vec![];

    for p in &self.pending {
      if constants::is_reserved_symbol_name(&p.lhs) {
        errors.push(RadlrError::build_on("production lhs may not use a reserved symbol name", &p.lhs));
        continue;
      }
      match ebnf::parse_rhs(&p.rhs) {
        Ok(elems) => {
          let helper_counter = &mut self.helper_counter;
          let mut gen = move || {
            *helper_counter += 1;
            format!("__{}", *helper_counter)
          };
          let mut my_helpers = vec![];
          let seqs = ebnf::expand(&elems, &mut gen, &mut my_helpers, p.action);
          helper_productions.extend(my_helpers);
          for names in seqs {
            flat.push(Flat { lhs: p.lhs.clone(), names, action: p.action, prec_override: p.prec_override.clone(), source: p.source.clone() });
          }
        }
        Err(msg) => errors.push(RadlrError::build_on(format!("malformed rhs: {msg}"), &p.rhs)),
      }
    }
    for h in helper_productions {
      for names in h.alts {
        flat.push(Flat { lhs: h.lhs.clone(), names, action: h.action, prec_override: None, source: None });
      }
    }

    // Resolve every symbol name now that all productions (including
    // helpers) have declared their nonterminals.
    for f in &flat {
      self.add_nonterminal(&f.lhs);
    }

    let mut productions = vec![];
    for f in flat {
      let lhs = self.resolve_symbol(&f.lhs, true);
      let mut rhs = vec![];
      let mut rhs_names = vec![];
      let mut rightmost_terminal_prec = None;
      let mut ok = true;
      for name in &f.names {
        match self.resolve_rhs_symbol(name) {
          Some(id) => {
            if self.symbol(id).is_terminal() {
              if let Some(prec) = self.symbol(id).precedence {
                rightmost_terminal_prec = Some(prec);
              }
            }
            rhs.push(id);
            rhs_names.push(self.symbol(id).name.clone());
          }
          None => {
            errors.push(RadlrError::build_on("undeclared symbol referenced in production rhs", name));
            ok = false;
          }
        }
      }
      if !ok {
        continue;
      }

      let precedence = match &f.prec_override {
        Some(tag) => match self.resolve_symbol(tag, false).and_then(|id| self.symbol(id).precedence) {
          Some(p) => Some(p),
          None => {
            errors.push(RadlrError::build_on("`%prec` tag names an undeclared precedence", tag));
            None
          }
        },
        None => rightmost_terminal_prec,
      };

      let id = ProductionId(productions.len() as u32);
      productions.push(Production {
        id,
        lhs: lhs.unwrap_or(start),
        rhs,
        rhs_names,
        action: f.action,
        precedence,
        prec_override: f.prec_override,
        source: f.source,
      });
    }

    let mut productions_by_lhs: HashMap<SymbolId, Vec<ProductionId>> = HashMap::new();
    for p in &productions {
      productions_by_lhs.entry(p.lhs).or_default().push(p.id);
    }

    // Reachability (§7: an unreachable nonterminal is a fatal BuildError;
    // an unreachable production and an unused precedence level are reported
    // as warnings, not failures). BFS the production graph from `start`,
    // following every nonterminal a reachable production's rhs mentions.
    let mut reachable: HashSet<SymbolId> = HashSet::new();
    let mut queue: VecDeque<SymbolId> = [start].into_iter().collect();
    reachable.insert(start);
    while let Some(lhs) = queue.pop_front() {
      for pid in productions_by_lhs.get(&lhs).into_iter().flatten() {
        for &sym in &productions[pid.0 as usize].rhs {
          if self.symbol(sym).is_nonterminal() && reachable.insert(sym) {
            queue.push_back(sym);
          }
        }
      }
    }
    for (name, id) in &self.name_to_symbol {
      if *id != start && self.symbol(*id).is_nonterminal() && !reachable.contains(id) {
        errors.push(RadlrError::build_on("unreachable nonterminal", name));
      }
    }

    if !errors.is_empty() {
      journal.log_build_errors(&errors);
      return Err(RadlrError::Many { message: "grammar failed to freeze".into(), errors });
    }

    for p in &productions {
      if !reachable.contains(&p.lhs) {
        journal.log_warning(ReportPhase::GrammarFreeze, format!("production `{} -> {}` is never reached from the start symbol", self.symbol(p.lhs).name, p.rhs_names.join(" ")));
      }
    }
    for (_, ids) in &precedence_levels {
      for &id in ids {
        if !productions.iter().any(|p| p.rhs.contains(&id)) {
          journal.log_warning(ReportPhase::GrammarFreeze, format!("precedence level terminal `{}` is never used in a production's rhs", self.symbol(id).name));
        }
      }
    }

    // Synthesize the augmented start production S' -> S $end.
    let augmented_start = self.add_nonterminal("$start");
    let augmented_id = ProductionId(productions.len() as u32);
    productions.push(Production {
      id: augmented_id,
      lhs: augmented_start,
      rhs: vec![start, self.end_symbol],
      rhs_names: vec![self.symbol(start).name.clone(), constants::END_OF_INPUT.to_string()],
      action: None,
      precedence: None,
      prec_override: None,
      source: None,
    });
    productions_by_lhs.entry(augmented_start).or_default().push(augmented_id);

    journal.log_info(format!(
      "grammar frozen: {} symbols, {} productions (start = `{}`)",
      self.symbols.len(),
      productions.len(),
      start_name
    ));

    Ok(Grammar {
      symbols: self.symbols,
      name_to_symbol: self.name_to_symbol,
      productions,
      productions_by_lhs,
      start,
      augmented_start,
      augmented_production: augmented_id,
      end_symbol: self.end_symbol,
      error_symbol: self.error_symbol,
      precedence_levels,
    })
  }

  fn symbol(&self, id: SymbolId) -> &Symbol {
    &self.symbols[id.index()]
  }

  /// Resolves a name already known to the builder, without declaring it.
  fn resolve_symbol(&self, name: &str, _is_lhs: bool) -> Option<SymbolId> {
    self.name_to_symbol.get(name).copied()
  }

  /// Resolves an rhs token: a quoted literal (`'+'`), the reserved `error`
  /// name, an already-declared terminal/nonterminal, or (for a lowercase
  /// name not yet seen) a freshly declared nonterminal — a production's rhs
  /// may legally forward-reference a nonterminal declared by a later
  /// `add_production` call.
  fn resolve_rhs_symbol(&mut self, name: &str) -> Option<SymbolId> {
    if let Some(lit) = unquote(name) {
      return self.name_to_symbol.get(lit).copied();
    }
    if let Some(id) = self.name_to_symbol.get(name) {
      return Some(*id);
    }
    if name.chars().next().map(|c| c.is_lowercase()).unwrap_or(false) || name.starts_with("__") {
      return Some(self.add_nonterminal(name));
    }
    None
  }
}

fn unquote(name: &str) -> Option<&str> {
  let bytes = name.as_bytes();
  if bytes.len() >= 2 && (bytes[0] == b'\'' || bytes[0] == b'"') && bytes[bytes.len() - 1] == bytes[0] {
    Some(&name[1..name.len() - 1])
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn freeze_rejects_a_production_whose_lhs_is_the_synthesized_start_name() {
    let mut g = GrammarBuilder::new();
    g.add_production("$start", "NUMBER", None, None, None);
    let mut journal = Journal::new();
    assert!(g.freeze(&mut journal).is_err());
  }

  #[test]
  fn freeze_synthesizes_the_augmented_start_production() {
    let mut g = GrammarBuilder::new();
    g.add_terminal("NUMBER");
    g.add_production("expr", "NUMBER", None, None, None);
    let mut journal = Journal::new();
    let grammar = g.freeze(&mut journal).expect("grammar must freeze");
    let augmented = grammar.production(grammar.augmented_production);
    assert_eq!(augmented.rhs, vec![grammar.start, grammar.end_symbol]);
  }
}
