use std::fmt::{self, Display};

/// Stable index of a [`Symbol`] within a [`crate::Grammar`] (§3 "Symbol").
/// Symbols are referenced by index everywhere else in the pipeline rather
/// than by name, following the teacher's `ProductionId`/`SymbolID`
/// convention of indexed, `Copy` handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl Display for SymbolId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
  Terminal,
  NonTerminal,
}

/// A terminal or nonterminal, identified by name (§3 "Symbol").
///
/// The reserved `error` terminal and the synthetic `$end` terminal are
/// ordinary `Terminal` symbols with reserved names; they are not special
/// cased in this struct, only in the grammar builder that creates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
  pub id: SymbolId,
  pub name: String,
  pub kind: SymbolKind,
  /// Set for terminals that were placed in a `%prec`/precedence-level
  /// declaration (§4.1 `add_precedence_level`).
  pub precedence: Option<Precedence>,
}

impl Symbol {
  pub fn is_terminal(&self) -> bool {
    self.kind == SymbolKind::Terminal
  }

  pub fn is_nonterminal(&self) -> bool {
    self.kind == SymbolKind::NonTerminal
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
  Left,
  Right,
  NonAssoc,
}

/// A precedence level is a (level, associativity) pair. Lower `level` means
/// lower precedence, per §4.1: "precedence levels are linearly ordered by
/// declaration (lower index = lower precedence)".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Precedence {
  pub level: u32,
  pub assoc: Associativity,
}
