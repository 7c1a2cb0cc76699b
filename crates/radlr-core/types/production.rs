use super::symbol::{Precedence, SymbolId};
use radlr_rust_runtime::types::Token;

/// Stable index of a [`Production`] within a [`crate::Grammar`] (§3
/// "Production"). Productions are declared in order and this index never
/// changes once `freeze()` succeeds, which is what makes reduce/reduce
/// resolution ("keep the production with the lower index") well defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionId(pub(crate) u32);

impl ProductionId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// An opaque reference to a user-supplied semantic action. `radlr_core`
/// never holds the action itself — only this index — so that the grammar
/// model stays independent of whatever semantic-value type an embedder
/// chooses. The `radlr` crate's `ParserBuilder` owns the `Vec<Action<V>>`
/// this index is keyed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(pub u32);

/// A production (§3 "Production"): `lhs -> rhs`, with a precedence
/// inherited from its rightmost terminal unless overridden, a stable index,
/// and a source location for diagnostics.
#[derive(Debug, Clone)]
pub struct Production {
  pub id: ProductionId,
  pub lhs: SymbolId,
  pub rhs: Vec<SymbolId>,
  /// Name used to resolve `P.name` for each rhs position, in declaration
  /// order; duplicates are disambiguated by the caller into `name0`,
  /// `name1`, … (see `radlr::value::ProductionArgs`).
  pub rhs_names: Vec<String>,
  pub action: Option<ActionId>,
  /// Resolved at freeze time: the rightmost terminal's precedence, or the
  /// `%prec` override's precedence if one was given.
  pub precedence: Option<Precedence>,
  /// The raw `%prec NAME` tag, kept around for diagnostics even after
  /// `precedence` has been resolved.
  pub prec_override: Option<String>,
  pub source: Option<Token>,
}

impl Production {
  pub fn rhs_len(&self) -> usize {
    self.rhs.len()
  }

  pub fn is_epsilon(&self) -> bool {
    self.rhs.is_empty()
  }
}
