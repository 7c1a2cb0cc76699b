use super::production::ActionId;
use std::collections::HashMap;

/// A (name, pattern, optional action) triple (§3 "Token rule").
///
/// Names starting with `ignore_` mark a rule whose successful match is
/// silently dropped (§4.2 "Ignored-token handling"); the action, if any,
/// still fires — this is how line tracking hooks onto a newline rule.
#[derive(Debug, Clone)]
pub struct TokenRule {
  pub name: String,
  pub pattern: String,
  pub action: Option<ActionId>,
  /// Maps a matched literal value (e.g. `"if"`) to the token kind it should
  /// be remapped to (e.g. `"IF"`) — §3 "Keyword remap".
  pub remap: HashMap<String, String>,
  /// Declaration order; defines match priority when patterns overlap. A
  /// rule that only attaches an action to an already-declared string
  /// pattern keeps that pattern's original order (§3 "insertion order").
  pub order: usize,
}

impl TokenRule {
  pub fn is_ignored(&self) -> bool {
    self.name.starts_with("ignore_")
  }
}
