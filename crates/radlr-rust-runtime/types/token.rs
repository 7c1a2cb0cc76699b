use std::fmt::{self, Display};
use std::sync::Arc;

/// A token kind is whatever name the grammar gave the rule that produced it:
/// an uppercase token name (`NUMBER`), a single-character literal (`+`), or
/// one of the reserved markers [`END_OF_INPUT`]/[`ERROR_SYMBOL`].
///
/// Kinds are interned as `Arc<str>` rather than a bare index because the
/// scanner and the parse driver live in different crates and neither owns a
/// canonical symbol table at run time; cloning a `Token` should be cheap
/// regardless.
pub type TokenKind = Arc<str>;

/// A single lexeme produced by the scanner engine (§3 "Token", §4.3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub value: String,
  /// 1-based source line, updated by ignore-action hooks as described in
  /// §4.3's ordering guarantee.
  pub line: u32,
  /// 0-based byte offset of the first byte of `value` in the original text.
  pub byte_index: usize,
}

impl Token {
  pub fn new(kind: impl Into<TokenKind>, value: impl Into<String>, line: u32, byte_index: usize) -> Self {
    Self { kind: kind.into(), value: value.into(), line, byte_index }
  }

  /// The synthetic token the driver manufactures for the `$end` lookahead.
  pub fn end_of_input(line: u32, byte_index: usize) -> Self {
    Self::new(END_OF_INPUT, "", line, byte_index)
  }

  pub fn is_end_of_input(&self) -> bool {
    &*self.kind == END_OF_INPUT
  }
}

impl Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}({:?})@{}:{}", self.kind, self.value, self.line, self.byte_index)
  }
}

use crate::types::constants::END_OF_INPUT;
