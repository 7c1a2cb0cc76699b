//! §8 scenario 3 ("Keyword remap"): a single `ID` rule whose matched value
//! is remapped onto a different token kind for reserved words, without
//! needing a dedicated regex per keyword.

use radlr::LexerBuilder;
use radlr_core::ScannerBuilder;
use std::collections::HashSet;

#[test]
fn reserved_words_are_remapped_to_their_own_token_kind() {
  let mut builder: LexerBuilder<()> = LexerBuilder::new();
  builder.ignore(" \t");
  builder.token("NUMBER", r"\d+");
  let id = builder.token("ID", r"[A-Za-z_][A-Za-z0-9_]*");
  builder.remap(id, "if", "IF");
  builder.remap(id, "else", "ELSE");

  let lexer = builder.build().expect("lexer must build");
  let mut stream = lexer.tokenize("abc if else 123");
  let mut ctx = ();

  let kinds: Vec<String> = std::iter::from_fn(|| stream.next_token(&mut ctx)).map(|r| r.unwrap().kind.to_string()).collect();

  assert_eq!(kinds, vec!["ID", "IF", "ELSE", "NUMBER"]);
}

#[test]
fn remap_only_applies_to_the_exact_matched_value() {
  let mut builder: LexerBuilder<()> = LexerBuilder::new();
  builder.ignore(" \t");
  let id = builder.token("ID", r"[A-Za-z_][A-Za-z0-9_]*");
  builder.remap(id, "if", "IF");

  let lexer = builder.build().expect("lexer must build");
  let mut stream = lexer.tokenize("iffy if iffier");
  let mut ctx = ();

  let kinds: Vec<String> = std::iter::from_fn(|| stream.next_token(&mut ctx)).map(|r| r.unwrap().kind.to_string()).collect();

  // "iffy" and "iffier" are still plain IDs; only the exact value "if" is remapped.
  assert_eq!(kinds, vec!["ID", "IF", "ID"]);
}

/// `radlr::LexerBuilder::remap` auto-declares its target as a known kind
/// (the same way `ParserBuilder::remap` auto-declares it as a grammar
/// terminal) — a remap call is itself how a keyword like `IF` gets
/// declared, since it never has a scan rule of its own. The validation
/// §4.2 requires only rejects a target nobody declared *at all*, which is
/// only observable at the `radlr_core` scanner-compiler layer the facade
/// builds on.
#[test]
fn undeclared_remap_target_is_a_build_error() {
  let mut builder = ScannerBuilder::new();
  let id = builder.add_rule("ID", r"[A-Za-z_][A-Za-z0-9_]*", None);
  builder.add_remap(id, "if", "IF_KEYWORD_NEVER_DECLARED");

  let known_kinds: HashSet<String> = ["ID".to_string()].into_iter().collect();
  assert!(builder.build(&known_kinds).is_err());
}
