//! §8 scenario 2 ("Parse error recovery") and the §7 recovery protocol more
//! generally.
//!
//! The literal scenario in spec.md borrows its numbers from SLY's own test
//! suite (`tests/test_parser.py::test_parse_error`), whose grammar has no
//! `error` production at all — SLY falls back to an undocumented
//! token-discard heuristic (an error-count-suppressed panic unwind) that
//! isn't part of the classical error-nonterminal protocol §7 actually
//! specifies. Since `original_source/` doesn't ship SLY's parser engine
//! (only its lexer), that heuristic isn't available to ground a faithful
//! reproduction of the exact "returns 9" outcome. Per DESIGN.md, this repo
//! implements §7's protocol literally — recovery requires a grammar
//! production that names the reserved `error` symbol — and these tests
//! verify *that* protocol instead of the borrowed numeric example.

use radlr::{Journal, ParserBuilder, RadlrResult};
use radlr_rust_runtime::types::Token;

use crate::common::{build_calculator, Ctx, Value};

/// With `statement : error` as the sole synchronization point, the error
/// token's only legal follower is `$end` (statement is the start symbol),
/// so recovery discards every remaining token. This still exercises the
/// error hook contract precisely: invoked exactly once, with the first
/// offending token.
#[test]
fn error_hook_fires_once_with_the_first_offending_token() {
  let mut journal = Journal::new();
  let parser = build_calculator(&mut journal).expect("calculator grammar must build");
  let mut ctx = Ctx::default();

  let result = parser.parse("a 123 4 + 5", &mut ctx).expect("a recovered parse still returns Ok");

  assert_eq!(ctx.error_hook_calls, vec![("NUMBER".to_string(), "123".to_string())]);
  assert_eq!(result, Value::Unit);
}

#[test]
fn error_hook_receives_none_when_the_error_is_at_end_of_input() {
  let mut journal = Journal::new();
  let parser = build_calculator(&mut journal).expect("calculator grammar must build");
  let mut ctx = Ctx::default();

  // `a =` is a valid prefix of `ID '=' expr` with nothing left to supply
  // the right-hand side: the error is discovered at `$end`.
  let _ = parser.parse("a =", &mut ctx);

  assert_eq!(ctx.error_hook_calls, vec![("$end".to_string(), String::new())]);
}

/// A grammar where the synchronizing production is `stmt : error ';'`
/// inside a repeated list (`{ stmt }`): once the bad token is discarded and
/// `;` is shifted, parsing resumes normally for the remaining statements —
/// demonstrating that recovery is a genuine resynchronization, not just a
/// way to swallow the rest of the input.
///
/// Note what recovery does to the statement immediately *before* the bad
/// token: `ID ';'` only reduces once the lookahead following it is checked
/// against that reduction's LALR lookahead set (§4.7 step 1), and `!` isn't
/// in it (nothing in this grammar ever follows `!`). So the error surfaces
/// while `a`'s `ID` and `;` are still unreduced values on the stack, and
/// popping back to the nearest `error`-shiftable state (§7 step 1) discards
/// both along with the states that held them — `a` never completes its
/// reduction and is lost, same as any other partially built construct above
/// the state recovery rewinds to.
#[derive(Clone, Debug, Default, PartialEq)]
struct Collected(Vec<String>);

impl From<Token> for Collected {
  fn from(token: Token) -> Self {
    if &*token.kind == "ID" {
      Collected(vec![token.value])
    } else {
      Collected(vec![])
    }
  }
}

fn build_statement_list(journal: &mut Journal) -> RadlrResult<radlr::Parser<Vec<String>, Collected>> {
  let mut builder: ParserBuilder<Vec<String>, Collected> = ParserBuilder::new();

  builder.ignore(" \t\n");
  builder.token("ID", r"[A-Za-z_][A-Za-z0-9_]*");
  builder.literals(";!");

  builder.set_start("stmts");

  builder.rule("stmts", "{ stmt }", None, |ctx, p| {
    for v in p.into_values() {
      ctx.extend(v.0);
    }
    Collected(vec![])
  });
  builder.rule("stmt", "ID ';'", None, |_, p| p.nth(1).clone());
  builder.rule_without_action("stmt", "error ';'", None);

  builder.build(journal)
}

#[test]
fn recovery_resumes_parsing_the_remainder_of_a_statement_list() {
  let mut journal = Journal::new();
  let parser = build_statement_list(&mut journal).expect("statement-list grammar must build");
  let mut collected: Vec<String> = vec![];

  // `!` cannot start a `stmt`; recovery discards exactly that one token
  // (the following `;` is immediately legal in the post-error state) and
  // parsing continues with `b ;` as an ordinary statement.
  parser.parse("a ; ! ; b ;", &mut collected).expect("recovered parse still returns Ok");

  assert_eq!(collected, vec!["b".to_string()]);
}
