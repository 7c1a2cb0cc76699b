//! §8 scenario 6 ("Precedence disambiguation"): the same shift/reduce
//! conflict on `expr + expr + expr`, resolved two different ways depending
//! on the declared associativity of `+` (§4.6). Since `+` itself is
//! commutative, the test represents a parse as a fully parenthesized
//! expression string so left- versus right-grouping is actually observable
//! in the result rather than washed out by the arithmetic.

use radlr::{Journal, ParserBuilder, Token};
use radlr_core::Associativity;

#[derive(Clone, Debug, Default, PartialEq)]
struct Expr(String);

impl From<Token> for Expr {
  fn from(token: Token) -> Self {
    Expr(token.value)
  }
}

fn build(journal: &mut Journal, assoc: Associativity) -> radlr::Parser<(), Expr> {
  let mut builder: ParserBuilder<(), Expr> = ParserBuilder::new();

  builder.token("NUMBER", r"\d+");
  builder.literal('+');
  builder.add_precedence_level(assoc, &["+"]);
  builder.set_start("expr");

  builder.rule("expr", "expr '+' expr", None, |_, p| Expr(format!("({}+{})", p.nth(1).0, p.nth(3).0)));
  builder.rule_without_action("expr", "NUMBER", None);

  builder.build(journal).expect("grammar must build")
}

#[test]
fn left_precedence_reduces_before_shifting() {
  let mut journal = Journal::new();
  let parser = build(&mut journal, Associativity::Left);
  let mut ctx = ();

  let result = parser.parse("1+2+3", &mut ctx).expect("parse must succeed");
  assert_eq!(result.0, "(1+2)+3");
}

#[test]
fn right_precedence_shifts_before_reducing() {
  let mut journal = Journal::new();
  let parser = build(&mut journal, Associativity::Right);
  let mut ctx = ();

  let result = parser.parse("1+2+3", &mut ctx).expect("parse must succeed");
  assert_eq!(result.0, "1+(2+3)");
}
