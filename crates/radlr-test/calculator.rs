//! §8 scenario 1 ("Calculator"): assignment stores a value, a bare
//! expression returns one, and the usual precedence/associativity rules
//! apply to the four binary operators plus unary minus.

use crate::common::{build_calculator, Ctx, Value};
use radlr::Journal;

#[test]
fn assignment_stores_the_value_and_yields_nothing() {
  let mut journal = Journal::new();
  let parser = build_calculator(&mut journal).expect("calculator grammar must build");
  let mut ctx = Ctx::default();

  let result = parser.parse("a = 3 + 4 * (5 + 6)", &mut ctx).expect("parse must succeed");
  assert_eq!(result, Value::Unit);
  assert_eq!(ctx.vars.get("a"), Some(&47.0));
}

#[test]
fn bare_expression_returns_its_value() {
  let mut journal = Journal::new();
  let parser = build_calculator(&mut journal).expect("calculator grammar must build");
  let mut ctx = Ctx::default();

  let result = parser.parse("3 + 4 * (5 + 6)", &mut ctx).expect("parse must succeed");
  assert_eq!(result.as_num(), 47.0);
}

#[test]
fn unary_minus_binds_tighter_than_binary_operators() {
  let mut journal = Journal::new();
  let parser = build_calculator(&mut journal).expect("calculator grammar must build");
  let mut ctx = Ctx::default();

  let result = parser.parse("-3 + 4", &mut ctx).expect("parse must succeed");
  assert_eq!(result.as_num(), 1.0);
}

#[test]
fn parenthesized_grouping_overrides_precedence() {
  let mut journal = Journal::new();
  let parser = build_calculator(&mut journal).expect("calculator grammar must build");
  let mut ctx = Ctx::default();

  let result = parser.parse("(3 + 4) * 2", &mut ctx).expect("parse must succeed");
  assert_eq!(result.as_num(), 14.0);
}

#[test]
fn assigned_variables_are_visible_to_later_expressions_in_the_same_context() {
  let mut journal = Journal::new();
  let parser = build_calculator(&mut journal).expect("calculator grammar must build");
  let mut ctx = Ctx::default();

  parser.parse("a = 10", &mut ctx).expect("parse must succeed");
  let result = parser.parse("a * 2", &mut ctx).expect("parse must succeed");
  assert_eq!(result.as_num(), 20.0);
}
