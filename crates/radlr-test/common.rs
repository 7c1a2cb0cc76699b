//! Shared fixtures for the calculator-family scenarios (§8 scenarios 1–2):
//! one grammar, reused by the happy-path test and the recovery test so both
//! exercise the exact same tables.

use radlr::{Journal, Parser, ParserBuilder, RadlrResult, Token};
use radlr_core::Associativity;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  Num(f64),
  Ident(String),
  Unit,
}

impl Default for Value {
  fn default() -> Self {
    Value::Unit
  }
}

impl Value {
  pub fn as_num(&self) -> f64 {
    match self {
      Value::Num(n) => *n,
      _ => 0.0,
    }
  }

  pub fn as_ident(&self) -> &str {
    match self {
      Value::Ident(s) => s,
      _ => "",
    }
  }
}

impl From<Token> for Value {
  fn from(token: Token) -> Self {
    match &*token.kind {
      "NUMBER" => Value::Num(token.value.parse().unwrap_or(0.0)),
      "ID" => Value::Ident(token.value),
      _ => Value::Unit,
    }
  }
}

/// Scanner-side state is unused here (the calculator has no `ignore_`
/// action); parser-side state is a variable table plus a record of every
/// `error(tok)` hook invocation, for the recovery test to inspect.
#[derive(Default)]
pub struct Ctx {
  pub vars: HashMap<String, f64>,
  pub error_hook_calls: Vec<(String, String)>,
}

/// Builds the §8 scenario 1/2 grammar: `statement: ID = expr | expr | error`,
/// the usual four binary operators plus unary minus at `%prec UMINUS`. The
/// `statement: error` alternative is the synchronization point §7 requires
/// before error recovery can do anything at all — nothing in the compressed
/// scenario text spells out that production, but without it `ACTION[_, error]`
/// is never a shift anywhere and recovery always fails on the first attempt.
pub fn build_calculator(journal: &mut Journal) -> RadlrResult<Parser<Ctx, Value>> {
  let mut builder: ParserBuilder<Ctx, Value> = ParserBuilder::new();

  builder.ignore(" \t");
  builder.token("ID", r"[A-Za-z_][A-Za-z0-9_]*");
  builder.token("NUMBER", r"\d+(\.\d+)?");
  builder.literals("=+-*/()");

  builder.add_precedence_level(Associativity::Left, &["+", "-"]);
  builder.add_precedence_level(Associativity::Left, &["*", "/"]);
  builder.add_precedence_level(Associativity::Right, &["UMINUS"]);

  builder.set_start("statement");
  builder.on_parse_error(|ctx, tok| {
    let entry = match tok {
      Some(t) => (t.kind.to_string(), t.value.clone()),
      None => ("$end".to_string(), String::new()),
    };
    ctx.error_hook_calls.push(entry);
  });

  builder.rule("statement", "ID '=' expr", None, |ctx, p| {
    ctx.vars.insert(p.nth(1).as_ident().to_string(), p.nth(3).as_num());
    Value::Unit
  });
  builder.rule_without_action("statement", "expr", None);
  builder.rule_without_action("statement", "error", None);

  builder.rule("expr", "expr '+' expr", None, |_, p| Value::Num(p.nth(1).as_num() + p.nth(3).as_num()));
  builder.rule("expr", "expr '-' expr", None, |_, p| Value::Num(p.nth(1).as_num() - p.nth(3).as_num()));
  builder.rule("expr", "expr '*' expr", None, |_, p| Value::Num(p.nth(1).as_num() * p.nth(3).as_num()));
  builder.rule("expr", "expr '/' expr", None, |_, p| Value::Num(p.nth(1).as_num() / p.nth(3).as_num()));
  builder.rule("expr", "'-' expr", Some("UMINUS"), |_, p| Value::Num(-p.nth(2).as_num()));
  builder.rule("expr", "'(' expr ')'", None, |_, p| p.nth(2).clone());
  builder.rule_without_action("expr", "NUMBER", None);
  builder.rule("expr", "ID", None, |ctx, p| Value::Num(*ctx.vars.get(p.nth(1).as_ident()).unwrap_or(&0.0)));

  builder.build(journal)
}
