//! §8 scenario 5 ("EBNF expansion"): `expr : term { (PLUS|MINUS) term }`
//! expands (§6) into `expr -> term helper` plus a left-recursive helper
//! nonterminal `helper : ε | helper '+' term | helper '-' term`, with the
//! declaring production's action threaded into the top-level alternative
//! *and* every helper alternative (including the epsilon base case) so a
//! hand-written fold and the synthesized one behave identically.
//!
//! Because one action closure backs every one of those alternatives, it has
//! to branch on how many values it was popped with: zero (the empty
//! repetition, contributing nothing), three (one more `op term` step folded
//! onto the running total), or two (the top-level `term helper` combining
//! the seed with whatever the helper accumulated).

use radlr::{Journal, ParserBuilder, ProductionArgs, Token};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Num(i64);

impl From<Token> for Num {
  fn from(token: Token) -> Self {
    Num(token.value.parse().unwrap_or(0))
  }
}

fn fold_step(_ctx: &mut (), p: &ProductionArgs<Num>) -> Num {
  match p.len() {
    0 => Num(0),
    2 => Num(p.nth(1).0 + p.nth(2).0),
    3 => {
      if p.nth(2).0 == 1 {
        Num(p.nth(1).0 + p.nth(3).0)
      } else {
        Num(p.nth(1).0 - p.nth(3).0)
      }
    }
    n => panic!("unexpected arity {n} for the threaded repeat action"),
  }
}

fn build(journal: &mut Journal) -> radlr::Parser<(), Num> {
  let mut builder: ParserBuilder<(), Num> = ParserBuilder::new();

  builder.token("NUMBER", r"\d+");
  builder.literals("+-");
  builder.set_start("expr");

  builder.rule("term", "NUMBER", None, |_, p| *p.nth(1));
  // The op token contributes +1/-1 to the fold so `fold_step` can tell
  // which operator fired without pattern-matching a `Token` directly.
  builder.rule("op", "'+'", None, |_, _| Num(1));
  builder.rule("op", "'-'", None, |_, _| Num(-1));
  builder.rule("expr", "term { op term }", None, fold_step);

  builder.build(journal).expect("grammar must build")
}

#[test]
fn repeated_group_folds_left_associatively() {
  let mut journal = Journal::new();
  let parser = build(&mut journal);
  let mut ctx = ();

  assert_eq!(parser.parse("1+2-3", &mut ctx).expect("parse must succeed"), Num(0));
  assert_eq!(parser.parse("10-2-3", &mut ctx).expect("parse must succeed"), Num(5));
}

/// The synthesized helper is only reachable through the production that
/// declared it, and accepting zero repetitions exercises its epsilon base
/// case on its own.
#[test]
fn repeat_accepts_zero_repetitions() {
  let mut journal = Journal::new();
  let parser = build(&mut journal);
  let mut ctx = ();

  assert_eq!(parser.parse("7", &mut ctx).expect("parse must succeed"), Num(7));
}
