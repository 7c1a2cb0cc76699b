//! Demo front end over the bundled calculator grammar: `radlr parse <expr>`
//! evaluates an expression, `radlr dump` builds the grammar and prints the
//! build-time diagnostics log (§6 "Diagnostic outputs").

use clap::{Parser as ClapParser, Subcommand};
use radlr::{Journal, ParserBuilder, RadlrResult, Token};
use radlr_core::Associativity;

#[derive(ClapParser)]
#[command(name = "radlr", version, about = "A small LALR(1) parser/lexer generator")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Evaluate an arithmetic expression with the bundled calculator grammar.
  Parse {
    expression: String,
  },
  /// Build the calculator grammar and print its diagnostics log.
  Dump,
}

/// The calculator's semantic value: every reduction folds down to a single
/// floating-point result (§8 scenario 1).
#[derive(Clone, Copy, Debug, Default)]
struct Value(f64);

impl From<Token> for Value {
  fn from(token: Token) -> Self {
    Value(token.value.parse().unwrap_or(0.0))
  }
}

fn build_calculator(journal: &mut Journal) -> RadlrResult<radlr::Parser<(), Value>> {
  let mut builder: ParserBuilder<(), Value> = ParserBuilder::new();

  builder.ignore(" \t\r\n");
  builder.token("NUMBER", r"\d+(\.\d+)?");
  builder.literals("+-*/()");

  builder.add_precedence_level(Associativity::Left, &["+", "-"]);
  builder.add_precedence_level(Associativity::Left, &["*", "/"]);

  builder.set_start("expr");

  builder.rule("expr", "expr '+' expr", None, |_, p| Value(p.nth(1).0 + p.nth(3).0));
  builder.rule("expr", "expr '-' expr", None, |_, p| Value(p.nth(1).0 - p.nth(3).0));
  builder.rule("expr", "expr '*' expr", None, |_, p| Value(p.nth(1).0 * p.nth(3).0));
  builder.rule("expr", "expr '/' expr", None, |_, p| Value(p.nth(1).0 / p.nth(3).0));
  builder.rule("expr", "'(' expr ')'", None, |_, p| *p.nth(2));
  builder.rule("expr", "NUMBER", None, |_, p| *p.nth(1));

  builder.build(journal)
}

fn main() {
  let cli = Cli::parse();
  let mut journal = Journal::new();

  match cli.command {
    Command::Parse { expression } => match build_calculator(&mut journal) {
      Ok(parser) => match parser.parse(&expression, &mut ()) {
        Ok(value) => println!("{}", value.0),
        Err(e) => {
          eprintln!("{e}");
          std::process::exit(1);
        }
      },
      Err(e) => {
        eprintln!("{e}");
        std::process::exit(1);
      }
    },
    Command::Dump => {
      if let Err(e) = build_calculator(&mut journal) {
        eprintln!("{e}");
        std::process::exit(1);
      }
      print!("{}", journal.render());
    }
  }
}
