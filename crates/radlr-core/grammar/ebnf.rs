//! Parses the rhs symbol-string syntax of §6 ("whitespace-separated
//! symbols" plus the `[ X ]` / `{ X }` / `X|Y` extensions) and expands it,
//! at freeze time, into plain BNF productions.
//!
//! This is the one place spec.md explicitly leaves unspecified ("the
//! implementation that generates helper nonterminals is not shown here; the
//! rewrite must define expansion precisely as given in §6") — see
//! `DESIGN.md` for the chosen semantics.

#[derive(Debug, Clone)]
pub enum RhsElem {
  Sym(String),
  /// `( A B | C )` — a required group; exactly one alternative is chosen.
  Group(Vec<Vec<RhsElem>>),
  /// `[ A B | C ]` — the group, or nothing.
  Optional(Vec<Vec<RhsElem>>),
  /// `{ A B | C }` — the group, zero or more times.
  Repeat(Vec<Vec<RhsElem>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexeme {
  LBracket,
  RBracket,
  LBrace,
  RBrace,
  LParen,
  RParen,
  Pipe,
  Word(String),
}

fn lex(rhs: &str) -> Vec<Lexeme> {
  let mut out = vec![];
  let mut chars = rhs.chars().peekable();
  let mut word = String::new();
  macro_rules! flush {
    () => {
      if !word.is_empty() {
        out.push(Lexeme::Word(std::mem::take(&mut word)));
      }
    };
  }
  while let Some(c) = chars.next() {
    match c {
      '[' => {
        flush!();
        out.push(Lexeme::LBracket);
      }
      ']' => {
        flush!();
        out.push(Lexeme::RBracket);
      }
      '{' => {
        flush!();
        out.push(Lexeme::LBrace);
      }
      '}' => {
        flush!();
        out.push(Lexeme::RBrace);
      }
      '(' => {
        flush!();
        out.push(Lexeme::LParen);
      }
      ')' => {
        flush!();
        out.push(Lexeme::RParen);
      }
      '|' => {
        flush!();
        out.push(Lexeme::Pipe);
      }
      c if c.is_whitespace() => flush!(),
      '\'' | '"' => {
        // a quoted literal terminal: keep the quotes as part of the word so
        // the caller can tell "a literal" from an identifier.
        word.push(c);
        for next in chars.by_ref() {
          word.push(next);
          if next == c {
            break;
          }
        }
      }
      c => word.push(c),
    }
  }
  flush!();
  out
}

pub fn parse_rhs(rhs: &str) -> Result<Vec<RhsElem>, String> {
  let toks = lex(rhs);
  let mut pos = 0;
  let seq = parse_sequence(&toks, &mut pos, None)?;
  if pos != toks.len() {
    return Err(format!("unexpected token at position {pos} in rhs `{rhs}`"));
  }
  Ok(seq)
}

/// Parses a sequence of elements up to (but not consuming) a closing
/// delimiter or a `|`, when `stop` names the delimiter the caller expects.
fn parse_sequence(toks: &[Lexeme], pos: &mut usize, stop: Option<&Lexeme>) -> Result<Vec<RhsElem>, String> {
  let mut seq = vec![];
  while *pos < toks.len() {
    let tok = &toks[*pos];
    if Some(tok) == stop || *tok == Lexeme::Pipe {
      break;
    }
    match tok {
      Lexeme::LBracket => {
        *pos += 1;
        let alts = parse_alternation(toks, pos, &Lexeme::RBracket)?;
        expect(toks, pos, &Lexeme::RBracket)?;
        seq.push(RhsElem::Optional(alts));
      }
      Lexeme::LBrace => {
        *pos += 1;
        let alts = parse_alternation(toks, pos, &Lexeme::RBrace)?;
        expect(toks, pos, &Lexeme::RBrace)?;
        seq.push(RhsElem::Repeat(alts));
      }
      Lexeme::LParen => {
        *pos += 1;
        let alts = parse_alternation(toks, pos, &Lexeme::RParen)?;
        expect(toks, pos, &Lexeme::RParen)?;
        seq.push(RhsElem::Group(alts));
      }
      Lexeme::Word(w) => {
        seq.push(RhsElem::Sym(w.clone()));
        *pos += 1;
      }
      other => return Err(format!("unexpected token {other:?} in rhs")),
    }
  }
  Ok(seq)
}

fn parse_alternation(toks: &[Lexeme], pos: &mut usize, close: &Lexeme) -> Result<Vec<Vec<RhsElem>>, String> {
  let mut alts = vec![parse_sequence(toks, pos, Some(close))?];
  while *pos < toks.len() && toks[*pos] == Lexeme::Pipe {
    *pos += 1;
    alts.push(parse_sequence(toks, pos, Some(close))?);
  }
  Ok(alts)
}

fn expect(toks: &[Lexeme], pos: &mut usize, expected: &Lexeme) -> Result<(), String> {
  match toks.get(*pos) {
    Some(t) if t == expected => {
      *pos += 1;
      Ok(())
    }
    other => Err(format!("expected {expected:?}, found {other:?}")),
  }
}

/// A freshly synthesized helper nonterminal and the alternative rhs's
/// (already expanded to plain symbol-name sequences) that define it.
///
/// `action` is the declaring production's own action, reused for every
/// alternative of the helper (including the epsilon base case) — a `{ }`
/// group's repetitions fold through the same closure a production written
/// by hand for the equivalent left-recursive rule would use, rather than
/// silently discarding every repetition under the no-action default.
pub struct HelperProduction {
  pub lhs: String,
  pub alts: Vec<Vec<String>>,
  pub action: Option<crate::types::ActionId>,
}

/// Expands `elems` into the set of concrete, plain-BNF symbol-name
/// sequences it denotes, emitting any helper nonterminals it needs (one per
/// `{ }` group) into `helpers`. `action` is threaded down so a synthesized
/// helper can carry the declaring production's action (see
/// [`HelperProduction`]).
pub fn expand(
  elems: &[RhsElem],
  next_helper_name: &mut impl FnMut() -> String,
  helpers: &mut Vec<HelperProduction>,
  action: Option<crate::types::ActionId>,
) -> Vec<Vec<String>> {
  if elems.is_empty() {
    return vec![vec![]];
  }
  let (first, rest) = (&elems[0], &elems[1..]);
  let rest_seqs = expand(rest, next_helper_name, helpers, action);
  match first {
    RhsElem::Sym(name) => rest_seqs
      .into_iter()
      .map(|mut r| {
        r.insert(0, name.clone());
        r
      })
      .collect(),
    RhsElem::Group(alts) => cross(alts, &rest_seqs, next_helper_name, helpers, false, action),
    RhsElem::Optional(alts) => cross(alts, &rest_seqs, next_helper_name, helpers, true, action),
    RhsElem::Repeat(alts) => {
      let helper_name = next_helper_name();
      let mut body_seqs = vec![];
      for alt in alts {
        body_seqs.extend(expand(alt, next_helper_name, helpers, action));
      }
      let mut helper_alts = vec![vec![]];
      for body in &body_seqs {
        let mut seq = vec![helper_name.clone()];
        seq.extend(body.clone());
        helper_alts.push(seq);
      }
      helpers.push(HelperProduction { lhs: helper_name.clone(), alts: helper_alts, action });
      rest_seqs
        .into_iter()
        .map(|mut r| {
          r.insert(0, helper_name.clone());
          r
        })
        .collect()
    }
  }
}

#[allow(clippy::too_many_arguments)]
fn cross(
  alts: &[Vec<RhsElem>],
  rest_seqs: &[Vec<String>],
  next_helper_name: &mut impl FnMut() -> String,
  helpers: &mut Vec<HelperProduction>,
  allow_empty: bool,
  action: Option<crate::types::ActionId>,
) -> Vec<Vec<String>> {
  let mut out = vec![];
  if allow_empty {
    out.extend(rest_seqs.iter().cloned());
  }
  for alt in alts {
    let alt_seqs = expand(alt, next_helper_name, helpers, action);
    for alt_seq in &alt_seqs {
      for r in rest_seqs {
        let mut combined = alt_seq.clone();
        combined.extend(r.clone());
        out.push(combined);
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_plain_sequence() {
    let elems = parse_rhs("term PLUS term").unwrap();
    assert_eq!(elems.len(), 3);
    assert!(matches!(elems[0], RhsElem::Sym(ref s) if s == "term"));
  }

  #[test]
  fn expands_optional() {
    let elems = parse_rhs("a [ b ] c").unwrap();
    let mut n = 0;
    let mut helpers = vec![];
    let seqs = expand(&elems, &mut || {
      n += 1;
      format!("__h{n}")
    }, &mut helpers, None);
    assert!(helpers.is_empty());
    assert_eq!(seqs.len(), 2);
    assert!(seqs.contains(&vec!["a".to_string(), "b".to_string(), "c".to_string()]));
    assert!(seqs.contains(&vec!["a".to_string(), "c".to_string()]));
  }

  #[test]
  fn expands_repeat_into_left_recursive_helper() {
    let elems = parse_rhs("term { ( PLUS | MINUS ) term }").unwrap();
    let mut n = 0;
    let mut helpers = vec![];
    let seqs = expand(&elems, &mut || {
      n += 1;
      format!("__h{n}")
    }, &mut helpers, None);
    assert_eq!(seqs.len(), 1);
    assert_eq!(helpers.len(), 1);
    let helper = &helpers[0];
    // `helper -> ε | helper PLUS term | helper MINUS term`
    assert_eq!(helper.alts.len(), 3);
    assert!(helper.alts.iter().any(|a| a.is_empty()));
  }
}
