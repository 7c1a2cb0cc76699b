use super::{LexContext, LexErrorOutcome, Lexer};
use radlr_rust_runtime::types::{RadlrError, RadlrResult, Token};

/// Per-call scanning state (§4.3, §5 "run-time state is created per call,
/// discarded after"). Borrows the [`Lexer`] and input text; the embedder's
/// own context is passed to [`TokenStream::next_token`] rather than stored,
/// so it stays free for the parse driver to use between token pulls.
pub struct TokenStream<'a, Ctx> {
  lexer: &'a Lexer<Ctx>,
  text: &'a str,
  index: usize,
  line: u32,
}

impl<'a, Ctx> TokenStream<'a, Ctx> {
  pub(crate) fn new(lexer: &'a Lexer<Ctx>, text: &'a str) -> Self {
    Self { lexer, text, index: 0, line: 1 }
  }

  pub fn line(&self) -> u32 {
    self.line
  }

  pub fn index(&self) -> usize {
    self.index
  }

  /// Runs the §4.3 algorithm once: skip ignore characters, try the master
  /// matcher, run the matched rule's action (if any), apply keyword remap,
  /// and fall back to a single-character literal or the error hook when
  /// nothing matches. Returns `None` only at true end of input.
  pub fn next_token(&mut self, ctx: &mut Ctx) -> Option<RadlrResult<Token>> {
    loop {
      if self.index >= self.text.len() {
        return None;
      }
      let c = self.text[self.index..].chars().next()?;

      if self.lexer.scanner.ignore_chars.contains(&c) {
        if c == '\n' {
          self.line += 1;
        }
        self.index += c.len_utf8();
        continue;
      }

      if let Some(m) = self.lexer.scanner.try_match(self.text, self.index) {
        let rule = self.lexer.scanner.rule(m.rule_index);
        let mut token = Token::new(rule.name.clone(), m.value.clone(), self.line, self.index);
        let mut keep = true;
        if let Some(action) = &self.lexer.actions[m.rule_index] {
          let mut lex_ctx = LexContext { user: ctx, line: &mut self.line };
          match action(&mut lex_ctx, &mut token) {
            Some(updated) => token = updated,
            None => keep = false,
          }
        }
        self.index = m.end;
        if !keep {
          continue;
        }
        if rule.is_ignored() {
          continue;
        }
        if let Some(target) = rule.remap.get(&token.value) {
          token.kind = target.clone().into();
        }
        return Some(Ok(token));
      }

      if self.lexer.scanner.literals.contains(&c) {
        let token = Token::new(c.to_string(), c.to_string(), self.line, self.index);
        self.index += c.len_utf8();
        return Some(Ok(token));
      }

      let remaining = self.text[self.index..].to_string();
      let index = self.index;
      let line = self.line;
      return Some(match &self.lexer.error_hook {
        Some(hook) => match hook(ctx, &remaining, index, line) {
          LexErrorOutcome::Advance { to, token } => {
            if to <= self.index {
              Err(RadlrError::LexError { message: "error handler did not advance the scan cursor".into(), remaining, index, line })
            } else {
              self.index = to;
              match token {
                Some(t) => Ok(t),
                None => continue,
              }
            }
          }
          LexErrorOutcome::Fatal => {
            Err(RadlrError::LexError { message: "lex error handler reported a fatal error".into(), remaining, index, line })
          }
        },
        None => Err(RadlrError::LexError { message: "unmatched input and no error handler registered".into(), remaining, index, line }),
      });
    }
  }
}
