use super::Token;
use std::fmt::{self, Display};

/// How serious a diagnostic is. Generalizes the teacher's
/// `SherpaErrorSeverity` bitmask down to a plain enum: nothing in this repo
/// needs to combine severities with bitwise ops, only compare and sort them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
  Hint,
  Warning,
  Critical,
}

impl Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Severity::Hint => "hint",
      Severity::Warning => "warning",
      Severity::Critical => "error",
    })
  }
}

/// Every error this library can raise, from grammar/scanner freeze through
/// scanning and parsing (§7).
#[derive(Clone, Debug)]
pub enum RadlrError {
  /// Raised during grammar or scanner freeze: undeclared symbol, empty
  /// matching regex, duplicate rule name, invalid precedence declaration,
  /// unreachable nonterminal. Fatal — no partial parser is produced.
  BuildError { message: String, symbol: Option<String> },

  /// Raised while scanning when the user's `error` hook does not advance
  /// the cursor, or does not exist and input remains unmatched.
  LexError { message: String, remaining: String, index: usize, line: u32 },

  /// Encountered at run time when `ACTION[state, lookahead]` is absent and
  /// error recovery could not resynchronize (§7).
  ParseError { message: String, token: Option<Token> },

  /// Several independent diagnostics collected together, e.g. all of a
  /// grammar's undeclared-symbol errors reported at once rather than
  /// stopping at the first.
  Many { message: String, errors: Vec<RadlrError> },
}

impl RadlrError {
  pub fn severity(&self) -> Severity {
    match self {
      RadlrError::BuildError { .. } => Severity::Critical,
      RadlrError::LexError { .. } => Severity::Critical,
      RadlrError::ParseError { .. } => Severity::Critical,
      RadlrError::Many { errors, .. } => {
        errors.iter().map(RadlrError::severity).max().unwrap_or(Severity::Hint)
      }
    }
  }

  pub fn build(message: impl Into<String>) -> Self {
    RadlrError::BuildError { message: message.into(), symbol: None }
  }

  pub fn build_on(message: impl Into<String>, symbol: impl Into<String>) -> Self {
    RadlrError::BuildError { message: message.into(), symbol: Some(symbol.into()) }
  }
}

impl Display for RadlrError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RadlrError::BuildError { message, symbol: Some(s) } => write!(f, "build error: {message} (symbol `{s}`)"),
      RadlrError::BuildError { message, symbol: None } => write!(f, "build error: {message}"),
      RadlrError::LexError { message, index, line, .. } => write!(f, "lex error at {line}:{index}: {message}"),
      RadlrError::ParseError { message, token: Some(t) } => write!(f, "parse error at {t}: {message}"),
      RadlrError::ParseError { message, token: None } => write!(f, "parse error at end of input: {message}"),
      RadlrError::Many { message, errors } => {
        writeln!(f, "{message}")?;
        for e in errors {
          writeln!(f, "  - {e}")?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RadlrError {}

pub type RadlrResult<T> = Result<T, RadlrError>;
