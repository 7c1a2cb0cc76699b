//! The scanner engine (§4.3): drives a `radlr_core::CompiledScanner` against
//! real input, owning the per-token action closures `radlr_core` only keeps
//! an opaque `ActionId` for.

mod engine;

pub use engine::TokenStream;

use radlr_core::{ScannerBuilder, Token};
use radlr_rust_runtime::types::RadlrResult;
use std::collections::HashSet;

pub type TokenHandle = usize;

/// The per-action view into scanner state (§4.3: "invoke it with a mutable
/// `Token` record and the scanner's line counter accessible for update").
/// `user` is the embedder's own scanner-side state (e.g. a brace-depth
/// counter or symbol table); `line` is this engine's line counter, mutable
/// so an `ignore_newline` rule's action can advance it.
pub struct LexContext<'a, Ctx> {
  pub user: &'a mut Ctx,
  pub line: &'a mut u32,
}

type LexAction<Ctx> = Box<dyn Fn(&mut LexContext<Ctx>, &mut Token) -> Option<Token>>;

/// What a registered lex error handler decided to do (§7 "Lex errors").
pub enum LexErrorOutcome {
  /// Resume scanning at byte offset `to` (which must be greater than the
  /// index the handler was invoked at), optionally yielding a synthetic
  /// token first.
  Advance { to: usize, token: Option<Token> },
  /// The handler could not make progress; scanning stops with a
  /// [`radlr_rust_runtime::types::RadlrError::LexError`].
  Fatal,
}

type LexErrorHook<Ctx> = Box<dyn Fn(&mut Ctx, &str, usize, u32) -> LexErrorOutcome>;

/// Builds a [`Lexer`] from token rules, following the same "declare now,
/// validate at `build()`" shape as `radlr_core::GrammarBuilder` (§4.1, §4.2).
pub struct LexerBuilder<Ctx> {
  scanner: ScannerBuilder,
  actions: Vec<Option<LexAction<Ctx>>>,
  names: Vec<String>,
  /// Keyword-remap targets (§3 "Keyword remap") registered via [`LexerBuilder::remap`].
  /// A remap target like `IF` is usually never declared as a rule of its own — it
  /// only ever arises as a retargeted match of another rule (`ID`) — so it has to be
  /// tracked separately to still count as "known" when [`ScannerBuilder::build`]
  /// validates remap targets against the declared token-kind set.
  remap_targets: HashSet<String>,
  error_hook: Option<LexErrorHook<Ctx>>,
}

impl<Ctx> Default for LexerBuilder<Ctx> {
  fn default() -> Self {
    Self::new()
  }
}

impl<Ctx> LexerBuilder<Ctx> {
  pub fn new() -> Self {
    Self { scanner: ScannerBuilder::new(), actions: vec![], names: vec![], remap_targets: HashSet::new(), error_hook: None }
  }

  pub fn token(&mut self, name: &str, pattern: &str) -> TokenHandle {
    let idx = self.scanner.add_rule(name, pattern, None);
    self.names.push(name.to_string());
    self.actions.push(None);
    idx
  }

  pub fn token_with_action(
    &mut self,
    name: &str,
    pattern: &str,
    action: impl Fn(&mut LexContext<Ctx>, &mut Token) -> Option<Token> + 'static,
  ) -> TokenHandle {
    let action_id = radlr_core::ActionId(self.names.len() as u32);
    let idx = self.scanner.add_rule(name, pattern, Some(action_id));
    self.names.push(name.to_string());
    self.actions.push(Some(Box::new(action)));
    idx
  }

  /// Remaps a literal match (e.g. `"if"`) of the rule identified by
  /// `handle` onto a different declared token kind (e.g. `"IF"`) (§3
  /// "Keyword remap").
  pub fn remap(&mut self, handle: TokenHandle, value: &str, target_kind: &str) {
    self.remap_targets.insert(target_kind.to_string());
    self.scanner.add_remap(handle, value, target_kind);
  }

  /// Characters skipped outright before attempting a match — never
  /// produce a token, never run an action (§3 "ignore characters").
  pub fn ignore(&mut self, chars: &str) {
    self.scanner.set_ignore_chars(chars);
  }

  pub fn literal(&mut self, c: char) {
    self.scanner.add_literal(c);
  }

  pub fn literals(&mut self, chars: &str) {
    for c in chars.chars() {
      self.scanner.add_literal(c);
    }
  }

  pub fn case_insensitive(&mut self, yes: bool) {
    self.scanner.set_case_insensitive(yes);
  }

  pub fn on_error(&mut self, hook: impl Fn(&mut Ctx, &str, usize, u32) -> LexErrorOutcome + 'static) {
    self.error_hook = Some(Box::new(hook));
  }

  /// Validates and compiles the rule set (§4.2), then pairs the compiled
  /// matcher with the action closures declared above.
  pub fn build(self) -> RadlrResult<Lexer<Ctx>> {
    let mut known_kinds: HashSet<String> = self.names.iter().cloned().collect();
    known_kinds.extend(self.remap_targets.iter().cloned());
    let scanner = self.scanner.build(&known_kinds)?;
    Ok(Lexer { scanner, actions: self.actions, error_hook: self.error_hook })
  }
}

/// A compiled scanner plus its run-time action closures. Stateless and
/// reusable across any number of [`Lexer::tokenize`] calls (§5: "build-time
/// state is computed once ... run-time state is created per call").
pub struct Lexer<Ctx> {
  scanner: radlr_core::CompiledScanner,
  actions: Vec<Option<LexAction<Ctx>>>,
  error_hook: Option<LexErrorHook<Ctx>>,
}

impl<Ctx> Lexer<Ctx> {
  pub fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a, Ctx> {
    TokenStream::new(self, text)
  }
}
