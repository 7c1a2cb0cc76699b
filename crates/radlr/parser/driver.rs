use super::value::ProductionArgs;
use crate::lexer::{LexContext, LexErrorOutcome, Lexer, LexerBuilder, TokenHandle, TokenStream};
use radlr_core::{build_tables, Action, ActionId, Associativity, Grammar, GrammarBuilder, Journal, ParseTable, ProductionId};
use radlr_rust_runtime::types::{constants, RadlrResult, Token};

pub type ProdAction<Ctx, V> = Box<dyn Fn(&mut Ctx, &ProductionArgs<V>) -> V>;
pub type ParseErrorHook<Ctx> = Box<dyn Fn(&mut Ctx, Option<&Token>)>;

/// Declares a grammar and its token rules together (§6's "declaration
/// shape"), pairing `radlr_core::GrammarBuilder` with a `LexerBuilder` so a
/// token or nonterminal only has to be named once to be usable on both
/// sides.
pub struct ParserBuilder<Ctx, V> {
  grammar: GrammarBuilder,
  lexer: LexerBuilder<Ctx>,
  actions: Vec<Option<ProdAction<Ctx, V>>>,
  error_hook: Option<ParseErrorHook<Ctx>>,
}

impl<Ctx, V> Default for ParserBuilder<Ctx, V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<Ctx, V> ParserBuilder<Ctx, V> {
  pub fn new() -> Self {
    Self { grammar: GrammarBuilder::new(), lexer: LexerBuilder::new(), actions: vec![], error_hook: None }
  }

  /// Declares a token rule and the terminal symbol it produces, in one
  /// step.
  pub fn token(&mut self, name: &str, pattern: &str) -> TokenHandle {
    self.grammar.add_terminal(name);
    self.lexer.token(name, pattern)
  }

  pub fn token_with_action(
    &mut self,
    name: &str,
    pattern: &str,
    action: impl Fn(&mut LexContext<Ctx>, &mut Token) -> Option<Token> + 'static,
  ) -> TokenHandle {
    self.grammar.add_terminal(name);
    self.lexer.token_with_action(name, pattern, action)
  }

  pub fn remap(&mut self, handle: TokenHandle, value: &str, target_kind: &str) {
    self.grammar.add_terminal(target_kind);
    self.lexer.remap(handle, value, target_kind);
  }

  pub fn ignore(&mut self, chars: &str) {
    self.lexer.ignore(chars);
  }

  /// Declares a single-character literal as both a fallback scan and a
  /// grammar terminal named after the character itself (e.g. `'+'`).
  pub fn literal(&mut self, c: char) {
    self.grammar.add_terminal(&c.to_string());
    self.lexer.literal(c);
  }

  pub fn literals(&mut self, chars: &str) {
    for c in chars.chars() {
      self.literal(c);
    }
  }

  pub fn case_insensitive(&mut self, yes: bool) {
    self.lexer.case_insensitive(yes);
  }

  pub fn on_lex_error(&mut self, hook: impl Fn(&mut Ctx, &str, usize, u32) -> LexErrorOutcome + 'static) {
    self.lexer.on_error(hook);
  }

  pub fn on_parse_error(&mut self, hook: impl Fn(&mut Ctx, Option<&Token>) + 'static) {
    self.error_hook = Some(Box::new(hook));
  }

  pub fn set_start(&mut self, nonterminal: &str) {
    self.grammar.set_start(nonterminal);
  }

  pub fn add_precedence_level(&mut self, assoc: Associativity, terminals: &[&str]) {
    self.grammar.add_precedence_level(assoc, terminals);
  }

  /// Declares a production with a semantic action (§6). `rhs` uses the
  /// symbol-string syntax `radlr_core::GrammarBuilder::add_production`
  /// accepts, including the `[ ]`/`{ }`/`|` EBNF extensions.
  pub fn rule(&mut self, lhs: &str, rhs: &str, prec_override: Option<&str>, action: impl Fn(&mut Ctx, &ProductionArgs<V>) -> V + 'static) {
    let action_id = ActionId(self.actions.len() as u32);
    self.actions.push(Some(Box::new(action)));
    self.grammar.add_production(lhs, rhs, Some(action_id), prec_override, None);
  }

  /// Declares a production with no action. Its reduction falls back to the
  /// default of §6: the first rhs value passed through unchanged, or
  /// `V::default()` for an epsilon production — the same convention
  /// EBNF-generated helper productions use.
  pub fn rule_without_action(&mut self, lhs: &str, rhs: &str, prec_override: Option<&str>) {
    self.grammar.add_production(lhs, rhs, None, prec_override, None);
  }

  pub fn build(self, journal: &mut Journal) -> RadlrResult<Parser<Ctx, V>>
  where
    V: From<Token> + Default,
  {
    let grammar = self.grammar.freeze(journal)?;
    let lexer = self.lexer.build()?;
    let tables = build_tables(&grammar, journal);
    Ok(Parser { grammar, table: tables.table, lexer, actions: self.actions, error_hook: self.error_hook })
  }
}

/// A fully built parser: an immutable grammar, parse table, and scanner,
/// plus the embedder's action closures (§5: "build-time state is computed
/// once and shared read-only across every subsequent parse").
pub struct Parser<Ctx, V> {
  grammar: Grammar,
  table: ParseTable,
  lexer: Lexer<Ctx>,
  actions: Vec<Option<ProdAction<Ctx, V>>>,
  error_hook: Option<ParseErrorHook<Ctx>>,
}

impl<Ctx, V> Parser<Ctx, V>
where
  V: From<Token> + Default,
{
  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  /// Runs the shift/reduce loop of §4.7 against `text`, invoking §7's
  /// error-recovery protocol whenever `ACTION` is absent for the current
  /// state and lookahead.
  pub fn parse(&self, text: &str, ctx: &mut Ctx) -> RadlrResult<V> {
    let mut tokens = self.lexer.tokenize(text);
    let mut states: Vec<usize> = vec![0];
    let mut values: Vec<V> = vec![];
    let mut lookahead = self.pull(&mut tokens, ctx)?;

    loop {
      let top = *states.last().unwrap();
      let action = self.symbol_for(&lookahead).and_then(|sym| self.table.action(top, sym));

      match action {
        Some(Action::Shift(next)) => {
          states.push(next);
          values.push(V::from(lookahead));
          lookahead = self.pull(&mut tokens, ctx)?;
        }
        Some(Action::Reduce(pid)) => {
          self.reduce(pid, &mut states, &mut values, ctx);
        }
        Some(Action::Accept) => {
          return Ok(values.pop().unwrap_or_default());
        }
        None => {
          if let Some(hook) = &self.error_hook {
            let offending = if lookahead.is_end_of_input() { None } else { Some(&lookahead) };
            hook(ctx, offending);
          }
          if !self.recover(&mut states, &mut values, &mut tokens, &mut lookahead, ctx)? {
            return Ok(V::default());
          }
        }
      }
    }
  }

  fn pull(&self, tokens: &mut TokenStream<Ctx>, ctx: &mut Ctx) -> RadlrResult<Token> {
    match tokens.next_token(ctx) {
      Some(result) => result,
      None => Ok(Token::end_of_input(tokens.line(), tokens.index())),
    }
  }

  fn symbol_for(&self, token: &Token) -> Option<radlr_core::SymbolId> {
    self.grammar.symbol_named(&token.kind)
  }

  fn reduce(&self, pid: ProductionId, states: &mut Vec<usize>, values: &mut Vec<V>, ctx: &mut Ctx) {
    let production = self.grammar.production(pid);
    let k = production.rhs_len();
    let split_at = values.len() - k;
    let popped = values.split_off(split_at);
    states.truncate(states.len() - k);

    let value = match production.action {
      Some(action_id) => {
        let args = ProductionArgs::new(popped, production.rhs_names.clone());
        let action = self.actions[action_id.0 as usize].as_ref().expect("ActionId was never paired with a registered action");
        action(ctx, &args)
      }
      None => popped.into_iter().next().unwrap_or_default(),
    };

    let top = *states.last().unwrap();
    let next = self.table.goto(top, production.lhs).expect("GOTO table has no entry for a reduced nonterminal");
    states.push(next);
    values.push(value);
  }

  /// Implements §7's four-step recovery: pop states until one can shift
  /// `error`, shift it, discard lookaheads until one is legal (or EOF), then
  /// resume. Returns `false` if the stack emptied without finding an
  /// `error`-shiftable state, in which case the parse fails with a null
  /// semantic value.
  fn recover(
    &self,
    states: &mut Vec<usize>,
    values: &mut Vec<V>,
    tokens: &mut TokenStream<Ctx>,
    lookahead: &mut Token,
    ctx: &mut Ctx,
  ) -> RadlrResult<bool> {
    let error_symbol = self.grammar.error_symbol;

    loop {
      let top = *states.last().unwrap();
      if matches!(self.table.action(top, error_symbol), Some(Action::Shift(_))) {
        break;
      }
      if states.len() <= 1 {
        return Ok(false);
      }
      states.pop();
      values.pop();
    }

    let top = *states.last().unwrap();
    let Some(Action::Shift(err_state)) = self.table.action(top, error_symbol) else {
      unreachable!("loop above only exits once a Shift action is confirmed present")
    };
    states.push(err_state);
    values.push(V::from(Token::new(constants::ERROR_SYMBOL, String::new(), lookahead.line, lookahead.byte_index)));

    loop {
      if lookahead.is_end_of_input() {
        break;
      }
      let legal = self.symbol_for(lookahead).and_then(|sym| self.table.action(err_state, sym)).is_some();
      if legal {
        break;
      }
      *lookahead = self.pull(tokens, ctx)?;
    }

    Ok(true)
  }
}

