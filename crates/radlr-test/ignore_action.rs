//! §8 scenario 4 ("Ignore action"): an `ignore_`-prefixed rule is matched
//! and discarded like any other ignored token, but unlike the plain
//! `ignore` character set, it still runs its attached action — the hook
//! line-number tracking rides on. A separate `#.*` comment rule (also
//! `ignore_`-prefixed) proves more than one ignored rule can coexist.

use radlr::LexerBuilder;

#[test]
fn newline_action_advances_lineno_and_comments_are_silently_dropped() {
  let mut builder: LexerBuilder<()> = LexerBuilder::new();

  builder.token_with_action("ignore_newline", r"\n+", |ctx, token| {
    *ctx.line += token.value.matches('\n').count() as u32;
    None
  });
  builder.token("ignore_comment", r"#.*");
  builder.token("NUMBER", r"\d+");
  builder.token("ID", r"[A-Za-z_][A-Za-z0-9_]*");

  let lexer = builder.build().expect("lexer must build");
  let mut stream = lexer.tokenize("\n\n# A comment\n123\nabc\n");
  let mut ctx = ();

  let first = stream.next_token(&mut ctx).expect("a token").expect("no lex error");
  assert_eq!(first.kind.as_ref(), "NUMBER");
  assert_eq!(first.value, "123");
  assert_eq!(first.line, 4);

  let second = stream.next_token(&mut ctx).expect("a token").expect("no lex error");
  assert_eq!(second.kind.as_ref(), "ID");
  assert_eq!(second.value, "abc");
  assert_eq!(second.line, 5);

  assert!(stream.next_token(&mut ctx).is_none());
  assert_eq!(stream.line(), 6);
}
