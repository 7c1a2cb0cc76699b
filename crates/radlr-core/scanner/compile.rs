use crate::types::{ActionId, TokenRule};
use radlr_rust_runtime::types::{RadlrError, RadlrResult};
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};

/// A successful match of the master regex against `text[index..]`.
#[derive(Debug, Clone)]
pub struct ScanMatch {
  pub rule_index: usize,
  /// Byte offset, relative to the start of `text`, one past the match.
  pub end: usize,
  pub value: String,
}

/// The compiled master matcher plus the per-rule metadata needed to drive
/// it (§4.2 output: "a compiled master matcher plus metadata").
pub struct CompiledScanner {
  master: Regex,
  pub rules: Vec<TokenRule>,
  group_names: Vec<String>,
  pub literals: HashSet<char>,
  pub ignore_chars: HashSet<char>,
}

impl CompiledScanner {
  /// Attempts the master matcher anchored at `index` (§4.3 step 2): the
  /// match, if any, must start exactly at `index`, never later.
  pub fn try_match(&self, text: &str, index: usize) -> Option<ScanMatch> {
    let caps = self.master.captures(&text[index..])?;
    let whole = caps.get(0)?;
    if whole.start() != 0 {
      return None;
    }
    for (i, name) in self.group_names.iter().enumerate() {
      if let Some(m) = caps.name(name) {
        return Some(ScanMatch { rule_index: i, end: index + m.end(), value: m.as_str().to_string() });
      }
    }
    None
  }

  pub fn rule(&self, index: usize) -> &TokenRule {
    &self.rules[index]
  }
}

/// Builds a [`CompiledScanner`] from an ordered rule list, an `ignore`
/// character set, and a literal set (§4.2).
#[derive(Default)]
pub struct ScannerBuilder {
  rules: Vec<TokenRule>,
  literals: HashSet<char>,
  ignore_chars: HashSet<char>,
  case_insensitive: bool,
}

impl ScannerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_rule(&mut self, name: &str, pattern: &str, action: Option<ActionId>) -> usize {
    let order = self.rules.len();
    self.rules.push(TokenRule { name: name.to_string(), pattern: pattern.to_string(), action, remap: HashMap::new(), order });
    order
  }

  pub fn add_remap(&mut self, rule_index: usize, value: &str, target_kind: &str) {
    self.rules[rule_index].remap.insert(value.to_string(), target_kind.to_string());
  }

  pub fn set_ignore_chars(&mut self, chars: &str) {
    self.ignore_chars = chars.chars().collect();
  }

  pub fn add_literal(&mut self, c: char) {
    self.literals.insert(c);
  }

  pub fn set_case_insensitive(&mut self, yes: bool) {
    self.case_insensitive = yes;
  }

  /// Validates and compiles the rule set (§4.2 "Algorithm"). `known_kinds`
  /// is the full set of declared token names, used to validate keyword
  /// remap targets.
  pub fn build(self, known_kinds: &HashSet<String>) -> RadlrResult<CompiledScanner> {
    let mut errors = vec![];

    for rule in &self.rules {
      match Regex::new(&rule.pattern) {
        Ok(re) => {
          if re.is_match("") {
            errors.push(RadlrError::build_on("token rule pattern matches the empty string", &rule.name));
          }
        }
        Err(e) => errors.push(RadlrError::build_on(format!("invalid regex: {e}"), &rule.name)),
      }
      for target in rule.remap.values() {
        if !known_kinds.contains(target) {
          errors.push(RadlrError::build_on("keyword remap targets an undeclared token kind", target));
        }
      }
    }

    let mut seen_names = HashSet::new();
    for rule in &self.rules {
      if !seen_names.insert(rule.name.clone()) {
        errors.push(RadlrError::build_on("duplicate token rule name", &rule.name));
      }
    }

    if !errors.is_empty() {
      return Err(RadlrError::Many { message: "scanner failed to compile".into(), errors });
    }

    let mut ordered: Vec<&TokenRule> = self.rules.iter().collect();
    ordered.sort_by_key(|r| r.order);

    let group_names: Vec<String> = ordered.iter().enumerate().map(|(i, r)| format!("{}_{i}", sanitize_group_name(&r.name))).collect();
    let alternation = ordered
      .iter()
      .zip(&group_names)
      .map(|(r, group)| format!("(?P<{group}>{})", r.pattern))
      .collect::<Vec<_>>()
      .join("|");
    let anchored = format!("^(?:{alternation})");

    let master = RegexBuilder::new(&anchored)
      .case_insensitive(self.case_insensitive)
      .build()
      .map_err(|e| RadlrError::build(format!("failed to compile master matcher: {e}")))?;

    let rules = ordered.into_iter().cloned().collect();

    Ok(CompiledScanner { master, rules, group_names, literals: self.literals, ignore_chars: self.ignore_chars })
  }
}

fn sanitize_group_name(name: &str) -> String {
  let mut out = String::with_capacity(name.len() + 1);
  out.push('g');
  for c in name.chars() {
    if c.is_ascii_alphanumeric() || c == '_' {
      out.push(c);
    } else {
      out.push('_');
    }
  }
  out
}
