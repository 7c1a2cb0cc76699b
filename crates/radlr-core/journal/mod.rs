//! Build-time diagnostics (§4 "Diagnostics", §6 "Diagnostic outputs", §7
//! "Warnings"). This is this crate's logging layer: the teacher
//! (`source/lib/sherpa-core/journal/mod.rs`) doesn't use `log`/`tracing`
//! for compiler diagnostics either, it journals structured `Report`s and
//! renders them on demand, so that's the shape kept here.

mod report;

pub use report::{Report, ReportPhase};

use radlr_rust_runtime::types::{RadlrError, Severity};
use std::time::Instant;

/// Build-time knobs for a single grammar/scanner build, generalizing the
/// teacher's `journal::Config` (held on its own `Journal` and threaded
/// through via `Journal::new(config: Option<Config>)`). Everything §4.6
/// needs for conflict resolution (shift-over-reduce, earlier-production-wins)
/// is unconditional per spec, so there is no policy knob for it — this is
/// where one would go if this library ever grew a second resolution policy.
#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
  /// Mirrors the `auto_print_errors` feature flag, but as a per-build choice
  /// rather than a compile-time one: echo each report to stderr as it's
  /// logged, in addition to collecting it.
  pub print_as_logged: bool,
  /// Whether `Journal::render` should include `Severity::Hint` reports (the
  /// state-count/table-size progress notes) or only warnings and errors.
  pub include_hints_in_render: bool,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self { print_as_logged: cfg!(feature = "auto_print_errors"), include_hints_in_render: true }
  }
}

/// Accumulates diagnostics across one grammar/scanner build (§5 "build-time
/// state is computed once"). A `Journal` is created per build, not shared
/// across parser instances.
#[derive(Debug)]
pub struct Journal {
  reports: Vec<Report>,
  create_time: Instant,
  config: BuildConfig,
}

impl Default for Journal {
  fn default() -> Self {
    Self::new()
  }
}

impl Journal {
  pub fn new() -> Self {
    Self::with_config(BuildConfig::default())
  }

  /// Builds a `Journal` with explicit [`BuildConfig`] knobs, mirroring the
  /// teacher's `Journal::new(config: Option<Config>)` constructor.
  pub fn with_config(config: BuildConfig) -> Self {
    Self { reports: vec![], create_time: Instant::now(), config }
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  pub fn log_info(&mut self, message: impl Into<String>) {
    self.push(ReportPhase::Info, Severity::Hint, message);
  }

  pub fn info(&mut self, phase: ReportPhase, message: impl Into<String>) {
    self.push(phase, Severity::Hint, message);
  }

  pub fn log_warning(&mut self, phase: ReportPhase, message: impl Into<String>) {
    self.push(phase, Severity::Warning, message);
  }

  pub fn log_conflict(&mut self, message: impl Into<String>) {
    self.push(ReportPhase::TableGeneration, Severity::Warning, message);
  }

  pub fn log_build_errors(&mut self, errors: &[RadlrError]) {
    for e in errors {
      self.push(ReportPhase::GrammarFreeze, e.severity(), e.to_string());
    }
  }

  fn push(&mut self, phase: ReportPhase, severity: Severity, message: impl Into<String>) {
    let message = message.into();
    if self.config.print_as_logged {
      eprintln!("[{phase:?}] {severity}: {message}");
    }
    self.reports.push(Report { phase, severity, message, elapsed: self.create_time.elapsed() });
  }

  pub fn reports(&self) -> &[Report] {
    &self.reports
  }

  pub fn warnings(&self) -> impl Iterator<Item = &Report> {
    self.reports.iter().filter(|r| r.severity >= Severity::Warning)
  }

  /// Renders every collected report as the human-readable dump described in
  /// §6 "Diagnostic outputs". Honors `BuildConfig::include_hints_in_render`.
  pub fn render(&self) -> String {
    let mut out = String::new();
    for r in &self.reports {
      if !self.config.include_hints_in_render && r.severity == Severity::Hint {
        continue;
      }
      out.push_str(&format!("{:>8.3}s [{:<16?}] {:<7}: {}\n", r.elapsed.as_secs_f64(), r.phase, r.severity.to_string(), r.message));
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_omits_hints_when_configured_to() {
    let mut journal = Journal::with_config(BuildConfig { print_as_logged: false, include_hints_in_render: false });
    journal.log_info("grammar frozen: 3 symbols");
    journal.log_warning(ReportPhase::TableGeneration, "unused precedence level");

    let rendered = journal.render();
    assert!(!rendered.contains("grammar frozen"));
    assert!(rendered.contains("unused precedence level"));
  }

  #[test]
  fn render_includes_hints_by_default() {
    let mut journal = Journal::new();
    journal.log_info("grammar frozen: 3 symbols");

    assert!(journal.render().contains("grammar frozen"));
  }
}
