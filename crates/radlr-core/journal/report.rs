use radlr_rust_runtime::types::Severity;
use std::time::Duration;

/// Which build phase a [`Report`] was logged from, matching the component
/// table in §2 ("System Overview").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPhase {
  Info,
  GrammarFreeze,
  ScannerCompile,
  Lr0Construction,
  LalrSolve,
  TableGeneration,
}

#[derive(Debug, Clone)]
pub struct Report {
  pub phase: ReportPhase,
  pub severity: Severity,
  pub message: String,
  pub elapsed: Duration,
}
