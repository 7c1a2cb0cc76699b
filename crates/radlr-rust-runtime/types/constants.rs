//! Reserved symbol names every grammar receives for free (§3, §6, GLOSSARY).

/// The synthetic end-of-input terminal, `$end`.
pub const END_OF_INPUT: &str = "$end";

/// The reserved `error` terminal used as an error-recovery synchronization
/// point (§7).
pub const ERROR_SYMBOL: &str = "error";

/// The synthesized start production's name, `S'`, used only in diagnostics.
pub const AUGMENTED_START: &str = "$start";

pub fn is_reserved_symbol_name(name: &str) -> bool {
  matches!(name, END_OF_INPUT | ERROR_SYMBOL | AUGMENTED_START)
}
