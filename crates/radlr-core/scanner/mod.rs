//! The scanner compiler (§4.2): merges per-token regular expressions into a
//! single alternation with named capture, validates them, and produces a
//! [`CompiledScanner`] — the "master matcher plus metadata" the run-time
//! scanner engine (in the `radlr` crate) drives.

mod compile;

pub use compile::{CompiledScanner, ScanMatch, ScannerBuilder};
