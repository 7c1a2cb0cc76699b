mod common;

#[cfg(test)]
mod calculator;

#[cfg(test)]
mod error_recovery;

#[cfg(test)]
mod keyword_remap;

#[cfg(test)]
mod ignore_action;

#[cfg(test)]
mod ebnf_expansion;

#[cfg(test)]
mod precedence;

#[cfg(test)]
mod invariants;
