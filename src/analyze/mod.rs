//! Static safety analyses over bound grammars.
//!
//! Two monotone fixed-point passes gate the interpreter:
//!
//! 1. [`wellformed`]: per-node behavior flags proving every construct
//!    terminates and that choices/repetitions backtrack safely around
//!    buffered actions.
//! 2. [`stack`]: an abstract model of the action-output stack proving it
//!    never underflows and that the entry rule leaves exactly one item.
//!
//! Annotations live in side tables keyed by `NodeId`, never on the
//! structural nodes, and are rebuilt from scratch on every `check()` call;
//! the graph itself stays read-only and reusable.

pub mod stack;
pub mod wellformed;

#[cfg(test)]
mod stack_tests;

pub use stack::LOW_FLOOR;
pub use wellformed::Flags;

use crate::diagnostics::GrammarError;
use crate::grammar::Grammar;

/// Converged annotations for one grammar, keyed by `NodeId`.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Behavior flags from the well-formedness pass.
    pub flags: Vec<Flags>,
    /// Net output-stack effect per node; `None` never resolved.
    pub net: Vec<Option<i32>>,
    /// Worst-case output-stack depth per node, relative to entry.
    pub low: Vec<i32>,
}

impl Analysis {
    fn cleared(len: usize) -> Self {
        Self {
            flags: vec![Flags::default(); len],
            net: vec![None; len],
            low: vec![0; len],
        }
    }
}

/// A grammar that passed both static checkers.
///
/// The interpreter only accepts checked grammars; this is the seam that
/// keeps an unproven graph from ever being executed. The borrow is
/// read-only, so one checked grammar can back any number of concurrent
/// interpreter runs.
#[derive(Debug)]
pub struct CheckedGrammar<'g> {
    grammar: &'g Grammar,
    analysis: Analysis,
}

impl<'g> CheckedGrammar<'g> {
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// The converged annotations, for downstream consumers (code
    /// generators, debugging dumps).
    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Test-only escape hatch for exercising interpreter semantics on
    /// grammars that deliberately skip a gate (e.g. action-free probes
    /// that would fail the root-arity check).
    #[cfg(test)]
    pub(crate) fn assume_checked(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            analysis: Analysis::cleared(grammar.len()),
        }
    }
}

/// Run both checkers in order; the first violation aborts.
pub fn check(grammar: &Grammar) -> Result<CheckedGrammar<'_>, GrammarError> {
    let mut analysis = Analysis::cleared(grammar.len());
    analysis.flags = wellformed::check(grammar)?;
    let (net, low) = stack::check(grammar)?;
    analysis.net = net;
    analysis.low = low;
    Ok(CheckedGrammar { grammar, analysis })
}
