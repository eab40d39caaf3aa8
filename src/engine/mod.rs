//! Reference execution engine for checked grammars.
//!
//! Backtracking recursive evaluation with delayed action firing: actions
//! and drops are buffered until the parse commits past them by consuming
//! input, so an abandoned alternative leaves no observable trace. Parse
//! failure is an ordinary outcome, not an error of the process; callers
//! may run further inputs against the same checked grammar.

pub mod input;
pub mod interpreter;


pub use input::InputSeq;
pub use interpreter::{Classifier, Interpreter, NoCategories};

use serde::Serialize;

/// One fired action: its name and the text consumed since the previous
/// flush point (`None` when that span was empty). Drops fire silently and
/// never appear in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Ordered log of fired actions, one entry per firing.
pub type OutputLog = Vec<Output>;

/// A failed parse: the furthest failure position and the expected-item
/// names recorded there, in recording order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("parse failed at input position {position}")]
pub struct ParseFailure {
    pub position: usize,
    pub expected: Vec<String>,
}
