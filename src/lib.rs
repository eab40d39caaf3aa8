//! Static safety proofs and a reference interpreter for parsing expression
//! grammars.
//!
//! A bound grammar (rules, ordered choice, repetition, lookahead, buffered
//! semantic actions) goes through two fixed-point analyses before it may be
//! executed: a well-formedness pass proving every construct terminates and
//! backtracks safely, and a stack-balance pass proving the action-output
//! stack never underflows and yields exactly one result. The interpreter
//! then runs the certified graph against code-point or token-name input.
//!
//! # Example
//!
//! ```
//! use gramina::{GrammarBuilder, Interpreter, check};
//!
//! let mut g = GrammarBuilder::new();
//! let a = g.chr('a');
//! let b = g.chr('b');
//! let done = g.act("done", 0);
//! let body = g.seq_all(&[a, b, done]);
//! g.rule("r", body);
//! let grammar = g.finish();
//!
//! let checked = check(&grammar).expect("grammar is safe");
//! let log = Interpreter::new(&checked, "ab").run().expect("input matches");
//! assert_eq!(log[0].action, "done");
//! assert_eq!(log[0].text.as_deref(), Some("ab"));
//! ```

pub mod analyze;
pub mod diagnostics;
pub mod engine;
pub mod grammar;

pub use analyze::{Analysis, CheckedGrammar, check};
pub use diagnostics::{GrammarError, GrammarErrorKind};
pub use engine::{Classifier, Interpreter, Output, OutputLog, ParseFailure};
pub use grammar::{ExprKind, Grammar, GrammarBuilder, InputMode, Node, NodeId};
