//! The backtracking grammar interpreter.
//!
//! Synchronous recursive tree evaluation over a [`CheckedGrammar`]: every
//! combinator threads a plain boolean outcome, and backtracking is explicit
//! save/restore of (cursor, pending-buffer length) at choice and repetition
//! boundaries. The static checkers guarantee the disciplines assumed here:
//! repetition bodies cannot match emptily (termination) and an abandoned
//! alternative can never have flushed an action (backtrack safety).

use indexmap::IndexSet;

use crate::analyze::CheckedGrammar;
use crate::grammar::{ExprKind, Grammar, NodeId};

use super::input::InputSeq;
use super::{Output, OutputLog, ParseFailure};

/// Decides membership of a code point in a character category.
///
/// The category tables themselves (Unicode general categories or anything
/// else the binder resolved `Category` indices against) live outside this
/// crate; the interpreter only asks yes/no.
pub trait Classifier {
    fn contains(&self, category: u32, ch: char) -> bool;
}

/// Default classifier for grammars without category terminals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCategories;

impl Classifier for NoCategories {
    fn contains(&self, _category: u32, _ch: char) -> bool {
        false
    }
}

/// A buffered, not-yet-fired side effect.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Act { action: u32 },
    Drop,
}

/// One parse invocation: a borrowed checked grammar plus exclusively owned
/// mutable state. Run several interpreters over the same grammar for
/// concurrent parses.
pub struct Interpreter<'g, 's, C = NoCategories> {
    grammar: &'g Grammar,
    input: InputSeq<'s>,
    /// Input cursor (element index).
    pos: usize,
    /// Position of the last flush; action text spans from here.
    flush_mark: usize,
    /// Buffered effects, truncated on backtrack.
    pending: Vec<Pending>,
    /// Non-zero inside lookahead probes; suppresses buffering, marking,
    /// and flushing.
    lookahead: u32,
    /// Position the expected-item set was recorded at.
    marked_pos: usize,
    /// Expected-item markers, in recording order.
    marks: IndexSet<u32>,
    log: OutputLog,
    classifier: C,
}

impl<'g, 's> Interpreter<'g, 's> {
    pub fn new(checked: &CheckedGrammar<'g>, input: &'s str) -> Self {
        let grammar = checked.grammar();
        Self {
            grammar,
            input: InputSeq::new(input, grammar.mode()),
            pos: 0,
            flush_mark: 0,
            pending: Vec::new(),
            lookahead: 0,
            marked_pos: 0,
            marks: IndexSet::new(),
            log: Vec::new(),
            classifier: NoCategories,
        }
    }
}

impl<'g, 's, C: Classifier> Interpreter<'g, 's, C> {
    /// Replace the category classifier.
    pub fn with_classifier<C2: Classifier>(self, classifier: C2) -> Interpreter<'g, 's, C2> {
        Interpreter {
            grammar: self.grammar,
            input: self.input,
            pos: self.pos,
            flush_mark: self.flush_mark,
            pending: self.pending,
            lookahead: self.lookahead,
            marked_pos: self.marked_pos,
            marks: self.marks,
            log: self.log,
            classifier,
        }
    }

    /// Parse the input against the grammar's entry rule.
    pub fn run(mut self) -> Result<OutputLog, ParseFailure> {
        let root = self.grammar.root();
        let matched = self.eval(root);
        // Effects the parse committed past but that no later terminal
        // flushed still fire.
        if !self.pending.is_empty() {
            self.flush();
        }
        if matched {
            Ok(self.log)
        } else {
            Err(ParseFailure {
                position: self.marked_pos,
                expected: self
                    .marks
                    .iter()
                    .map(|&m| self.grammar.marker_name(m).to_string())
                    .collect(),
            })
        }
    }

    fn eval(&mut self, id: NodeId) -> bool {
        let grammar = self.grammar;
        match &grammar.node(id).kind {
            ExprKind::Rule { .. } => self.eval(grammar.operand(id)),
            ExprKind::Id { target } => self.eval(*target),

            ExprKind::Char { ch } => self.match_one(|c| c == *ch),
            ExprKind::Str { text } => self.match_text(text),
            ExprKind::Set { chars } => self.match_one(|c| chars.contains(c)),
            ExprKind::Range { lo, hi } => self.match_one(|c| (*lo..=*hi).contains(&c)),
            ExprKind::Category { index } => {
                match self.input.char_at(self.pos) {
                    Some(c) if self.classifier.contains(*index, c) => {
                        self.commit(1);
                        true
                    }
                    _ => false,
                }
            }
            ExprKind::Tag { token } => {
                let name = grammar.token_name(*token);
                match self.input.token_at(self.pos) {
                    Some(t) if t == name => {
                        self.commit(1);
                        true
                    }
                    _ => false,
                }
            }

            ExprKind::Mark { marker } => {
                let marker = *marker;
                if self.lookahead == 0 {
                    if self.marked_pos < self.pos {
                        self.marks.clear();
                        self.marked_pos = self.pos;
                    }
                    self.marks.insert(marker);
                }
                true
            }
            ExprKind::Act { action, .. } => {
                let action = *action;
                if self.lookahead == 0 {
                    self.pending.push(Pending::Act { action });
                }
                true
            }
            ExprKind::Drop => {
                if self.lookahead == 0 {
                    self.pending.push(Pending::Drop);
                }
                true
            }

            ExprKind::And => {
                let (x, y) = grammar.operands(id);
                // A failing left operand fails the sequence outright; any
                // effects it buffered are discarded by whichever enclosing
                // construct restores the buffer on backtrack.
                self.eval(x) && self.eval(y)
            }
            ExprKind::Or => {
                let (x, y) = grammar.operands(id);
                let save_pos = self.pos;
                let save_pending = self.pending.len();
                if self.eval(x) {
                    return true;
                }
                if self.pos > save_pos {
                    // Failure with progress is final: the alternative may
                    // only be tried from an untouched state.
                    return false;
                }
                self.pending.truncate(save_pending);
                self.eval(y)
            }

            ExprKind::Opt => {
                let x = grammar.operand(id);
                self.repeat(x, 0, Some(1))
            }
            ExprKind::Many => {
                let x = grammar.operand(id);
                self.repeat(x, 0, None)
            }
            ExprKind::Some => {
                let x = grammar.operand(id);
                self.repeat(x, 1, None)
            }

            ExprKind::Try => {
                let x = grammar.operand(id);
                // Probe without effects, rewind, then run for real so the
                // body's actions and markers take effect exactly once and
                // only after success is certain.
                let save_pos = self.pos;
                self.lookahead += 1;
                let matched = self.eval(x);
                self.lookahead -= 1;
                self.pos = save_pos;
                if matched { self.eval(x) } else { false }
            }
            ExprKind::Has => self.probe(id),
            ExprKind::Not => !self.probe(id),
        }
    }

    /// Run the body at least `min` times and at most `max` (if bounded).
    /// A body failure with progress fails the whole repetition; a failure
    /// without progress ends it successfully once `min` is met.
    fn repeat(&mut self, body: NodeId, min: usize, max: Option<usize>) -> bool {
        let mut count = 0;
        loop {
            if max.is_some_and(|m| count == m) {
                return true;
            }
            let save_pos = self.pos;
            let save_pending = self.pending.len();
            if self.eval(body) {
                count += 1;
                continue;
            }
            if self.pos > save_pos {
                return false;
            }
            if count < min {
                return false;
            }
            self.pending.truncate(save_pending);
            return true;
        }
    }

    /// Run a lookahead operand with all side effects suppressed and the
    /// cursor restored; returns whether it matched.
    fn probe(&mut self, id: NodeId) -> bool {
        let x = self.grammar.operand(id);
        let save_pos = self.pos;
        let save_pending = self.pending.len();
        self.lookahead += 1;
        let matched = self.eval(x);
        self.lookahead -= 1;
        self.pos = save_pos;
        debug_assert_eq!(
            self.pending.len(),
            save_pending,
            "lookahead must not buffer effects"
        );
        matched
    }

    fn match_one(&mut self, pred: impl Fn(char) -> bool) -> bool {
        match self.input.char_at(self.pos) {
            Some(c) if pred(c) => {
                self.commit(1);
                true
            }
            _ => false,
        }
    }

    /// Match a literal string atomically: all code points or nothing.
    /// The empty string matches, consuming nothing but still committing
    /// (a zero-length commit flushes pending effects).
    fn match_text(&mut self, text: &str) -> bool {
        let mut len = 0;
        for (i, ch) in text.chars().enumerate() {
            match self.input.char_at(self.pos + i) {
                Some(c) if c == ch => len += 1,
                _ => return false,
            }
        }
        self.commit(len);
        true
    }

    /// Commit a successful terminal match: flush buffered effects first so
    /// an action's visible text is exactly the span since the previous
    /// flush, then advance the cursor.
    fn commit(&mut self, consumed: usize) {
        if self.lookahead == 0 && !self.pending.is_empty() {
            self.flush();
        }
        self.pos += consumed;
    }

    /// Fire every buffered effect at the current position. A drop advances
    /// the flush mark without logging, so actions buffered after it report
    /// an empty span.
    fn flush(&mut self) {
        let here = self.pos;
        for pending in std::mem::take(&mut self.pending) {
            match pending {
                Pending::Act { action } => {
                    let text = self.input.slice(self.flush_mark, here);
                    self.log.push(Output {
                        action: self.grammar.action_name(action).to_string(),
                        text: (!text.is_empty()).then_some(text),
                    });
                }
                Pending::Drop => self.flush_mark = here,
            }
        }
        self.flush_mark = here;
    }
}
