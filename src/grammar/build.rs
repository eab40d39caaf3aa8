//! Programmatic construction of bound grammars.
//!
//! The textual grammar syntax and its binder live upstream; this builder is
//! the in-process way to produce the same bound arenas (embedders, tests).
//! Construction is two-phase: expression constructors return `NodeId`s
//! immediately, while `id()` references are recorded by name and resolved
//! against the rule table in `finish()`, so forward and self references
//! work without placeholder juggling.

use indexmap::{IndexMap, IndexSet};
use rowan::TextRange;

use super::{ExprKind, Grammar, InputMode, Node, NodeId};

/// Builder for [`Grammar`] arenas.
///
/// Spans are auto-assigned in creation order (node `i` gets `i..i+1`) so
/// diagnostics in tests are positionally meaningful; `spanned()` overrides
/// with a real source range.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    nodes: Vec<Node>,
    rules: IndexMap<String, NodeId>,
    unresolved: Vec<(NodeId, String)>,
    actions: IndexSet<String>,
    markers: IndexSet<String>,
    tokens: IndexSet<String>,
    mode: InputMode,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the grammar to whitespace-separated token-name input.
    pub fn token_mode(mut self) -> Self {
        self.mode = InputMode::TokenNames;
        self
    }

    fn add(&mut self, kind: ExprKind, lhs: Option<NodeId>, rhs: Option<NodeId>) -> NodeId {
        let id = self.nodes.len() as NodeId;
        let at = id;
        self.nodes.push(Node {
            kind,
            lhs,
            rhs,
            span: TextRange::new(at.into(), (at + 1).into()),
        });
        id
    }

    /// Override the auto-assigned span of `id`.
    pub fn spanned(&mut self, id: NodeId, span: TextRange) -> NodeId {
        self.nodes[id as usize].span = span;
        id
    }

    // ── terminals ────────────────────────────────────────────────────────

    pub fn chr(&mut self, ch: char) -> NodeId {
        self.add(ExprKind::Char { ch }, None, None)
    }

    /// Literal string; `""` is the always-succeeding empty match.
    pub fn text(&mut self, text: &str) -> NodeId {
        self.add(
            ExprKind::Str {
                text: text.to_string(),
            },
            None,
            None,
        )
    }

    /// Character set; `""` is the never-succeeding empty set.
    pub fn set(&mut self, chars: &str) -> NodeId {
        self.add(
            ExprKind::Set {
                chars: chars.to_string(),
            },
            None,
            None,
        )
    }

    pub fn range(&mut self, lo: char, hi: char) -> NodeId {
        self.add(ExprKind::Range { lo, hi }, None, None)
    }

    pub fn category(&mut self, index: u32) -> NodeId {
        self.add(ExprKind::Category { index }, None, None)
    }

    pub fn tag(&mut self, name: &str) -> NodeId {
        let token = self.tokens.insert_full(name.to_string()).0 as u32;
        self.add(ExprKind::Tag { token }, None, None)
    }

    // ── effects ──────────────────────────────────────────────────────────

    pub fn mark(&mut self, name: &str) -> NodeId {
        let marker = self.markers.insert_full(name.to_string()).0 as u32;
        self.add(ExprKind::Mark { marker }, None, None)
    }

    pub fn act(&mut self, name: &str, arity: u32) -> NodeId {
        let action = self.actions.insert_full(name.to_string()).0 as u32;
        self.add(ExprKind::Act { action, arity }, None, None)
    }

    pub fn drop(&mut self) -> NodeId {
        self.add(ExprKind::Drop, None, None)
    }

    // ── combinators ──────────────────────────────────────────────────────

    pub fn seq(&mut self, x: NodeId, y: NodeId) -> NodeId {
        self.add(ExprKind::And, Some(x), Some(y))
    }

    pub fn alt(&mut self, x: NodeId, y: NodeId) -> NodeId {
        self.add(ExprKind::Or, Some(x), Some(y))
    }

    /// Right-folded sequence of two or more expressions.
    pub fn seq_all(&mut self, items: &[NodeId]) -> NodeId {
        self.fold_right(items, Self::seq)
    }

    /// Right-folded ordered choice of two or more expressions.
    pub fn alt_all(&mut self, items: &[NodeId]) -> NodeId {
        self.fold_right(items, Self::alt)
    }

    fn fold_right(&mut self, items: &[NodeId], op: fn(&mut Self, NodeId, NodeId) -> NodeId) -> NodeId {
        let (&last, init) = items
            .split_last()
            .expect("fold over empty expression list");
        init.iter().rev().fold(last, |acc, &x| op(self, x, acc))
    }

    pub fn opt(&mut self, x: NodeId) -> NodeId {
        self.add(ExprKind::Opt, Some(x), None)
    }

    pub fn many(&mut self, x: NodeId) -> NodeId {
        self.add(ExprKind::Many, Some(x), None)
    }

    pub fn some(&mut self, x: NodeId) -> NodeId {
        self.add(ExprKind::Some, Some(x), None)
    }

    pub fn try_(&mut self, x: NodeId) -> NodeId {
        self.add(ExprKind::Try, Some(x), None)
    }

    pub fn has(&mut self, x: NodeId) -> NodeId {
        self.add(ExprKind::Has, Some(x), None)
    }

    pub fn not(&mut self, x: NodeId) -> NodeId {
        self.add(ExprKind::Not, Some(x), None)
    }

    /// Reference to a rule by name; resolved in `finish()`.
    pub fn id(&mut self, name: &str) -> NodeId {
        let node = self.add(ExprKind::Id { target: 0 }, None, None);
        self.unresolved.push((node, name.to_string()));
        node
    }

    /// Define a rule. The first rule defined is the grammar's entry point.
    pub fn rule(&mut self, name: &str, body: NodeId) -> NodeId {
        let node = self.add(
            ExprKind::Rule {
                name: name.to_string(),
            },
            Some(body),
            None,
        );
        let previous = self.rules.insert(name.to_string(), node);
        if previous.is_some() {
            panic!("rule `{name}` is defined twice");
        }
        node
    }

    /// Resolve deferred references and seal the arena.
    ///
    /// Panics on a reference to an undefined rule: name binding is the
    /// caller's contract, exactly as a null child slot would be.
    pub fn finish(mut self) -> Grammar {
        for (node, name) in std::mem::take(&mut self.unresolved) {
            let target = *self
                .rules
                .get(&name)
                .unwrap_or_else(|| panic!("reference to undefined rule `{name}`"));
            self.nodes[node as usize].kind = ExprKind::Id { target };
        }
        let rules = self.rules.values().copied().collect();
        Grammar::new(
            self.nodes,
            rules,
            self.actions.into_iter().collect(),
            self.markers.into_iter().collect(),
            self.tokens.into_iter().collect(),
            self.mode,
        )
    }
}
