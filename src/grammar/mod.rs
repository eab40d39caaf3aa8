//! Bound expression graphs for parsing expression grammars.
//!
//! The graph uses index-based node references (`NodeId`) with nodes stored
//! in a flat `Vec` (an arena). Rules may reference themselves or each other:
//! an `Id` node carries the arena index of the `Rule` it names, never an
//! owning pointer, so the arena alone owns every node and recursion creates
//! no ownership cycle.
//!
//! A `Grammar` is produced fully bound: rule references, marker/action/tag
//! indices and terminal code points are already resolved (the textual
//! grammar syntax and name binding live upstream). The structural graph is
//! immutable; analysis results live in side tables keyed by `NodeId`.

mod build;
mod dump;

#[cfg(test)]
mod build_tests;

pub use build::GrammarBuilder;

use rowan::TextRange;

/// Index into `Grammar::nodes`.
pub type NodeId = u32;

/// How the interpreter reads its input, decided upstream from the kinds of
/// terminals the grammar uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Input is a sequence of Unicode code points.
    #[default]
    CodePoints,
    /// Input is a sequence of whitespace-separated token names.
    TokenNames,
}

/// Operator kind plus kind-specific payload.
///
/// Child expressions are *not* stored here; they live in the `lhs`/`rhs`
/// slots of [`Node`] so traversals stay uniform across kinds. The one
/// cross-reference, `Id::target`, points at a `Rule` node and is never
/// followed by structural traversals (it may point backwards, forwards, or
/// at the enclosing rule).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// Named definition; body in `lhs`.
    Rule { name: String },
    /// Reference to the `Rule` node at `target`.
    Id { target: NodeId },
    /// Ordered choice; first alternative in `lhs`, fallback in `rhs`.
    Or,
    /// Sequence; `lhs` then `rhs`.
    And,
    /// Zero-or-one repetition of `lhs`.
    Opt,
    /// Zero-or-more repetition of `lhs`.
    Many,
    /// One-or-more repetition of `lhs`.
    Some,
    /// Probe `lhs` without effects, then on success run it for real.
    Try,
    /// Positive lookahead over `lhs`.
    Has,
    /// Negative lookahead over `lhs`.
    Not,
    /// Record an expected-item name for failure diagnostics.
    Mark { marker: u32 },
    /// Match one code point.
    Char { ch: char },
    /// Match a literal string; the empty string matches without consuming.
    Str { text: String },
    /// Match one code point from a set; the empty set always fails.
    Set { chars: String },
    /// Match one code point in an inclusive range.
    Range { lo: char, hi: char },
    /// Match one code point in a character category (classifier-defined).
    Category { index: u32 },
    /// Match one token by name (token-name input only).
    Tag { token: u32 },
    /// Reset the action flush point without producing output.
    Drop,
    /// Buffered semantic action consuming `arity` prior outputs.
    Act { action: u32, arity: u32 },
}

impl std::fmt::Display for ExprKind {
    /// Bare operator name, without payloads; payload-aware rendering lives
    /// in the dump printer.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ExprKind::Rule { .. } => "rule",
            ExprKind::Id { .. } => "id",
            ExprKind::Or => "or",
            ExprKind::And => "and",
            ExprKind::Opt => "opt",
            ExprKind::Many => "many",
            ExprKind::Some => "some",
            ExprKind::Try => "try",
            ExprKind::Has => "has",
            ExprKind::Not => "not",
            ExprKind::Mark { .. } => "mark",
            ExprKind::Char { .. } => "char",
            ExprKind::Str { .. } => "str",
            ExprKind::Set { .. } => "set",
            ExprKind::Range { .. } => "range",
            ExprKind::Category { .. } => "category",
            ExprKind::Tag { .. } => "tag",
            ExprKind::Drop => "drop",
            ExprKind::Act { .. } => "act",
        })
    }
}

impl ExprKind {
    /// True for the kinds that match input directly.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExprKind::Char { .. }
                | ExprKind::Str { .. }
                | ExprKind::Set { .. }
                | ExprKind::Range { .. }
                | ExprKind::Category { .. }
                | ExprKind::Tag { .. }
        )
    }
}

/// One expression node: kind, up to two child slots, and a source span for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: ExprKind,
    pub lhs: Option<NodeId>,
    pub rhs: Option<NodeId>,
    pub span: TextRange,
}

impl Node {
    /// Child slots in evaluation order. `Id::target` is deliberately not a
    /// child: following it would turn tree walks into graph walks.
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        self.lhs.into_iter().chain(self.rhs)
    }
}

/// A bound, name-resolved grammar: node arena, ordered rule list (entry
/// point = first rule), resolved name tables, and the input mode.
#[derive(Debug, Clone)]
pub struct Grammar {
    nodes: Vec<Node>,
    rules: Vec<NodeId>,
    actions: Vec<String>,
    markers: Vec<String>,
    tokens: Vec<String>,
    mode: InputMode,
}

impl Grammar {
    pub(crate) fn new(
        nodes: Vec<Node>,
        rules: Vec<NodeId>,
        actions: Vec<String>,
        markers: Vec<String>,
        tokens: Vec<String>,
        mode: InputMode,
    ) -> Self {
        Self {
            nodes,
            rules,
            actions,
            markers,
            tokens,
            mode,
        }
    }

    /// Get node by ID.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the grammar has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes with their IDs, in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (i as NodeId, n))
    }

    /// The `Rule` nodes in definition order.
    pub fn rules(&self) -> &[NodeId] {
        &self.rules
    }

    /// The designated entry point (first rule).
    pub fn root(&self) -> NodeId {
        *self
            .rules
            .first()
            .expect("grammar must define at least one rule")
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn action_name(&self, index: u32) -> &str {
        &self.actions[index as usize]
    }

    pub fn marker_name(&self, index: u32) -> &str {
        &self.markers[index as usize]
    }

    pub fn token_name(&self, index: u32) -> &str {
        &self.tokens[index as usize]
    }

    /// The single operand of a unary node (or a rule's body).
    ///
    /// Panics when the slot is empty: the binder guarantees shape, so a miss
    /// is a programmer error, not a user error.
    pub(crate) fn operand(&self, id: NodeId) -> NodeId {
        self.node(id)
            .lhs
            .unwrap_or_else(|| panic!("node N{id} has no operand"))
    }

    /// Both operands of a binary (`And`/`Or`) node.
    pub(crate) fn operands(&self, id: NodeId) -> (NodeId, NodeId) {
        let node = self.node(id);
        match (node.lhs, node.rhs) {
            (Some(l), Some(r)) => (l, r),
            _ => panic!("node N{id} is missing a binary operand"),
        }
    }
}
