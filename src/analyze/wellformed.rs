//! Well-formedness analysis: termination and backtrack-safety proofs.
//!
//! Computes seven boolean flags per node by iterating whole-graph postorder
//! passes to a fixed point. Rules may reference each other cyclically, so a
//! single bottom-up pass is not enough; `Id` nodes copy their referent's
//! current flags instead of being traversed through, which keeps every pass
//! a finite tree walk.
//!
//! The fixed point runs in two stages. The behavior flags (can succeed /
//! fail, with / without consuming input, plus the action-visibility pair)
//! use only conjunction and disjunction over child flags, so they grow
//! monotonically from all-false. The termination flag reads the *negation*
//! of "can succeed without consuming", so it is iterated separately after
//! the behavior flags have converged, at which point that negation is a
//! constant and the second stage is monotone too.

use crate::diagnostics::{GrammarError, GrammarErrorKind};
use crate::grammar::{ExprKind, Grammar, NodeId};

/// Per-node behavior flags. Once a flag is set within one run it is never
/// cleared again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Can succeed without consuming input.
    pub succ_none: bool,
    /// Can succeed while consuming input.
    pub succ_some: bool,
    /// Can fail without consuming input.
    pub fail_none: bool,
    /// Can fail after consuming input.
    pub fail_some: bool,
    /// Free of potential infinite loops.
    pub well_formed: bool,
    /// Subtree contains an action or a drop.
    pub has_actions: bool,
    /// Subtree can fire an action or drop before any input is consumed.
    pub acts_early: bool,
}

/// Compute all flags to a fixed point, then reject ill-formed constructs.
pub fn check(grammar: &Grammar) -> Result<Vec<Flags>, GrammarError> {
    let mut flags = vec![Flags::default(); grammar.len()];

    iterate(grammar, &mut flags, merge_behavior);
    iterate(grammar, &mut flags, merge_termination);

    if let Some(loop_node) = deepest_ill_formed(grammar, &flags) {
        return Err(GrammarError::new(
            GrammarErrorKind::InfiniteLoop,
            grammar.node(loop_node).span,
        ));
    }
    check_backtrack_safety(grammar, &flags)?;
    Ok(flags)
}

/// Repeat whole-graph postorder passes until nothing changes.
fn iterate(
    grammar: &Grammar,
    flags: &mut [Flags],
    merge: fn(&Grammar, &mut [Flags], NodeId) -> bool,
) {
    loop {
        let mut changed = false;
        for &rule in grammar.rules() {
            postorder(grammar, flags, rule, merge, &mut changed);
        }
        if !changed {
            break;
        }
    }
}

fn postorder(
    grammar: &Grammar,
    flags: &mut [Flags],
    id: NodeId,
    merge: fn(&Grammar, &mut [Flags], NodeId) -> bool,
    changed: &mut bool,
) {
    for child in grammar.node(id).children() {
        postorder(grammar, flags, child, merge, changed);
    }
    if merge(grammar, flags, id) {
        *changed = true;
    }
}

/// Recompute and merge the six behavior flags of one node. Returns whether
/// anything was newly set.
fn merge_behavior(grammar: &Grammar, flags: &mut [Flags], id: NodeId) -> bool {
    let next = behavior(grammar, flags, id);
    let current = &mut flags[id as usize];
    let grown = Flags {
        succ_none: current.succ_none | next.succ_none,
        succ_some: current.succ_some | next.succ_some,
        fail_none: current.fail_none | next.fail_none,
        fail_some: current.fail_some | next.fail_some,
        well_formed: current.well_formed,
        has_actions: current.has_actions | next.has_actions,
        acts_early: current.acts_early | next.acts_early,
    };
    // Monotone transfer functions can only add flags on recomputation.
    debug_assert!(
        !(current.succ_none && !next.succ_none) && !(current.fail_none && !next.fail_none),
        "behavior flags must never clear once set (node N{id})"
    );
    let changed = grown != *current;
    *current = grown;
    changed
}

/// Behavior transfer function: the full flag set one pass derives for a
/// node from its children's current flags.
fn behavior(grammar: &Grammar, flags: &[Flags], id: NodeId) -> Flags {
    let f = |id: NodeId| flags[id as usize];
    let node = grammar.node(id);
    match &node.kind {
        ExprKind::Rule { .. } => f(grammar.operand(id)),
        ExprKind::Id { target } => f(*target),

        // Non-empty terminals either consume one unit and succeed or fail
        // in place.
        ExprKind::Char { .. }
        | ExprKind::Range { .. }
        | ExprKind::Category { .. }
        | ExprKind::Tag { .. } => Flags {
            succ_some: true,
            fail_none: true,
            ..Flags::default()
        },
        ExprKind::Str { text } => {
            if text.is_empty() {
                Flags {
                    succ_none: true,
                    ..Flags::default()
                }
            } else {
                Flags {
                    succ_some: true,
                    fail_none: true,
                    ..Flags::default()
                }
            }
        }
        ExprKind::Set { chars } => {
            if chars.is_empty() {
                Flags {
                    fail_none: true,
                    ..Flags::default()
                }
            } else {
                Flags {
                    succ_some: true,
                    fail_none: true,
                    ..Flags::default()
                }
            }
        }

        ExprKind::Mark { .. } => Flags {
            succ_none: true,
            ..Flags::default()
        },
        ExprKind::Act { .. } | ExprKind::Drop => Flags {
            succ_none: true,
            has_actions: true,
            acts_early: true,
            ..Flags::default()
        },

        ExprKind::And => {
            let (x, y) = grammar.operands(id);
            let (x, y) = (f(x), f(y));
            Flags {
                succ_none: x.succ_none && y.succ_none,
                succ_some: (x.succ_some && y.succ_some)
                    || (x.succ_some && y.succ_none)
                    || (x.succ_none && y.succ_some),
                fail_none: x.fail_none || (x.succ_none && y.fail_none),
                fail_some: x.fail_some
                    || (x.succ_none && y.fail_some)
                    || (x.succ_some && (y.fail_none || y.fail_some)),
                well_formed: false,
                has_actions: x.has_actions || y.has_actions,
                acts_early: x.acts_early || (x.succ_none && y.acts_early),
            }
        }
        ExprKind::Or => {
            let (x, y) = grammar.operands(id);
            let (x, y) = (f(x), f(y));
            Flags {
                succ_none: x.succ_none || (x.fail_none && y.succ_none),
                succ_some: x.succ_some || (x.fail_none && y.succ_some),
                fail_none: x.fail_none && y.fail_none,
                fail_some: x.fail_some || (x.fail_none && y.fail_some),
                well_formed: false,
                has_actions: x.has_actions || y.has_actions,
                acts_early: x.acts_early || (x.fail_none && y.acts_early),
            }
        }

        ExprKind::Opt => {
            let x = f(grammar.operand(id));
            Flags {
                succ_none: x.fail_none || x.succ_none,
                succ_some: x.succ_some,
                fail_some: x.fail_some,
                has_actions: x.has_actions,
                acts_early: x.acts_early,
                ..Flags::default()
            }
        }
        ExprKind::Many => {
            let x = f(grammar.operand(id));
            Flags {
                succ_none: x.fail_none,
                succ_some: x.succ_some && x.fail_none,
                fail_some: x.fail_some,
                has_actions: x.has_actions,
                acts_early: x.acts_early,
                ..Flags::default()
            }
        }
        ExprKind::Some => {
            let x = f(grammar.operand(id));
            Flags {
                succ_some: x.succ_some && x.fail_none,
                fail_none: x.fail_none,
                fail_some: x.fail_some,
                has_actions: x.has_actions,
                acts_early: x.acts_early,
                ..Flags::default()
            }
        }

        ExprKind::Try => {
            let x = f(grammar.operand(id));
            Flags {
                succ_none: x.succ_none,
                succ_some: x.succ_some,
                // A failure anywhere inside is rewound to the entry point.
                fail_none: x.fail_none || x.fail_some,
                has_actions: x.has_actions,
                acts_early: x.acts_early,
                ..Flags::default()
            }
        }
        ExprKind::Has => {
            let x = f(grammar.operand(id));
            Flags {
                succ_none: x.succ_none || x.succ_some,
                fail_none: x.fail_none || x.fail_some,
                has_actions: x.has_actions,
                ..Flags::default()
            }
        }
        // Negation swaps success and failure but not the progress side:
        // the cursor is always restored, so the outcome never consumes.
        ExprKind::Not => {
            let x = f(grammar.operand(id));
            Flags {
                succ_none: x.fail_none || x.fail_some,
                fail_none: x.succ_none || x.succ_some,
                has_actions: x.has_actions,
                ..Flags::default()
            }
        }
    }
}

/// Termination-flag transfer, merged monotonically. Runs only after the
/// behavior flags have converged.
fn merge_termination(grammar: &Grammar, flags: &mut [Flags], id: NodeId) -> bool {
    let wf = |id: NodeId| flags[id as usize].well_formed;
    let succ_none = |id: NodeId| flags[id as usize].succ_none;
    let node = grammar.node(id);
    let next = match &node.kind {
        ExprKind::Char { .. }
        | ExprKind::Str { .. }
        | ExprKind::Set { .. }
        | ExprKind::Range { .. }
        | ExprKind::Category { .. }
        | ExprKind::Tag { .. }
        | ExprKind::Mark { .. }
        | ExprKind::Act { .. }
        | ExprKind::Drop => true,
        ExprKind::Rule { .. } => wf(grammar.operand(id)),
        ExprKind::Id { target } => wf(*target),
        ExprKind::And => {
            let (x, y) = grammar.operands(id);
            wf(x) && (wf(y) || !succ_none(x))
        }
        ExprKind::Or => {
            let (x, y) = grammar.operands(id);
            wf(x) && wf(y)
        }
        ExprKind::Opt | ExprKind::Try | ExprKind::Has | ExprKind::Not => wf(grammar.operand(id)),
        // A repetition whose body can match without consuming input loops
        // forever: the canonical ill-formed construct.
        ExprKind::Many | ExprKind::Some => {
            let x = grammar.operand(id);
            wf(x) && !succ_none(x)
        }
    };
    let current = &mut flags[id as usize];
    if next && !current.well_formed {
        current.well_formed = true;
        return true;
    }
    false
}

/// Find the most deeply nested node whose termination flag is still unset.
fn deepest_ill_formed(grammar: &Grammar, flags: &[Flags]) -> Option<NodeId> {
    let mut best: Option<(usize, NodeId)> = None;
    for &rule in grammar.rules() {
        descend(grammar, flags, rule, 0, &mut best);
    }
    best.map(|(_, id)| id)
}

fn descend(
    grammar: &Grammar,
    flags: &[Flags],
    id: NodeId,
    depth: usize,
    best: &mut Option<(usize, NodeId)>,
) {
    for child in grammar.node(id).children() {
        descend(grammar, flags, child, depth + 1, best);
    }
    if !flags[id as usize].well_formed && best.map(|(d, _)| depth > d).unwrap_or(true) {
        *best = Some((depth, id));
    }
}

/// Reject choices and repetitions whose backtracking could be observed.
///
/// Backtracking abandons an operand only when it made no progress, and
/// buffered actions are only safe to discard while nothing has been
/// flushed. Two conditions per site: the retried operand must be *able* to
/// fail without progress (otherwise the fallback or the empty exit is
/// unreachable), and it must not be able to fire an action before
/// progressing (an empty-string match flushes the buffer, making an
/// abandoned attempt observable).
fn check_backtrack_safety(grammar: &Grammar, flags: &[Flags]) -> Result<(), GrammarError> {
    for (id, node) in grammar.iter() {
        match node.kind {
            ExprKind::Or => {
                let (x, y) = grammar.operands(id);
                if !flags[x as usize].fail_none {
                    return Err(GrammarError::new(
                        GrammarErrorKind::UnreachableAlternative,
                        grammar.node(y).span,
                    ));
                }
                if flags[x as usize].acts_early {
                    return Err(GrammarError::with_message(
                        GrammarErrorKind::ActsWithoutProgressing,
                        grammar.node(x).span,
                        "alternative can act without progressing",
                    ));
                }
            }
            ExprKind::Opt | ExprKind::Many | ExprKind::Some => {
                let x = grammar.operand(id);
                if !flags[x as usize].fail_none {
                    return Err(GrammarError::new(
                        GrammarErrorKind::UnreachableAlternative,
                        node.span,
                    ));
                }
                if flags[x as usize].acts_early {
                    return Err(GrammarError::with_message(
                        GrammarErrorKind::ActsWithoutProgressing,
                        grammar.node(x).span,
                        "repeated component can act without progressing",
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
