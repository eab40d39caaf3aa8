//! Stack-balance analysis: the action-output stack can never underflow.
//!
//! Models the interpreter's semantic-output stack abstractly. Per node the
//! pass derives a net effect (items left behind by a successful run,
//! relative to entry) and a low watermark (the lowest relative depth
//! reached at any point during the run). Net effects resolve from an
//! "unknown" sentinel by fixed-point substitution, which is what makes
//! recursive rules work: an escape alternative pins the value and the
//! recursive alternative is then checked against it.
//!
//! The watermark only ever decreases. For pathological grammars it can
//! decrease forever (each recursion level pops items the level below has
//! not pushed yet), so it is clamped at [`LOW_FLOOR`]; the clamp both
//! bounds the iteration count and stands in for "certainly underflows".

use crate::diagnostics::{GrammarError, GrammarErrorKind};
use crate::grammar::{ExprKind, Grammar, NodeId};

/// Clamp for the low watermark. A transient imbalance deeper than this is
/// indistinguishable from a real underflow; tune here if a legitimate
/// grammar ever hits it.
pub const LOW_FLOOR: i32 = -100;

/// Run the analysis; returns the per-node (net, low) tables on success.
pub fn check(grammar: &Grammar) -> Result<(Vec<Option<i32>>, Vec<i32>), GrammarError> {
    let mut net: Vec<Option<i32>> = vec![None; grammar.len()];

    loop {
        let mut changed = false;
        for &rule in grammar.rules() {
            net_visit(grammar, &mut net, rule, &mut changed)?;
        }
        if !changed {
            break;
        }
    }

    if let Some((id, _)) = grammar.iter().find(|(id, _)| net[*id as usize].is_none()) {
        return Err(GrammarError::new(
            GrammarErrorKind::UnresolvableOutputCount,
            grammar.node(id).span,
        ));
    }

    let mut low = vec![0i32; grammar.len()];
    loop {
        let mut changed = false;
        for &rule in grammar.rules() {
            low_visit(grammar, &net, &mut low, rule, &mut changed);
        }
        if !changed {
            break;
        }
    }

    // Rules are the entry points whose available depth can be zero; a
    // rule's watermark equals its body's.
    for &rule in grammar.rules() {
        if low[rule as usize] < 0 {
            return Err(GrammarError::new(
                GrammarErrorKind::Underflow,
                grammar.node(rule).span,
            ));
        }
    }

    let root = grammar.root();
    match net[root as usize] {
        Some(1) => {}
        Some(n) => {
            return Err(GrammarError::with_message(
                GrammarErrorKind::WrongRootArity,
                grammar.node(root).span,
                format!("parser produces {n} output items, not 1"),
            ));
        }
        None => unreachable!("unresolved net effect survived the resolution check"),
    }

    Ok((net, low))
}

/// One postorder pass of net-effect resolution.
fn net_visit(
    grammar: &Grammar,
    net: &mut [Option<i32>],
    id: NodeId,
    changed: &mut bool,
) -> Result<(), GrammarError> {
    for child in grammar.node(id).children() {
        net_visit(grammar, net, child, changed)?;
    }

    let node = grammar.node(id);
    let value = match &node.kind {
        ExprKind::Char { .. }
        | ExprKind::Str { .. }
        | ExprKind::Set { .. }
        | ExprKind::Range { .. }
        | ExprKind::Category { .. }
        | ExprKind::Tag { .. }
        | ExprKind::Mark { .. }
        | ExprKind::Drop => Some(0),

        ExprKind::Act { arity, .. } => Some(1 - *arity as i32),

        ExprKind::Rule { .. } => net[grammar.operand(id) as usize],
        ExprKind::Id { target } => net[*target as usize],
        ExprKind::Try => net[grammar.operand(id) as usize],

        // Lookahead restores the stack wholesale.
        ExprKind::Has | ExprKind::Not => Some(0),

        // A repetition runs its body zero or more times, so the body must
        // be exactly neutral for the total to be defined.
        ExprKind::Opt | ExprKind::Many | ExprKind::Some => {
            let x = grammar.operand(id);
            if let Some(n) = net[x as usize]
                && n != 0
            {
                return Err(GrammarError::new(
                    GrammarErrorKind::NonZeroRepetitionOutput,
                    node.span,
                ));
            }
            Some(0)
        }

        ExprKind::And => {
            let (x, y) = grammar.operands(id);
            match (net[x as usize], net[y as usize]) {
                (Some(a), Some(b)) => Some(a + b),
                _ => None,
            }
        }
        ExprKind::Or => {
            let (x, y) = grammar.operands(id);
            match (net[x as usize], net[y as usize]) {
                (Some(a), Some(b)) if a != b => {
                    return Err(GrammarError::new(
                        GrammarErrorKind::UnequalChoiceOutputs,
                        node.span,
                    ));
                }
                (Some(a), _) => Some(a),
                (None, b) => b,
            }
        }
    };

    if let Some(v) = value {
        match net[id as usize] {
            None => {
                net[id as usize] = Some(v);
                *changed = true;
            }
            // Resolved at most once; recomputation from stable inputs must
            // reproduce the same value.
            Some(old) => debug_assert_eq!(old, v, "net effect changed after resolution (N{id})"),
        }
    }
    Ok(())
}

/// One postorder pass of watermark lowering.
fn low_visit(
    grammar: &Grammar,
    net: &[Option<i32>],
    low: &mut [i32],
    id: NodeId,
    changed: &mut bool,
) {
    for child in grammar.node(id).children() {
        low_visit(grammar, net, low, child, changed);
    }

    let node = grammar.node(id);
    let value = match &node.kind {
        ExprKind::Char { .. }
        | ExprKind::Str { .. }
        | ExprKind::Set { .. }
        | ExprKind::Range { .. }
        | ExprKind::Category { .. }
        | ExprKind::Tag { .. }
        | ExprKind::Mark { .. }
        | ExprKind::Drop => 0,

        // An action pops its operands before pushing its result.
        ExprKind::Act { arity, .. } => -(*arity as i32),

        ExprKind::Rule { .. }
        | ExprKind::Try
        | ExprKind::Opt
        | ExprKind::Many
        | ExprKind::Some
        | ExprKind::Has
        | ExprKind::Not => low[grammar.operand(id) as usize],
        ExprKind::Id { target } => low[*target as usize],

        ExprKind::And => {
            let (x, y) = grammar.operands(id);
            let nx = net[x as usize].expect("net resolved before the watermark pass");
            low[x as usize].min(nx + low[y as usize])
        }
        ExprKind::Or => {
            let (x, y) = grammar.operands(id);
            low[x as usize].min(low[y as usize])
        }
    };

    let value = value.max(LOW_FLOOR);
    if value < low[id as usize] {
        low[id as usize] = value;
        *changed = true;
    }
}
