//! Dump helpers for grammar inspection and testing.
//!
//! Formatted output for [`Grammar`] arenas, suitable for snapshot testing
//! and debugging: one line per rule in a PEG-like surface syntax, and an
//! optional per-node annotation listing.

use std::fmt::Write;

use super::{ExprKind, Grammar, NodeId};
use crate::analyze::Analysis;

impl Grammar {
    /// Render every rule as `name = expression`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, &rule) in self.rules.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let ExprKind::Rule { name } = &self.node(rule).kind else {
                panic!("rule table entry N{rule} is not a Rule node");
            };
            write!(out, "{name} = ").expect("String write never fails");
            self.render(self.operand(rule), &mut out);
        }
        out
    }

    /// Render every node with its converged annotations, in arena order.
    pub fn dump_annotated(&self, analysis: &Analysis) -> String {
        let mut out = String::new();
        for (id, node) in self.iter() {
            if id > 0 {
                out.push('\n');
            }
            let flags = &analysis.flags[id as usize];
            let mut set = Vec::new();
            for (on, label) in [
                (flags.succ_none, "sn"),
                (flags.succ_some, "sp"),
                (flags.fail_none, "fn"),
                (flags.fail_some, "fp"),
                (flags.well_formed, "wf"),
                (flags.has_actions, "aa"),
                (flags.acts_early, "ab"),
            ] {
                if on {
                    set.push(label);
                }
            }
            let net = match analysis.net[id as usize] {
                Some(n) => n.to_string(),
                None => "?".to_string(),
            };
            write!(
                out,
                "N{id}: {} {{{}}} net={net} low={}",
                self.label(id, node),
                set.join(" "),
                analysis.low[id as usize],
            )
            .expect("String write never fails");
        }
        out
    }

    /// Short per-node label for annotated dumps.
    fn label(&self, _id: NodeId, node: &super::Node) -> String {
        match &node.kind {
            ExprKind::Rule { name } => format!("rule {name}"),
            ExprKind::Id { target } => match &self.node(*target).kind {
                ExprKind::Rule { name } => format!("id {name}"),
                _ => panic!("id target N{target} is not a Rule node"),
            },
            kind @ (ExprKind::Or
            | ExprKind::And
            | ExprKind::Opt
            | ExprKind::Many
            | ExprKind::Some
            | ExprKind::Try
            | ExprKind::Has
            | ExprKind::Not) => kind.to_string(),
            kind => {
                let mut out = String::new();
                self.render_leaf(kind, &mut out);
                out
            }
        }
    }

    fn render(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        match &node.kind {
            ExprKind::Or => {
                let (x, y) = self.operands(id);
                self.render(x, out);
                out.push_str(" / ");
                self.render(y, out);
            }
            ExprKind::And => {
                let (x, y) = self.operands(id);
                self.render_tight(x, out);
                out.push(' ');
                self.render_tight(y, out);
            }
            ExprKind::Opt => self.render_postfix(id, '?', out),
            ExprKind::Many => self.render_postfix(id, '*', out),
            ExprKind::Some => self.render_postfix(id, '+', out),
            ExprKind::Has => self.render_postfix(id, '&', out),
            ExprKind::Not => self.render_postfix(id, '!', out),
            ExprKind::Try => {
                out.push('[');
                self.render(self.operand(id), out);
                out.push(']');
            }
            ExprKind::Rule { name } => out.push_str(name),
            ExprKind::Id { target } => match &self.node(*target).kind {
                ExprKind::Rule { name } => out.push_str(name),
                _ => panic!("id target N{target} is not a Rule node"),
            },
            kind => self.render_leaf(kind, out),
        }
    }

    /// Render as an `And` operand: choices need parentheses.
    fn render_tight(&self, id: NodeId, out: &mut String) {
        if matches!(self.node(id).kind, ExprKind::Or) {
            out.push('(');
            self.render(id, out);
            out.push(')');
        } else {
            self.render(id, out);
        }
    }

    fn render_postfix(&self, id: NodeId, op: char, out: &mut String) {
        let x = self.operand(id);
        if self.is_atom(x) {
            self.render(x, out);
        } else {
            out.push('(');
            self.render(x, out);
            out.push(')');
        }
        out.push(op);
    }

    fn is_atom(&self, id: NodeId) -> bool {
        let kind = &self.node(id).kind;
        kind.is_terminal()
            || matches!(
                kind,
                ExprKind::Id { .. }
                    | ExprKind::Mark { .. }
                    | ExprKind::Act { .. }
                    | ExprKind::Drop
                    | ExprKind::Try
            )
    }

    fn render_leaf(&self, kind: &ExprKind, out: &mut String) {
        match kind {
            ExprKind::Char { ch } => {
                let _ = write!(out, "'{ch}'");
            }
            ExprKind::Str { text } => {
                let _ = write!(out, "\"{text}\"");
            }
            ExprKind::Set { chars } => {
                let _ = write!(out, "<{chars}>");
            }
            ExprKind::Range { lo, hi } => {
                let _ = write!(out, "'{lo}'-'{hi}'");
            }
            ExprKind::Category { index } => {
                let _ = write!(out, "cat({index})");
            }
            ExprKind::Tag { token } => out.push_str(self.token_name(*token)),
            ExprKind::Mark { marker } => {
                let _ = write!(out, "#{}", self.marker_name(*marker));
            }
            ExprKind::Act { action, arity } => {
                let _ = write!(out, "@{arity}{}", self.action_name(*action));
            }
            ExprKind::Drop => out.push('~'),
            kind => panic!("render_leaf on non-leaf kind {kind:?}"),
        }
    }
}
