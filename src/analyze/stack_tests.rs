//! Tests for the output-stack balance analysis.

use crate::diagnostics::{GrammarError, GrammarErrorKind};
use crate::grammar::{Grammar, GrammarBuilder};

use super::stack;

fn err(grammar: &Grammar) -> GrammarError {
    stack::check(grammar).expect_err("analysis should reject this grammar")
}

#[test]
fn single_action_balances() {
    // r = 'a' @0f
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    let act = g.act("f", 0);
    let body = g.seq(a, act);
    let rule = g.rule("r", body);
    let grammar = g.finish();

    let (net, low) = stack::check(&grammar).expect("stack is balanced");
    assert_eq!(net[rule as usize], Some(1));
    assert_eq!(low[rule as usize], 0);
}

#[test]
fn bare_nullary_action_is_a_valid_parser() {
    // r = @0f
    let mut g = GrammarBuilder::new();
    let act = g.act("f", 0);
    let rule = g.rule("r", act);
    let grammar = g.finish();

    let (net, low) = stack::check(&grammar).expect("stack is balanced");
    assert_eq!(net[rule as usize], Some(1));
    assert_eq!(low[rule as usize], 0);
}

#[test]
fn consuming_action_needs_prior_outputs() {
    // r = @1f @0p  — the unary action pops an item nothing has pushed.
    let mut g = GrammarBuilder::new();
    let pop = g.act("f", 1);
    let push = g.act("p", 0);
    let body = g.seq(pop, push);
    let rule = g.rule("r", body);
    let grammar = g.finish();

    let e = err(&grammar);
    assert_eq!(e.kind, GrammarErrorKind::Underflow);
    assert_eq!(e.span, grammar.node(rule).span);
}

#[test]
fn consuming_action_after_producer_is_fine() {
    // r = @0a @1b  — the first action's output feeds the second.
    let mut g = GrammarBuilder::new();
    let push = g.act("a", 0);
    let fold = g.act("b", 1);
    let body = g.seq(push, fold);
    let rule = g.rule("r", body);
    let grammar = g.finish();

    let (net, low) = stack::check(&grammar).expect("stack is balanced");
    assert_eq!(net[rule as usize], Some(1));
    assert_eq!(low[rule as usize], 0);
}

#[test]
fn unequal_choice_arms_rejected() {
    // r = @1a / (@2b 'x')
    let mut g = GrammarBuilder::new();
    let one = g.act("a", 1);
    let two = g.act("b", 2);
    let x = g.chr('x');
    let arm = g.seq(two, x);
    let body = g.alt(one, arm);
    g.rule("r", body);
    let grammar = g.finish();

    let e = err(&grammar);
    assert_eq!(e.kind, GrammarErrorKind::UnequalChoiceOutputs);
    assert_eq!(e.span, grammar.node(body).span);
}

#[test]
fn unbalanced_repetition_body_rejected() {
    // r = ('a' @0f)*  — each iteration would leave an extra item.
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    let act = g.act("f", 0);
    let body = g.seq(a, act);
    let many = g.many(body);
    g.rule("r", many);
    let grammar = g.finish();

    let e = err(&grammar);
    assert_eq!(e.kind, GrammarErrorKind::NonZeroRepetitionOutput);
    assert_eq!(e.span, grammar.node(many).span);
}

#[test]
fn self_reference_never_resolves() {
    // r = r  — no alternative ever pins a concrete count.
    let mut g = GrammarBuilder::new();
    let rec = g.id("r");
    g.rule("r", rec);
    let grammar = g.finish();

    let e = err(&grammar);
    assert_eq!(e.kind, GrammarErrorKind::UnresolvableOutputCount);
    assert_eq!(e.span, grammar.node(rec).span);
}

#[test]
fn recursion_resolves_through_escape_arm() {
    // a = 'x' a / 'y' @0f  — the escape arm pins the count at 1, and the
    // recursive arm is then checked against it.
    let mut g = GrammarBuilder::new();
    let x = g.chr('x');
    let rec = g.id("a");
    let rec_arm = g.seq(x, rec);
    let y = g.chr('y');
    let act = g.act("f", 0);
    let esc_arm = g.seq(y, act);
    let body = g.alt(rec_arm, esc_arm);
    let rule = g.rule("a", body);
    let grammar = g.finish();

    let (net, low) = stack::check(&grammar).expect("stack is balanced");
    assert_eq!(net[rec_arm as usize], Some(1));
    assert_eq!(net[rule as usize], Some(1));
    assert_eq!(low[rule as usize], 0);
}

#[test]
fn empty_parser_produces_nothing() {
    // r = ""
    let mut g = GrammarBuilder::new();
    let empty = g.text("");
    g.rule("r", empty);
    let grammar = g.finish();

    let e = err(&grammar);
    assert_eq!(e.kind, GrammarErrorKind::WrongRootArity);
    assert_eq!(e.message, "parser produces 0 output items, not 1");
}

#[test]
fn lookahead_is_net_neutral() {
    // r = ('a' @0f)& @0g  — the probe's own output never survives, so the
    // lookahead contributes nothing to the surrounding count.
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    let f = g.act("f", 0);
    let inner = g.seq(a, f);
    let has = g.has(inner);
    let out = g.act("g", 0);
    let body = g.seq(has, out);
    let rule = g.rule("r", body);
    let grammar = g.finish();

    let (net, low) = stack::check(&grammar).expect("stack is balanced");
    assert_eq!(net[inner as usize], Some(1));
    assert_eq!(net[has as usize], Some(0));
    assert_eq!(net[rule as usize], Some(1));
    assert_eq!(low[rule as usize], 0);
}

#[test]
fn lookahead_passes_its_watermark_through() {
    // r = ('a' @2f)! @0g @0h @1k  — the probe's pops still count against
    // the depth available at entry.
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    let f = g.act("f", 2);
    let inner = g.seq(a, f);
    let not = g.not(inner);
    let push1 = g.act("g", 0);
    let push2 = g.act("h", 0);
    let fold = g.act("k", 1);
    let body = g.seq_all(&[not, push1, push2, fold]);
    let rule = g.rule("r", body);
    let grammar = g.finish();

    let e = err(&grammar);
    assert_eq!(e.kind, GrammarErrorKind::Underflow);
    assert_eq!(e.span, grammar.node(rule).span);
}

#[test]
fn divergent_recursive_watermark_hits_the_clamp() {
    // a = 'x' @2f a @0p / @0p  — every recursion level pops two items the
    // level below has not produced yet, so the watermark walks down one
    // per iteration until the clamp stops it.
    let grammar = clamp_grammar();
    let e = err(&grammar);
    assert_eq!(e.kind, GrammarErrorKind::Underflow);
}

#[test]
fn full_pipeline_reports_the_clamped_underflow() {
    let grammar = clamp_grammar();
    let e = crate::analyze::check(&grammar).expect_err("pipeline should reject this grammar");
    assert_eq!(e.kind, GrammarErrorKind::Underflow);
}

fn clamp_grammar() -> Grammar {
    let mut g = GrammarBuilder::new();
    let x = g.chr('x');
    let f = g.act("f", 2);
    let rec = g.id("a");
    let p1 = g.act("p", 0);
    let rec_arm = g.seq_all(&[x, f, rec, p1]);
    let esc_arm = g.act("p", 0);
    let body = g.alt(rec_arm, esc_arm);
    g.rule("a", body);
    g.finish()
}

#[test]
fn annotated_dump_lists_converged_tables() {
    // r = @0f 'a'
    let mut g = GrammarBuilder::new();
    let act = g.act("f", 0);
    let a = g.chr('a');
    let body = g.seq(act, a);
    g.rule("r", body);
    let grammar = g.finish();

    let checked = crate::analyze::check(&grammar).expect("grammar passes both checkers");
    insta::assert_snapshot!(grammar.dump_annotated(checked.analysis()), @r"
    N0: @0f {sn wf aa ab} net=1 low=0
    N1: 'a' {sp fn wf} net=0 low=0
    N2: and {sp fn wf aa ab} net=1 low=0
    N3: rule r {sp fn wf aa ab} net=1 low=0
    ");
}
