//! Tests for grammar construction and the dump printer.

use super::*;

#[test]
fn sequence_with_action() {
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    let b = g.chr('b');
    let done = g.act("done", 0);
    let body = g.seq_all(&[a, b, done]);
    g.rule("r", body);

    let grammar = g.finish();
    insta::assert_snapshot!(grammar.dump(), @"r = 'a' 'b' @0done");
}

#[test]
fn choice_parenthesized_inside_sequence() {
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    let b = g.chr('b');
    let alt = g.alt(a, b);
    let c = g.chr('c');
    let body = g.seq(alt, c);
    g.rule("r", body);

    let grammar = g.finish();
    insta::assert_snapshot!(grammar.dump(), @"r = ('a' / 'b') 'c'");
}

#[test]
fn postfix_operators() {
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    let many = g.many(a);
    let b = g.chr('b');
    let c = g.chr('c');
    let seq = g.seq(b, c);
    let rep = g.some(seq);
    let not = g.not(rep);
    let body = g.seq(many, not);
    g.rule("r", body);

    let grammar = g.finish();
    insta::assert_snapshot!(grammar.dump(), @"r = 'a'* (('b' 'c')+)!");
}

#[test]
fn lookahead_and_markers() {
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    let has = g.has(a);
    let m = g.mark("wantA");
    let b = g.chr('b');
    let inner = g.seq(m, b);
    let tried = g.try_(inner);
    let body = g.seq(has, tried);
    g.rule("r", body);

    let grammar = g.finish();
    insta::assert_snapshot!(grammar.dump(), @"r = 'a'& [#wantA 'b']");
}

#[test]
fn terminals_render() {
    let mut g = GrammarBuilder::new();
    let s = g.text("ab");
    let set = g.set("xyz");
    let range = g.range('0', '9');
    let cat = g.category(2);
    let empty = g.text("");
    let drop = g.drop();
    let body = g.seq_all(&[s, set, range, cat, empty, drop]);
    g.rule("r", body);

    let grammar = g.finish();
    insta::assert_snapshot!(grammar.dump(), @r#"r = "ab" <xyz> '0'-'9' cat(2) "" ~"#);
}

#[test]
fn token_grammar_renders_tag_names() {
    let mut g = GrammarBuilder::new().token_mode();
    let int = g.tag("int");
    let plus = g.tag("plus");
    let expr = g.act("expr", 0);
    let body = g.seq_all(&[int, plus, int, expr]);
    g.rule("sum", body);

    let grammar = g.finish();
    assert_eq!(grammar.mode(), InputMode::TokenNames);
    insta::assert_snapshot!(grammar.dump(), @"sum = int plus int @0expr");
}

#[test]
fn forward_and_self_references_resolve() {
    let mut g = GrammarBuilder::new();
    let to_b = g.id("b");
    let a = g.chr('a');
    let a_body = g.seq(a, to_b);
    g.rule("a", a_body);
    let to_a = g.id("a");
    let end = g.text("");
    let b_body = g.alt(to_a, end);
    g.rule("b", b_body);

    let grammar = g.finish();
    insta::assert_snapshot!(grammar.dump(), @r#"
    a = 'a' b
    b = a / ""
    "#);

    // The reference holds the arena index of its rule node, not a copy.
    let (id, _) = grammar
        .iter()
        .find(|(_, n)| matches!(n.kind, ExprKind::Id { .. }))
        .expect("grammar has an Id node");
    let &ExprKind::Id { target } = &grammar.node(id).kind else {
        unreachable!()
    };
    assert!(matches!(grammar.node(target).kind, ExprKind::Rule { .. }));
}

#[test]
fn spans_are_distinct_by_default() {
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    let b = g.chr('b');
    let body = g.seq(a, b);
    g.rule("r", body);

    let grammar = g.finish();
    assert_ne!(grammar.node(a).span, grammar.node(b).span);
}

#[test]
#[should_panic(expected = "undefined rule")]
fn unresolved_reference_panics() {
    let mut g = GrammarBuilder::new();
    let body = g.id("nowhere");
    g.rule("r", body);
    g.finish();
}

#[test]
#[should_panic(expected = "defined twice")]
fn duplicate_rule_panics() {
    let mut g = GrammarBuilder::new();
    let a = g.chr('a');
    g.rule("r", a);
    let b = g.chr('b');
    g.rule("r", b);
}
