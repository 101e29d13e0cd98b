use crate::limits::ResourceLimits;
use crate::notation::{Head, Notation, Term, TermNode};
use crate::parser;
use crate::value::Value;
use crate::writer::{count_terms, render};

fn roundtrip(input: &str) -> String {
    let (root, n) = parser::parse(input, &ResourceLimits::default()).unwrap();
    render(&root, &n)
}

#[test]
fn test_leaves() {
    let n = Notation::new();
    assert_eq!(render(&Term::int(5), &n), "5");
    assert_eq!(render(&Term::sym("x"), &n), "x");
    assert_eq!(render(&Term::Num(Value::Ratio(13, 15)), &n), "\\frac{13}{15}");
    assert_eq!(render(&Term::Empty, &n), "");
}

#[test]
fn test_token_gluing() {
    assert_eq!(roundtrip("2 x"), "2 x");
    assert_eq!(roundtrip("x y"), "x y");
    // A brace boundary needs no separator.
    let mut n = Notation::new();
    let t = n.define(
        Head::ProductList,
        vec![Term::Num(Value::Ratio(13, 15)), Term::sym("x")],
    );
    assert_eq!(render(&t, &n), "\\frac{13}{15}x");
}

#[test]
fn test_sum_signs() {
    assert_eq!(roundtrip("2+3-x"), "2+3-x");
}

#[test]
fn test_comparison() {
    assert_eq!(roundtrip("x = y"), "x=y");
    assert_eq!(roundtrip("x \\le y"), "x \\le y");
}

#[test]
fn test_scripts() {
    assert_eq!(roundtrip("x^2"), "x^2");
    assert_eq!(roundtrip("x^2_i"), "x^2_i");
    // Negative and compound scripts are braced.
    let mut n = Notation::new();
    let t = n.define(
        Head::Index,
        vec![
            Term::sym("x"),
            Term::Empty,
            Term::Empty,
            Term::Num(Value::Int(-1)),
            Term::Empty,
        ],
    );
    assert_eq!(render(&t, &n), "x^{-1}");
}

#[test]
fn test_operatorname() {
    assert_eq!(
        roundtrip("\\operatorname{parent}(t,b)"),
        "\\operatorname{parent}(t,b)"
    );
}

#[test]
fn test_group_brackets() {
    assert_eq!(roundtrip("(x+1)"), "(x+1)");
    assert_eq!(roundtrip("|x|"), "|x|");
}

#[test]
fn test_backref() {
    assert_eq!(roundtrip("[[2]]"), "[[2]]");
}

#[test]
fn test_command_form() {
    // A command name already ends in '!', so no separator follows it.
    assert_eq!(
        roundtrip("goal! \\operatorname{boy}(#x)"),
        "goal!\\operatorname{boy}(#x)"
    );
}

#[test]
fn test_text_operator() {
    let mut n = Notation::new();
    let t = n.define(Head::op("\\textit"), vec![Term::Text("True".into())]);
    assert_eq!(render(&t, &n), "\\textit{True}");
}

#[test]
fn test_count_terms() {
    let (root, n) = parser::parse("2 x+1", &ResourceLimits::default()).unwrap();
    assert_eq!(count_terms(&root, &n), 3);
    assert_eq!(count_terms(&Term::sym("x"), &Notation::new()), 1);
    assert_eq!(count_terms(&Term::Empty, &Notation::new()), 0);
}

#[test]
fn test_unary_apply() {
    let mut n = Notation::new();
    let node = TermNode::new(Head::Apply, vec![Term::sym("\\sin"), Term::sym("x")])
        .with_prop("fmt", "unary");
    let t = n.define_node(node);
    assert_eq!(render(&t, &n), "\\sin x");
}
