use crate::limits::ResourceLimits;
use crate::notation::{Head, Notation, Term};
use crate::parser;
use crate::preprocessor::Preprocessor;
use crate::value::Value;
use crate::SymtexError;

fn parse(input: &str) -> (Term, Notation) {
    parser::parse(input, &ResourceLimits::default()).unwrap()
}

fn preprocess(input: &str) -> (Term, Notation) {
    let (root, notation) = parse(input);
    Preprocessor::new(notation, &[]).run(&root).unwrap()
}

#[test]
fn test_sum_wraps_signed_operands() {
    let (root, n) = parse("2+3-x");
    let f = n.get_if(&root, &Head::SumList).unwrap();
    assert_eq!(f.args.len(), 3);
    assert_eq!(f.args[0], Term::int(2));
    let plus = n.get_if(&f.args[1], &Head::Plus).unwrap();
    assert_eq!(plus.args[0], Term::int(3));
    let minus = n.get_if(&f.args[2], &Head::Minus).unwrap();
    assert_eq!(minus.args[0], Term::sym("x"));
}

#[test]
fn test_product_by_juxtaposition() {
    let (root, n) = parse("2 x y");
    let f = n.get_if(&root, &Head::ProductList).unwrap();
    assert_eq!(f.args, vec![Term::int(2), Term::sym("x"), Term::sym("y")]);
}

#[test]
fn test_single_element_chain_collapses() {
    let (root, _) = parse("x");
    assert_eq!(root, Term::sym("x"));
    let (root, _) = parse("7");
    assert_eq!(root, Term::int(7));
}

#[test]
fn test_index_slots() {
    let (root, n) = parse("x^2_i");
    let f = n.get_if(&root, &Head::Index).unwrap();
    assert_eq!(f.args.len(), 5);
    assert_eq!(f.args[0], Term::sym("x"));
    assert_eq!(f.args[1], Term::Empty);
    assert_eq!(f.args[2], Term::Empty);
    assert_eq!(f.args[3], Term::int(2));
    assert_eq!(f.args[4], Term::sym("i"));
}

#[test]
fn test_operatorname_application() {
    let (root, n) = parse("\\operatorname{parent}(a,b)");
    let f = n.get_if(&root, &Head::Apply).unwrap();
    assert_eq!(f.prop("fmt"), Some("operatorname"));
    assert_eq!(f.args[0], Term::sym("parent"));
    let list = n.get_if(&f.args[1], &Head::CommaList).unwrap();
    assert_eq!(list.args, vec![Term::sym("a"), Term::sym("b")]);
}

#[test]
fn test_comparison_keeps_operator() {
    let (root, n) = parse("x \\le y");
    let f = n.get_if(&root, &Head::Comparison).unwrap();
    assert_eq!(f.prop("op"), Some("\\le"));
    assert_eq!(f.args, vec![Term::sym("x"), Term::sym("y")]);
}

#[test]
fn test_fraction_folds_to_ratio() {
    let (root, _) = preprocess("\\frac{2}{3}");
    assert_eq!(root, Term::Num(Value::Ratio(2, 3)));
}

#[test]
fn test_mixed_number_folds() {
    let (root, _) = preprocess("1 \\frac{1}{2}");
    assert_eq!(root, Term::Num(Value::Ratio(3, 2)));
}

#[test]
fn test_variable_leaf() {
    let (root, _) = parse("#x");
    let sym = root.as_sym().unwrap();
    assert!(sym.is_variable());
    assert_eq!(sym.name(), "#x");
}

#[test]
fn test_command_form_carries_attr_slot() {
    let (root, n) = parse("match![n,x] a \\Box b");
    let f = n.get(&root).unwrap();
    assert_eq!(f.head, Head::op("match!"));
    assert_eq!(f.args.len(), 3);
    // args[0] is the attribute block; subformulas follow.
    let attrs = n.get_if(&f.args[0], &Head::CommaList).unwrap();
    assert_eq!(attrs.args, vec![Term::sym("n"), Term::sym("x")]);
    assert_eq!(f.args[1], Term::sym("a"));
    assert_eq!(f.args[2], Term::sym("b"));
}

#[test]
fn test_command_form_without_attrs() {
    let (root, n) = parse("add! (x+y)");
    let f = n.get(&root).unwrap();
    assert_eq!(f.head, Head::op("add!"));
    assert_eq!(f.args[0], Term::Empty);
}

#[test]
fn test_backref() {
    let (root, n) = parse("[[2]]");
    let f = n.get_if(&root, &Head::BackRef).unwrap();
    assert_eq!(f.args, vec![Term::int(2)]);
}

#[test]
fn test_unary_function_recognized() {
    let (root, n) = preprocess("\\sin x");
    let f = n.get_if(&root, &Head::Apply).unwrap();
    assert_eq!(f.args[0], Term::sym("\\sin"));
    assert_eq!(f.args[1], Term::sym("x"));
}

#[test]
fn test_common_function_with_parens() {
    let (root, n) = preprocess("f(y)");
    let f = n.get_if(&root, &Head::Apply).unwrap();
    assert_eq!(f.args[0], Term::sym("f"));
}

#[test]
fn test_parse_error_position() {
    let err = parser::parse("2+", &ResourceLimits::default()).unwrap_err();
    match err {
        SymtexError::Parse { line, .. } => assert_eq!(line, 1),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_input_size_limit() {
    let limits = ResourceLimits { max_input_bytes: 4, ..Default::default() };
    let err = parser::parse("1+2+3", &limits).unwrap_err();
    assert!(matches!(err, SymtexError::InputTooLarge { actual: 5, limit: 4 }));
}

#[test]
fn test_negation() {
    let (root, n) = parse("\\neg\\operatorname{boy}(ann)");
    let f = n.get_if(&root, &Head::Negation).unwrap();
    assert!(n.get_if(&f.args[0], &Head::Apply).is_some());
}

#[test]
fn test_rule_markup_shape() {
    let (root, n) = parse("\\operatorname{p}(#x) \\dashv (\\operatorname{q}(#x), !)");
    let f = n.get_if(&root, &Head::ProductList).unwrap();
    assert_eq!(f.args.len(), 3);
    assert_eq!(f.args[1], Term::sym("\\dashv"));
}
