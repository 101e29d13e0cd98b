use crate::comparer::{
    resolve, s_equal, unify, unify_one, Binding, Env, Param, ParamKind, Pattern, Scope,
};
use crate::limits::ResourceLimits;
use crate::notation::{Head, Notation, Term, TermNode};
use crate::parser;
use crate::value::Value;

fn parse(input: &str) -> (Term, Notation) {
    parser::parse(input, &ResourceLimits::default()).unwrap()
}

fn matches(
    pattern: &str,
    params: Vec<(&str, Param)>,
    subject: &str,
) -> Option<crate::comparer::Bindings> {
    let p = Pattern::from_markup(pattern, params).unwrap();
    let (root, n) = parse(subject);
    p.match_against(&root, &n, Scope::Root)
}

#[test]
fn test_var_param_binds_leaf() {
    let b = matches("n x", vec![("n", Param::of(ParamKind::Value)), ("x", Param::of(ParamKind::Var))], "3 y")
        .unwrap();
    assert_eq!(b.get("n"), Some(&Binding::One(Term::int(3))));
    assert_eq!(b.get("x"), Some(&Binding::One(Term::sym("y"))));
}

#[test]
fn test_var_param_rejects_node() {
    let params = vec![("x", Param::of(ParamKind::Var))];
    assert!(matches("x+1", params.clone(), "(a b)+1").is_none());
    assert!(matches("x+1", params, "a+1").is_some());
}

#[test]
fn test_value_param_requires_literal() {
    let params = vec![("n", Param::of(ParamKind::Value)), ("x", Param::of(ParamKind::Var))];
    assert!(matches("n x", params, "y z").is_none());
}

#[test]
fn test_integer_param() {
    let p = Pattern::from_markup("n", vec![("n", Param::of(ParamKind::Integer))]).unwrap();
    let n = Notation::new();
    assert!(p.match_against(&Term::int(4), &n, Scope::Root).is_some());
    assert!(p
        .match_against(&Term::Num(Value::Ratio(1, 2)), &n, Scope::Root)
        .is_none());
}

#[test]
fn test_any_param_accepts_node() {
    let b = matches("a", vec![("a", Param::of(ParamKind::Any))], "x+y").unwrap();
    assert!(matches!(b.get("a"), Some(Binding::One(Term::Sym(_)))));
}

#[test]
fn test_single_term_param() {
    let params = vec![("s", Param::of(ParamKind::SingleTerm))];
    let b = matches("s", params.clone(), "(x)").unwrap();
    assert_eq!(b.get("s"), Some(&Binding::One(Term::sym("x"))));
    assert!(matches("s", params, "(x+y)").is_none());
}

#[test]
fn test_repeated_param_must_agree() {
    let params = vec![("x", Param::of(ParamKind::Var))];
    assert!(matches("x+x", params.clone(), "y+y").is_some());
    assert!(matches("x+x", params, "y+z").is_none());
}

#[test]
fn test_sum_matches_as_set() {
    let params = vec![("x", Param::of(ParamKind::Var))];
    let b = matches("1+x", params, "y+1").unwrap();
    assert_eq!(b.get("x"), Some(&Binding::One(Term::sym("y"))));
}

#[test]
fn test_product_matches_as_set() {
    let params = vec![("x", Param::of(ParamKind::Var))];
    let b = matches("a x", params, "y a").unwrap();
    assert_eq!(b.get("x"), Some(&Binding::One(Term::sym("y"))));
}

#[test]
fn test_ellipsis_collects_run() {
    let params = vec![("x", Param::list_of(ParamKind::Var))];
    let b = matches("x ...", params, "a b c").unwrap();
    assert_eq!(
        b.get("x"),
        Some(&Binding::Many(vec![
            Term::sym("a"),
            Term::sym("b"),
            Term::sym("c"),
        ]))
    );
}

#[test]
fn test_ellipsis_leaves_pattern_tail() {
    let params = vec![("x", Param::list_of(ParamKind::Var))];
    let b = matches("x ... z", params.clone(), "a b z").unwrap();
    assert_eq!(
        b.get("x"),
        Some(&Binding::Many(vec![Term::sym("a"), Term::sym("b")]))
    );
    // The run needs at least one element.
    assert!(matches("x ... z", params, "z").is_none());
}

#[test]
fn test_run_index_counts() {
    let params = vec![("k", Param::of(ParamKind::RunIndex))];
    let b = matches("x_k ...", params, "x_1 x_2 x_3").unwrap();
    assert_eq!(b.get("k"), Some(&Binding::One(Term::int(3))));
}

#[test]
fn test_s_equal_commutative_sum() {
    let (a, na) = parse("x+y+1");
    let (b, nb) = parse("1+y+x");
    assert!(s_equal(&a, &na, &b, &nb, Scope::Root));
    let (c, nc) = parse("x-y");
    let (d, nd) = parse("y-x");
    assert!(!s_equal(&c, &nc, &d, &nd, Scope::Root));
}

#[test]
fn test_s_equal_slot_mask() {
    let (a, na) = parse("x^2_i");
    let (b, nb) = parse("x^2_j");
    assert!(!s_equal(&a, &na, &b, &nb, Scope::Root));
    // Masking out the subscript slot makes them equal.
    let mask = Scope::Slots([true, true, true, false]);
    assert!(s_equal(&a, &na, &b, &nb, mask));
}

#[test]
fn test_unify_binds_both_sides() {
    let (a, na) = parse("\\operatorname{p}(#u,q)");
    let (b, nb) = parse("\\operatorname{p}(r,#v)");
    let mut ea = Env::new();
    let mut eb = Env::new();
    assert!(unify(&a, &na, &mut ea, &b, &nb, &mut eb));
    assert_eq!(ea.get("#u"), Some(&Term::sym("r")));
    assert_eq!(eb.get("#v"), Some(&Term::sym("q")));
}

#[test]
fn test_unify_mismatch() {
    let (a, na) = parse("\\operatorname{p}(x)");
    let (b, nb) = parse("\\operatorname{q}(x)");
    let mut ea = Env::new();
    let mut eb = Env::new();
    assert!(!unify(&a, &na, &mut ea, &b, &nb, &mut eb));
}

#[test]
fn test_unify_one_shares_environment() {
    let (a, na) = parse("\\operatorname{p}(#x,#x)");
    let (b, nb) = parse("\\operatorname{p}(3,#y)");
    let mut env = Env::new();
    assert!(unify_one(&a, &na, &b, &nb, &mut env));
    assert_eq!(resolve(&Term::sym("#x"), &env), &Term::int(3));
    assert_eq!(resolve(&Term::sym("#y"), &env), &Term::int(3));
}

#[test]
fn test_quote_group_is_literal() {
    let mut na = Notation::new();
    let qa = na.define_node(
        TermNode::new(Head::Group, vec![Term::sym("#x")]).with_prop("quote", "1"),
    );
    let mut nb = Notation::new();
    let qb = nb.define_node(
        TermNode::new(Head::Group, vec![Term::sym("y")]).with_prop("quote", "1"),
    );
    let mut ea = Env::new();
    let mut eb = Env::new();
    // Quoted variables stand for themselves.
    assert!(!unify(&qa, &na, &mut ea, &qb, &nb, &mut eb));
    assert!(ea.is_empty());

    let mut nc = Notation::new();
    let pa = nc.define(Head::Group, vec![Term::sym("#x")]);
    let mut nd = Notation::new();
    let pb = nd.define(Head::Group, vec![Term::sym("y")]);
    let mut ec = Env::new();
    let mut ed = Env::new();
    assert!(unify(&pa, &nc, &mut ec, &pb, &nd, &mut ed));
    assert_eq!(ec.get("#x"), Some(&Term::sym("y")));
}

#[test]
fn test_resolve_chases_chains() {
    let mut env = Env::new();
    env.insert("#a".into(), Term::sym("#b"));
    env.insert("#b".into(), Term::int(7));
    assert_eq!(resolve(&Term::sym("#a"), &env), &Term::int(7));
    assert_eq!(resolve(&Term::sym("#z"), &env), &Term::sym("#z"));
}
