use crate::notation::{Head, Notation, Symbol, Term, TermNode};

#[test]
fn test_merge_prefers_incoming_entries() {
    let key = Symbol::new("k");
    let mut a = Notation::new();
    a.put(
        Some(key.clone()),
        TermNode::new(Head::ProductList, vec![Term::int(2), Term::sym("#x")]),
    );
    let mut b = Notation::new();
    b.put(
        Some(key.clone()),
        TermNode::new(Head::ProductList, vec![Term::int(2), Term::int(3)]),
    );
    a.merge(&b);
    // The rebuilt node replaces the stale one under the shared key.
    let node = a.get(&Term::Sym(key)).unwrap();
    assert_eq!(node.args, vec![Term::int(2), Term::int(3)]);
    assert_eq!(a.len(), 1);
}

#[test]
fn test_merge_adds_missing_entries() {
    let mut a = Notation::new();
    let kept = a.define(Head::SumList, vec![Term::sym("x"), Term::sym("y")]);
    let mut b = Notation::new();
    let added = b.define(Head::Group, vec![Term::sym("z")]);
    a.merge(&b);
    assert!(a.get(&kept).is_some());
    assert!(a.get(&added).is_some());
    assert_eq!(a.len(), 2);
}

#[test]
fn test_select_filters_by_head_and_arity() {
    let mut n = Notation::new();
    n.define(Head::SumList, vec![Term::sym("x"), Term::sym("y")]);
    n.define(Head::SumList, vec![Term::sym("a"), Term::sym("b"), Term::sym("c")]);
    n.define(Head::Group, vec![Term::sym("z")]);
    assert_eq!(n.select(&Head::SumList, None).count(), 2);
    assert_eq!(n.select(&Head::SumList, Some(3)).count(), 1);
    assert_eq!(n.select(&Head::Negation, None).count(), 0);
}

#[test]
fn test_fresh_symbols_never_collide() {
    let a = Symbol::fresh();
    let b = Symbol::fresh();
    assert_ne!(a, b);
}
