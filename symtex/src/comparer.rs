//! Structural comparison, pattern matching and unification.
//!
//! [`Pattern`] matches a subject graph against a pattern graph whose
//! designated leaves are parameters. Sum and product chains match as
//! sets unless the pattern spells an ellipsis, which switches the chain
//! to a run-length match. [`unify`] is the bilateral variant used by the
//! resolution engine, where `#`-prefixed symbols on either side bind.
//!
//! Failure to match is an answer, not an error.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::limits::ResourceLimits;
use crate::notation::{Head, Notation, Term};
use crate::parser;
use crate::value::Value;
use crate::writer;
use crate::SymtexResult;

/// What a pattern parameter accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Any leaf (a subject with a node entry is rejected).
    Var,
    /// A numeric literal.
    Value,
    /// A subject rendering to at most one literal token; binds the token.
    SingleTerm,
    /// Anything, including interior nodes.
    Any,
    /// Receives the 1-based run position during ellipsis matching.
    RunIndex,
    /// An integer literal.
    Integer,
}

#[derive(Clone, Copy, Debug)]
pub struct Param {
    pub kind: ParamKind,
    /// Collect every occurrence instead of requiring a single binding.
    pub list: bool,
}

impl Param {
    pub fn of(kind: ParamKind) -> Self {
        Param { kind, list: false }
    }

    pub fn list_of(kind: ParamKind) -> Self {
        Param { kind, list: true }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    One(Term),
    Many(Vec<Term>),
}

pub type Bindings = BTreeMap<String, Binding>;

/// Comparison context: the head of the enclosing chain, or an index-slot
/// mask that excludes script slots from the comparison.
#[derive(Clone, Debug)]
pub enum Scope {
    Root,
    Under(Head),
    Slots([bool; 4]),
}

/// A parsed pattern with its parameter table.
pub struct Pattern {
    root: Term,
    notation: Notation,
    params: HashMap<String, Param>,
}

impl Pattern {
    pub fn new(root: Term, notation: Notation, params: Vec<(&str, Param)>) -> Self {
        let params = params
            .into_iter()
            .map(|(name, p)| (name.to_string(), p))
            .collect();
        Pattern { root, notation, params }
    }

    /// Parses `expr` as the pattern graph.
    pub fn from_markup(expr: &str, params: Vec<(&str, Param)>) -> SymtexResult<Self> {
        let (root, notation) = parser::parse(expr, &ResourceLimits::default())?;
        Ok(Pattern::new(root, notation, params))
    }

    /// Matches `subject` against the pattern, returning the parameter
    /// bindings on success.
    pub fn match_against(
        &self,
        subject: &Term,
        notation: &Notation,
        scope: Scope,
    ) -> Option<Bindings> {
        let index_var = self
            .params
            .iter()
            .find(|(_, p)| p.kind == ParamKind::RunIndex)
            .map(|(name, _)| name.clone());
        let cmp = Comparer {
            pattern_notation: &self.notation,
            params: &self.params,
            index_var,
        };
        let mut subst = Bindings::new();
        if cmp.compare(subject, notation, &self.root, &mut subst, &scope) {
            Some(subst)
        } else {
            None
        }
    }
}

/// Structural equality of two graphs, commutative over sum and product
/// chains.
pub fn s_equal(a: &Term, na: &Notation, b: &Term, nb: &Notation, scope: Scope) -> bool {
    let params = HashMap::new();
    let cmp = Comparer { pattern_notation: nb, params: &params, index_var: None };
    let mut subst = Bindings::new();
    cmp.compare(a, na, b, &mut subst, &scope)
}

/// Structural equality of two argument slices.
pub fn s_equal_args(
    a: &[Term],
    na: &Notation,
    b: &[Term],
    nb: &Notation,
    scope: Scope,
) -> bool {
    let params = HashMap::new();
    let cmp = Comparer { pattern_notation: nb, params: &params, index_var: None };
    let mut subst = Bindings::new();
    cmp.compare_args(a, na, b, &mut subst, &scope)
}

struct Comparer<'a> {
    pattern_notation: &'a Notation,
    params: &'a HashMap<String, Param>,
    index_var: Option<String>,
}

impl<'a> Comparer<'a> {
    fn is_ellipsis(&self, t: &Term) -> bool {
        if let Some(node) = self
            .pattern_notation
            .get_if_any(t, &[Head::Plus, Head::Minus])
        {
            let inner = node.args.first().cloned().unwrap_or(Term::Empty);
            return self.is_ellipsis(&inner);
        }
        t.is_named(crate::notation::ELLIPSIS_NAME)
    }

    fn compare(
        &self,
        a: &Term,
        na: &Notation,
        b: &Term,
        subst: &mut Bindings,
        scope: &Scope,
    ) -> bool {
        let mut a = a.clone();
        let mut b = b.clone();
        // Inside a sum chain a leading plus is decoration.
        if matches!(scope, Scope::Under(Head::SumList)) {
            if let Some(f) = na.get_if(&a, &Head::Plus) {
                a = f.args.first().cloned().unwrap_or(Term::Empty);
            }
            if let Some(f) = self.pattern_notation.get_if(&b, &Head::Plus) {
                b = f.args.first().cloned().unwrap_or(Term::Empty);
            }
        }
        match (&a, &b) {
            (Term::Sym(_), Term::Sym(_)) => {
                match (na.get(&a), self.pattern_notation.get(&b)) {
                    (Some(f1), Some(f2)) => {
                        if f1.head != f2.head {
                            return false;
                        }
                        if f1.head == Head::Index {
                            let f1 = f1.clone();
                            let f2 = f2.clone();
                            self.compare_index(&f1, na, &f2, subst, scope)
                        } else {
                            let args1 = f1.args.clone();
                            let args2 = f2.args.clone();
                            let inner = Scope::Under(f1.head.clone());
                            self.compare_args(&args1, na, &args2, subst, &inner)
                        }
                    }
                    _ => self.equal(&a, na, &b, subst),
                }
            }
            _ => {
                if std::mem::discriminant(&a) == std::mem::discriminant(&b) {
                    a == b
                } else {
                    self.equal(&a, na, &b, subst)
                }
            }
        }
    }

    fn compare_index(
        &self,
        f1: &crate::notation::TermNode,
        na: &Notation,
        f2: &crate::notation::TermNode,
        subst: &mut Bindings,
        scope: &Scope,
    ) -> bool {
        let base1 = f1.args.first().cloned().unwrap_or(Term::Empty);
        let base2 = f2.args.first().cloned().unwrap_or(Term::Empty);
        if !self.compare(&base1, na, &base2, subst, scope) {
            return false;
        }
        for i in 0..4 {
            if let Scope::Slots(mask) = scope {
                if !mask[i] {
                    continue;
                }
            }
            let d1 = f1.args.get(i + 1).cloned().unwrap_or(Term::Empty);
            let d2 = f2.args.get(i + 1).cloned().unwrap_or(Term::Empty);
            if !self.compare(&d1, na, &d2, subst, &Scope::Under(Head::Index)) {
                return false;
            }
        }
        true
    }

    fn compare_args(
        &self,
        a: &[Term],
        na: &Notation,
        b: &[Term],
        subst: &mut Bindings,
        scope: &Scope,
    ) -> bool {
        let a: Vec<Term> = a.iter().filter(|t| !t.is_style()).cloned().collect();
        let mut b: Vec<Term> = b.iter().filter(|t| !t.is_style()).cloned().collect();
        let set_scope = matches!(
            scope,
            Scope::Under(Head::SumList) | Scope::Under(Head::ProductList)
        );
        if set_scope && !b.iter().any(|t| self.is_ellipsis(t)) {
            // Order-insensitive: every subject element must claim a
            // distinct pattern element.
            for x in &a {
                let mut found = None;
                for (k, y) in b.iter().enumerate() {
                    if self.compare(x, na, y, subst, scope) {
                        found = Some(k);
                        break;
                    }
                }
                match found {
                    Some(k) => {
                        b.remove(k);
                    }
                    None => return false,
                }
            }
            return true;
        }
        // Positional walk with run-length ellipsis support. A pattern
        // element followed by an ellipsis repeats at least once and
        // greedily claims every subject element the pattern tail does not
        // need.
        let mut i = 0;
        let mut j = 0;
        while j < b.len() {
            let y = b[j].clone();
            if j + 1 < b.len() && self.is_ellipsis(&b[j + 1]) {
                let tail = b.len() - (j + 2);
                if a.len() < i + 1 + tail {
                    return false;
                }
                let take = a.len() - i - tail;
                let mut n: i64 = 1;
                for _ in 0..take {
                    if let Some(iv) = &self.index_var {
                        subst.insert(iv.clone(), Binding::One(Term::Num(Value::Int(n))));
                    }
                    if !self.compare(&a[i], na, &y, subst, scope) {
                        return false;
                    }
                    i += 1;
                    n += 1;
                }
                j += 2;
                continue;
            }
            if i >= a.len() {
                return false;
            }
            if !self.compare(&a[i], na, &y, subst, scope) {
                return false;
            }
            i += 1;
            j += 1;
        }
        i == a.len()
    }

    /// Leaf comparison; the pattern side may be a parameter.
    fn equal(&self, a: &Term, na: &Notation, b: &Term, subst: &mut Bindings) -> bool {
        let Some(bsym) = b.as_sym() else {
            return a == b;
        };
        let Some(param) = self.params.get(bsym.name()) else {
            return a == b;
        };
        let mut bound = a.clone();
        match param.kind {
            ParamKind::Value => {
                if !matches!(a, Term::Num(_)) {
                    return false;
                }
            }
            ParamKind::SingleTerm => match writer::count_terms(a, na) {
                0 => {}
                1 => {
                    if let Some(leaf) = first_leaf(a, na) {
                        bound = leaf;
                    }
                }
                _ => return false,
            },
            ParamKind::Var => {
                if na.get(a).is_some() {
                    return false;
                }
            }
            ParamKind::Integer => {
                if !matches!(a, Term::Num(Value::Int(_))) {
                    return false;
                }
            }
            ParamKind::Any | ParamKind::RunIndex => {}
        }
        let name = bsym.name().to_string();
        if param.list {
            match subst.get_mut(&name) {
                Some(Binding::Many(items)) => items.push(bound),
                Some(Binding::One(prev)) => {
                    let prev = prev.clone();
                    subst.insert(name, Binding::Many(vec![prev, bound]));
                }
                None => {
                    subst.insert(name, Binding::Many(vec![bound]));
                }
            }
            return true;
        }
        match subst.get(&name) {
            None => {
                subst.insert(name, Binding::One(bound));
                true
            }
            Some(Binding::One(prev)) => s_equal(prev, na, &bound, na, Scope::Root),
            Some(Binding::Many(_)) => false,
        }
    }
}

fn first_leaf(t: &Term, notation: &Notation) -> Option<Term> {
    match t {
        Term::Empty => None,
        Term::Num(_) | Term::Text(_) => Some(t.clone()),
        Term::Sym(_) => match notation.get(t) {
            None => Some(t.clone()),
            Some(node) => node.args.iter().find_map(|a| first_leaf(a, notation)),
        },
    }
}

/// A resolution environment: variable name to bound term.
pub type Env = BTreeMap<String, Term>;

/// Chases a variable through its environment.
pub fn resolve<'t>(t: &'t Term, env: &'t Env) -> &'t Term {
    let mut cur = t;
    let mut hops = 0;
    while let Term::Sym(s) = cur {
        if !s.is_variable() {
            break;
        }
        match env.get(s.name()) {
            Some(next) if hops < env.len() + 1 => {
                cur = next;
                hops += 1;
            }
            _ => break,
        }
    }
    cur
}

/// Bilateral unification. Variables on either side bind into that side's
/// environment; unifying two bound occurrences re-compares the bound
/// values. A group carrying the `quote` property suppresses variable
/// interpretation beneath it.
pub fn unify(
    a: &Term,
    na: &Notation,
    env_a: &mut Env,
    b: &Term,
    nb: &Notation,
    env_b: &mut Env,
) -> bool {
    unify_inner(a, na, env_a, b, nb, env_b, false)
}

fn unify_inner(
    a: &Term,
    na: &Notation,
    env_a: &mut Env,
    b: &Term,
    nb: &Notation,
    env_b: &mut Env,
    literal: bool,
) -> bool {
    let a = resolve(a, env_a).clone();
    let b = resolve(b, env_b).clone();
    if !literal {
        if let Term::Sym(s) = &a {
            if s.is_variable() {
                if b.is_named(s.name()) {
                    return true;
                }
                env_a.insert(s.name().to_string(), b);
                return true;
            }
        }
        if let Term::Sym(s) = &b {
            if s.is_variable() {
                env_b.insert(s.name().to_string(), a);
                return true;
            }
        }
    }
    match (na.get(&a), nb.get(&b)) {
        (Some(f1), Some(f2)) => {
            if f1.head != f2.head || f1.args.len() != f2.args.len() {
                return false;
            }
            if f1.prop("op") != f2.prop("op") {
                return false;
            }
            let quoted = literal
                || (f1.head == Head::Group && (f1.has_prop("quote") || f2.has_prop("quote")));
            let args1 = f1.args.clone();
            let args2 = f2.args.clone();
            let parent = f1.head.clone();
            for (x, y) in args1.iter().zip(args2.iter()) {
                // A leading plus is decoration inside sum chains.
                let x = strip_plus(x, na, &parent);
                let y = strip_plus(y, nb, &parent);
                if !unify_inner(&x, na, env_a, &y, nb, env_b, quoted) {
                    return false;
                }
            }
            true
        }
        (None, None) => a == b,
        _ => false,
    }
}

/// Unification of two terms sharing one environment, used when both
/// sides belong to the same goal frame.
pub fn unify_one(a: &Term, na: &Notation, b: &Term, nb: &Notation, env: &mut Env) -> bool {
    unify_one_inner(a, na, b, nb, env, false)
}

fn unify_one_inner(
    a: &Term,
    na: &Notation,
    b: &Term,
    nb: &Notation,
    env: &mut Env,
    literal: bool,
) -> bool {
    let a = resolve(a, env).clone();
    let b = resolve(b, env).clone();
    if !literal {
        if let Term::Sym(s) = &a {
            if s.is_variable() {
                if b.is_named(s.name()) {
                    return true;
                }
                env.insert(s.name().to_string(), b);
                return true;
            }
        }
        if let Term::Sym(s) = &b {
            if s.is_variable() {
                env.insert(s.name().to_string(), a);
                return true;
            }
        }
    }
    match (na.get(&a), nb.get(&b)) {
        (Some(f1), Some(f2)) => {
            if f1.head != f2.head || f1.args.len() != f2.args.len() {
                return false;
            }
            if f1.prop("op") != f2.prop("op") {
                return false;
            }
            let quoted = literal
                || (f1.head == Head::Group && (f1.has_prop("quote") || f2.has_prop("quote")));
            let args1 = f1.args.clone();
            let args2 = f2.args.clone();
            let parent = f1.head.clone();
            for (x, y) in args1.iter().zip(args2.iter()) {
                let x = strip_plus(x, na, &parent);
                let y = strip_plus(y, nb, &parent);
                if !unify_one_inner(&x, na, &y, nb, env, quoted) {
                    return false;
                }
            }
            true
        }
        (None, None) => a == b,
        _ => false,
    }
}

fn strip_plus(t: &Term, n: &Notation, parent: &Head) -> Term {
    if *parent == Head::SumList {
        if let Some(f) = n.get_if(t, &Head::Plus) {
            return f.args.first().cloned().unwrap_or(Term::Empty);
        }
    }
    t.clone()
}
