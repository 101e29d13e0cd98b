//! SLD resolution over formula graphs.
//!
//! Rules are declared as `head \dashv goal, goal, ...` and queried with
//! `goal!`. The search runs over an explicit LIFO stack of goal frames,
//! so backtracking and cut are plain list operations and solution
//! enumeration is a lazy iterator. Every frame owns a private clone of
//! the graph it searches against; bindings flow outward only through the
//! explicit head-against-parent-goal unification when a frame finishes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::comparer::{self, resolve, Env};
use crate::limits::ResourceLimits;
use crate::notation::{Head, Notation, Symbol, Term, TermNode, CUT_NAME};
use crate::parser;
use crate::preprocessor::Preprocessor;
use crate::processor::MathProcessor;
use crate::response::SessionFlags;
use crate::rewrite::{Copier, Importer, Replicator, Rewriter};
use crate::writer;
use crate::SymtexResult;

/// Returns the application node of an `\operatorname` predicate.
pub fn get_operator<'a>(t: &Term, notation: &'a Notation) -> Option<&'a TermNode> {
    notation
        .get_if(t, &Head::Apply)
        .filter(|f| f.prop("fmt") == Some("operatorname"))
}

/// Splits the argument formula of a predicate application.
pub fn operator_args(f: &TermNode, notation: &Notation) -> Vec<Term> {
    match f.args.get(1) {
        None | Some(Term::Empty) => Vec::new(),
        Some(a) => match notation.get_if(a, &Head::CommaList) {
            Some(cl) => cl.args.clone(),
            None => vec![a.clone()],
        },
    }
}

/// How the search treats a goal term.
#[derive(Clone, Debug, PartialEq)]
enum GoalKind {
    /// A predicate application resolved against rules or callbacks.
    Predicate,
    /// The `!` marker.
    Cut,
    /// `\neg goal`, negation as failure.
    Negation(Term),
    /// Anything else: a comparison, assignment or evaluable expression.
    Plain,
}

/// A term bundled with its own graph, predicate classification and the
/// variables it mentions.
#[derive(Clone)]
pub struct RuleTerm {
    pub root: Term,
    pub notation: Arc<Notation>,
    pub text: String,
    pred: Option<Term>,
    arity: usize,
    kind: GoalKind,
    pub variables: Vec<String>,
}

impl RuleTerm {
    pub fn new(mut root: Term, notation: Arc<Notation>) -> Self {
        // Goals are often bracket-wrapped by the grammar (a comparison or
        // negation inside a goal list must be braced). Unwrap, except
        // under a quoting group.
        while let Some(f) = notation.get_if(&root, &Head::Group) {
            if f.has_prop("quote") {
                break;
            }
            root = f.args.first().cloned().unwrap_or(Term::Empty);
        }
        let text = writer::render(&root, &notation);
        let (pred, arity, kind) = classify(&root, &notation);
        let variables = collect_variables(&root, &notation);
        RuleTerm { root, notation, text, pred, arity, kind, variables }
    }

    /// Parses and preprocesses a markup expression into a term.
    pub fn from_markup(expr: &str) -> SymtexResult<Self> {
        let (root, notation) = parser::parse(expr, &ResourceLimits::default())?;
        let pre = Preprocessor::new(notation, &[]);
        let (root, notation) = pre.run(&root)?;
        Ok(RuleTerm::new(root, Arc::new(notation)))
    }

    pub fn pred(&self) -> Option<&Term> {
        self.pred.as_ref()
    }
}

impl fmt::Display for RuleTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn classify(root: &Term, notation: &Notation) -> (Option<Term>, usize, GoalKind) {
    if root.is_named(CUT_NAME) {
        return (None, 0, GoalKind::Cut);
    }
    if let Some(f) = notation.get_if(root, &Head::Negation) {
        let inner = f.args.first().cloned().unwrap_or(Term::Empty);
        return (None, 0, GoalKind::Negation(inner));
    }
    if let Some(f) = get_operator(root, notation) {
        let pred = f.args.first().cloned();
        let arity = operator_args(f, notation).len();
        return (pred, arity, GoalKind::Predicate);
    }
    (None, 0, GoalKind::Plain)
}

struct VarWalker {
    rw: Rewriter,
    vars: Vec<String>,
}

impl Replicator for VarWalker {
    fn rw(&mut self) -> &mut Rewriter {
        &mut self.rw
    }

    fn enter_symbol(&mut self, sym: &Symbol) -> Term {
        if sym.is_variable() && !self.vars.iter().any(|v| v == sym.name()) {
            self.vars.push(sym.name().to_string());
        }
        Term::Sym(sym.clone())
    }
}

fn collect_variables(root: &Term, notation: &Notation) -> Vec<String> {
    let mut walker = VarWalker { rw: Rewriter::new(notation.clone()), vars: Vec::new() };
    walker.apply(root);
    walker.vars
}

/// A head and the goals that establish it. A fact is a rule with no
/// goals.
pub struct Rule {
    pub head: RuleTerm,
    pub goals: Vec<RuleTerm>,
}

impl Rule {
    pub fn new(head: RuleTerm, goals: Vec<RuleTerm>) -> Self {
        Rule { head, goals }
    }

    pub fn fact(head: RuleTerm) -> Self {
        Rule { head, goals: Vec::new() }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.goals.is_empty() {
            return f.write_str(&self.head.text);
        }
        let goals: Vec<&str> = self.goals.iter().map(|g| g.text.as_str()).collect();
        write!(f, "{} \\dashv {}", self.head.text, goals.join(","))
    }
}

/// A built-in predicate: resolves its arguments against the frame state
/// and yields zero or more (environment, graph) alternatives.
pub type Callback = fn(&[Term], &Notation, &Env) -> Vec<(Env, Notation)>;

/// Registry of built-in predicates, keyed by `\operatorname` name.
#[derive(Clone)]
pub struct CallbackSet {
    map: HashMap<String, Callback>,
}

impl CallbackSet {
    pub fn empty() -> Self {
        CallbackSet { map: HashMap::new() }
    }

    /// The stock built-ins: `bound`, `apply`, `index`, `list`,
    /// `unbracket`.
    pub fn standard() -> Self {
        let mut set = CallbackSet::empty();
        set.register("bound", cb_bound);
        set.register("apply", cb_apply);
        set.register("index", cb_index);
        set.register("list", cb_list);
        set.register("unbracket", cb_unbracket);
        set
    }

    pub fn register(&mut self, name: &str, cb: Callback) {
        self.map.insert(name.to_string(), cb);
    }

    fn get(&self, name: &str) -> Option<Callback> {
        self.map.get(name).copied()
    }
}

fn cb_bound(args: &[Term], notation: &Notation, env: &Env) -> Vec<(Env, Notation)> {
    let Some(t) = args.first() else {
        return Vec::new();
    };
    if resolve(t, env).is_variable() {
        return Vec::new();
    }
    vec![(env.clone(), notation.clone())]
}

fn cb_apply(args: &[Term], notation: &Notation, env: &Env) -> Vec<(Env, Notation)> {
    let (Some(t), Some(name), Some(arg)) = (args.first(), args.get(1), args.get(2)) else {
        return Vec::new();
    };
    let r = resolve(t, env).clone();
    let Some(f) = notation.get_if(&r, &Head::Apply).cloned() else {
        return Vec::new();
    };
    let mut env = env.clone();
    let fname = f.args.first().cloned().unwrap_or(Term::Empty);
    let farg = f.args.get(1).cloned().unwrap_or(Term::Empty);
    if comparer::unify_one(name, notation, &fname, notation, &mut env)
        && comparer::unify_one(arg, notation, &farg, notation, &mut env)
    {
        return vec![(env, notation.clone())];
    }
    Vec::new()
}

fn cb_index(args: &[Term], notation: &Notation, env: &Env) -> Vec<(Env, Notation)> {
    let (Some(t), Some(base), Some(sup), Some(sub)) =
        (args.first(), args.get(1), args.get(2), args.get(3))
    else {
        return Vec::new();
    };
    let r = resolve(t, env).clone();
    let Some(f) = notation.get_if(&r, &Head::Index).cloned() else {
        return Vec::new();
    };
    let mut env = env.clone();
    let fbase = f.args.first().cloned().unwrap_or(Term::Empty);
    let fsup = f.args.get(3).cloned().unwrap_or(Term::Empty);
    let fsub = f.args.get(4).cloned().unwrap_or(Term::Empty);
    if comparer::unify_one(base, notation, &fbase, notation, &mut env)
        && comparer::unify_one(sup, notation, &fsup, notation, &mut env)
        && comparer::unify_one(sub, notation, &fsub, notation, &mut env)
    {
        return vec![(env, notation.clone())];
    }
    Vec::new()
}

fn cb_list(args: &[Term], notation: &Notation, env: &Env) -> Vec<(Env, Notation)> {
    let (Some(l), Some(h), Some(tl)) = (args.first(), args.get(1), args.get(2)) else {
        return Vec::new();
    };
    let mut r = resolve(l, env).clone();
    if let Some(f) = notation.get_if(&r, &Head::Group) {
        r = f.args.first().cloned().unwrap_or(Term::Empty);
    }
    let Some(f) = notation.get_if(&r, &Head::CommaList).cloned() else {
        return Vec::new();
    };
    let Some(first) = f.args.first().cloned() else {
        return Vec::new();
    };
    let mut nota = notation.clone();
    let tail = if f.args.len() > 1 {
        nota.define(Head::CommaList, f.args[1..].to_vec())
    } else {
        Term::none()
    };
    let mut env = env.clone();
    if comparer::unify_one(h, &nota, &first, &nota, &mut env)
        && comparer::unify_one(tl, &nota, &tail, &nota, &mut env)
    {
        return vec![(env, nota)];
    }
    Vec::new()
}

fn cb_unbracket(args: &[Term], notation: &Notation, env: &Env) -> Vec<(Env, Notation)> {
    let (Some(x), Some(y)) = (args.first(), args.get(1)) else {
        return Vec::new();
    };
    let mut r = resolve(x, env).clone();
    if let Some(f) = notation.get_if(&r, &Head::Group) {
        r = f.args.first().cloned().unwrap_or(Term::Empty);
    }
    let mut env = env.clone();
    if comparer::unify_one(y, notation, &r, notation, &mut env) {
        return vec![(env, notation.clone())];
    }
    Vec::new()
}

/// The rule database, with its callback registry.
pub struct RuleModel {
    rules: Vec<Arc<Rule>>,
    callbacks: CallbackSet,
}

impl Default for RuleModel {
    fn default() -> Self {
        RuleModel::new()
    }
}

impl RuleModel {
    pub fn new() -> Self {
        RuleModel::with_callbacks(CallbackSet::standard())
    }

    pub fn with_callbacks(callbacks: CallbackSet) -> Self {
        RuleModel { rules: Vec::new(), callbacks }
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(Arc::new(rule));
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// Whether `name` is a registered built-in predicate.
    pub fn is_callback(&self, name: &str) -> bool {
        self.callbacks.get(name).is_some()
    }

    /// Splits a query formula into its conjunctive goals.
    pub fn parse_goals(root: &Term, notation: &Notation) -> Vec<RuleTerm> {
        let mut root = root.clone();
        if let Some(f) = notation.get_if(&root, &Head::Group) {
            root = f.args.first().cloned().unwrap_or(Term::Empty);
        }
        let shared = Arc::new(notation.clone());
        match notation.get_if(&root, &Head::CommaList) {
            Some(cl) => cl
                .args
                .iter()
                .map(|g| RuleTerm::new(g.clone(), Arc::clone(&shared)))
                .collect(),
            None => vec![RuleTerm::new(root, shared)],
        }
    }

    /// Lazily enumerates solutions for a goal conjunction, depth-first,
    /// most recently declared clause first.
    pub fn search(&self, goals: Vec<RuleTerm>, limits: &ResourceLimits) -> Solutions<'_> {
        let notation = goals
            .first()
            .map(|g| (*g.notation).clone())
            .unwrap_or_default();
        // The driver head is never unified; any term will do.
        let head = goals
            .first()
            .cloned()
            .unwrap_or_else(|| RuleTerm::new(Term::none(), Arc::new(Notation::new())));
        let rule = Arc::new(Rule::new(head, goals));
        let frame = Frame { rule, cursor: 0, env: Env::new(), notation, parent: None };
        Solutions {
            model: self,
            stack: vec![frame],
            steps: 0,
            budget: limits.max_search_steps,
            truncated: false,
            limits: limits.clone(),
        }
    }
}

#[derive(Clone)]
struct Frame {
    rule: Arc<Rule>,
    cursor: usize,
    env: Env,
    notation: Notation,
    parent: Option<Box<Frame>>,
}

/// Lazy solution stream. Dropping it abandons the search; exhausting it
/// leaves [`Solutions::truncated`] saying whether the step budget ran
/// out before the space was covered.
pub struct Solutions<'a> {
    model: &'a RuleModel,
    stack: Vec<Frame>,
    steps: usize,
    budget: usize,
    truncated: bool,
    limits: ResourceLimits,
}

impl<'a> Solutions<'a> {
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn unify_terms(
        a: &RuleTerm,
        na: &Notation,
        env_a: &mut Env,
        b: &RuleTerm,
        nb: &Notation,
        env_b: &mut Env,
    ) -> bool {
        if a.pred != b.pred || a.arity != b.arity {
            return false;
        }
        comparer::unify(&a.root, na, env_a, &b.root, nb, env_b)
    }

    /// Negation as failure: a bounded private sub-search that must come
    /// up empty. A truncated sub-search does not count as failure.
    fn negation_holds(&mut self, inner: &Term, frame: &Frame) -> bool {
        let goal = RuleTerm::new(inner.clone(), Arc::new(frame.notation.clone()));
        let remaining = self.budget.saturating_sub(self.steps).max(1);
        let sub_limits = ResourceLimits {
            max_search_steps: remaining,
            ..self.limits.clone()
        };
        let mut sub = self.model.search(vec![goal], &sub_limits);
        sub.stack[0].env = frame.env.clone();
        let found = sub.next().is_some();
        let sub_truncated = sub.truncated;
        self.steps += sub.steps;
        !found && !sub_truncated
    }

    /// A comparison or assignment goal, handled without the rule
    /// database.
    fn term_eval(&self, term: &RuleTerm, frame: &mut Frame) -> bool {
        let tn = &*term.notation;
        let mut root = term.root.clone();
        if let Some(f) = tn.get_if(&root, &Head::Group) {
            root = f.args.first().cloned().unwrap_or(Term::Empty);
        }
        let Some(f) = tn.get_if(&root, &Head::Comparison).cloned() else {
            return false;
        };
        let op = f.prop("op").unwrap_or("=").to_string();
        let lhs = f.args.first().cloned().unwrap_or(Term::Empty);
        let rhs = f.args.get(1).cloned().unwrap_or(Term::Empty);
        let outer = frame.notation.clone();
        let env_snapshot = frame.env.clone();
        let mut replacer = SymbolReplacer {
            rw: Rewriter::with_output(tn.clone(), tn.clone()),
            outer: &outer,
            env: &env_snapshot,
        };
        let s1 = replacer.apply(&lhs);
        let s2 = replacer.apply(&rhs);
        let out_nota = replacer.rw.into_output();
        match op.as_str() {
            "=" => {
                let mut env = frame.env.clone();
                if comparer::unify_one(&s1, &out_nota, &s2, &out_nota, &mut env) {
                    frame.env = env;
                    frame.notation.merge(&out_nota);
                    return true;
                }
                false
            }
            "\\gets" => {
                let Some(var) = s1.as_sym().filter(|s| s.is_variable()) else {
                    return false;
                };
                let Ok(mut sub) = MathProcessor::new(self.limits.clone()) else {
                    return false;
                };
                let mut flags = SessionFlags::default();
                match sub.process(&s2, &out_nota, &[], &mut flags) {
                    Ok((outsym, out2, _)) => {
                        frame.notation.merge(&out2);
                        frame.env.insert(var.name().to_string(), outsym);
                        true
                    }
                    Err(_) => false,
                }
            }
            _ => false,
        }
    }

    /// Flattens nested predicate applications inside a plain goal into
    /// placeholder variables, producing a child frame that solves each
    /// application (with the placeholder as an extra result argument)
    /// before re-checking the goal.
    fn synthesize(&self, term: &RuleTerm, frame: &Frame) -> Option<Frame> {
        // Substitute what the frame already knows first, so the nested
        // calls are searched with their bound arguments.
        let outer = frame.notation.clone();
        let tn = (*term.notation).clone();
        let mut replacer = SymbolReplacer {
            rw: Rewriter::with_output(tn.clone(), tn),
            outer: &outer,
            env: &frame.env,
        };
        let root = replacer.apply(&term.root);
        let src = replacer.rw.into_output();
        let apps = find_applications(&root, &src, self.model);
        if apps.is_empty() {
            return None;
        }
        let mut sub = AppSubstituter {
            rw: Rewriter::with_output(src.clone(), src),
            targets: apps.clone(),
            placeholders: Vec::new(),
        };
        let new_root = sub.apply(&root);
        let placeholders = sub.placeholders.clone();
        let mut dst = sub.rw.into_output();
        let mut goal_terms = Vec::new();
        for app in &apps {
            let Some((_, ph)) = placeholders.iter().find(|(k, _)| k == app) else {
                continue;
            };
            let Some(f) = dst.get(app).cloned() else {
                continue;
            };
            let name = f.args.first().cloned().unwrap_or(Term::Empty);
            let mut call_args = operator_args(&f, &dst);
            call_args.push(ph.clone());
            let arglist = dst.define(Head::CommaList, call_args);
            let node = TermNode::new(Head::Apply, vec![name, arglist])
                .with_prop("fmt", "operatorname");
            goal_terms.push(dst.define_node(node));
        }
        goal_terms.push(new_root);
        // Re-key the synthesized goals onto fresh symbols; merging them
        // into the frame graph must not displace the original goal nodes
        // the head still refers to.
        let mut importer = Importer::with_output(dst, Notation::new());
        let goal_terms: Vec<Term> =
            goal_terms.iter().map(|g| importer.apply(g)).collect();
        let shared = Arc::new(importer.into_output());
        let goals: Vec<RuleTerm> = goal_terms
            .into_iter()
            .map(|g| RuleTerm::new(g, Arc::clone(&shared)))
            .collect();
        let head = RuleTerm::new(term.root.clone(), Arc::clone(&term.notation));
        let mut notation = frame.notation.clone();
        notation.merge(&shared);
        Some(Frame {
            rule: Arc::new(Rule::new(head, goals)),
            cursor: 0,
            env: frame.env.clone(),
            notation,
            parent: Some(Box::new(frame.clone())),
        })
    }
}

impl<'a> Iterator for Solutions<'a> {
    type Item = (Env, Notation);

    fn next(&mut self) -> Option<Self::Item> {
        if self.truncated {
            return None;
        }
        while let Some(mut c) = self.stack.pop() {
            self.steps += 1;
            if self.steps > self.budget {
                self.truncated = true;
                tracing::debug!(steps = self.steps, "search budget exhausted");
                return None;
            }
            if c.cursor >= c.rule.goals.len() {
                let Some(parent) = c.parent.take() else {
                    return Some((c.env, c.notation));
                };
                let mut parent = *parent;
                let resumed_goal = parent.rule.goals[parent.cursor].clone();
                if Self::unify_terms(
                    &c.rule.head,
                    &c.notation,
                    &mut c.env,
                    &resumed_goal,
                    &parent.notation,
                    &mut parent.env,
                ) {
                    parent.notation.merge(&c.notation);
                    parent.cursor += 1;
                    self.stack.push(parent);
                }
                continue;
            }
            let term = c.rule.goals[c.cursor].clone();
            match &term.kind {
                GoalKind::Cut => {
                    // Commit: drop every waiting alternative belonging to
                    // an activation of this clause, including descendants.
                    self.stack.retain(|f| !under_rule(f, &c.rule));
                    c.cursor += 1;
                    self.stack.push(c);
                }
                GoalKind::Negation(inner) => {
                    let inner = inner.clone();
                    if self.negation_holds(&inner, &c) {
                        c.cursor += 1;
                        self.stack.push(c);
                    }
                }
                GoalKind::Plain => {
                    if let Some(child) = self.synthesize(&term, &c) {
                        self.stack.push(child);
                    } else if self.term_eval(&term, &mut c) {
                        c.cursor += 1;
                        self.stack.push(c);
                    }
                }
                GoalKind::Predicate => {
                    let cb = term
                        .pred
                        .as_ref()
                        .and_then(Term::as_sym)
                        .and_then(|s| self.model.callbacks.get(s.name()));
                    if let Some(cb) = cb {
                        let args = get_operator(&term.root, &term.notation)
                            .map(|f| operator_args(f, &term.notation))
                            .unwrap_or_default();
                        let alts = cb(&args, &c.notation, &c.env);
                        for (env, nota) in alts.into_iter().rev() {
                            let mut resumed = c.clone();
                            resumed.env = env;
                            resumed.notation = nota;
                            resumed.cursor += 1;
                            self.stack.push(resumed);
                        }
                        continue;
                    }
                    for rule in self.model.rules.iter() {
                        if rule.head.pred != term.pred || rule.head.arity != term.arity {
                            continue;
                        }
                        // Every candidate clause unifies against its own
                        // copy of the caller, so failed or abandoned
                        // alternatives leave no bindings behind.
                        let mut caller = c.clone();
                        let mut child = Frame {
                            rule: Arc::clone(rule),
                            cursor: 0,
                            env: Env::new(),
                            notation: c.notation.clone(),
                            parent: None,
                        };
                        if Self::unify_terms(
                            &term,
                            &caller.notation,
                            &mut caller.env,
                            &rule.head,
                            &rule.head.notation,
                            &mut child.env,
                        ) {
                            child.notation.merge(&rule.head.notation);
                            child.parent = Some(Box::new(caller));
                            self.stack.push(child);
                        }
                    }
                }
            }
        }
        None
    }
}

/// Whether a frame, or any frame it will return into, was instantiated
/// from the given rule.
fn under_rule(f: &Frame, rule: &Arc<Rule>) -> bool {
    if Arc::ptr_eq(&f.rule, rule) {
        return true;
    }
    match &f.parent {
        Some(p) => under_rule(p, rule),
        None => false,
    }
}

/// Rebuilds a goal with bound variables replaced by their values,
/// importing value subgraphs from the frame graph as needed.
struct SymbolReplacer<'e> {
    rw: Rewriter,
    outer: &'e Notation,
    env: &'e Env,
}

impl<'e> Replicator for SymbolReplacer<'e> {
    fn rw(&mut self) -> &mut Rewriter {
        &mut self.rw
    }

    fn enter_symbol(&mut self, sym: &Symbol) -> Term {
        if sym.is_variable() {
            if let Some(val) = self.env.get(sym.name()).cloned() {
                let mut val = val;
                if val.as_sym().is_some() && self.rw.dst.get(&val).is_none() {
                    let dst = std::mem::take(&mut self.rw.dst);
                    let mut copier = Copier::with_output(self.outer.clone(), dst);
                    val = copier.apply(&val);
                    self.rw.dst = copier.into_output();
                }
                let ctx = self.rw.context();
                return self.subst(&Term::Sym(sym.clone()), val, ctx.as_ref());
            }
        }
        Term::Sym(sym.clone())
    }
}

/// Collects predicate applications nested inside a plain goal that some
/// stored rule can answer (with one extra result argument).
fn find_applications(root: &Term, notation: &Notation, model: &RuleModel) -> Vec<Term> {
    let mut found = Vec::new();
    let mut pending = vec![root.clone()];
    let mut seen = Vec::new();
    while let Some(t) = pending.pop() {
        if seen.contains(&t) {
            continue;
        }
        seen.push(t.clone());
        if let Some(f) = notation.get(&t) {
            if let Some(app) = get_operator(&t, notation) {
                let pred = app.args.first().cloned();
                let arity = operator_args(app, notation).len() + 1;
                let answered = model.rules.iter().any(|r| {
                    r.head.pred == pred && r.head.arity == arity
                });
                if answered && !found.contains(&t) {
                    found.push(t.clone());
                    continue;
                }
            }
            pending.extend(f.args.iter().cloned());
        }
    }
    found
}

/// Replaces collected applications with fresh placeholder variables.
struct AppSubstituter {
    rw: Rewriter,
    targets: Vec<Term>,
    placeholders: Vec<(Term, Term)>,
}

impl AppSubstituter {
    fn placeholder(&mut self, t: &Term) -> Term {
        if let Some((_, ph)) = self.placeholders.iter().find(|(k, _)| k == t) {
            return ph.clone();
        }
        let ph = Term::sym(format!("#{}", Symbol::fresh().name()));
        self.placeholders.push((t.clone(), ph.clone()));
        ph
    }

    fn is_target(&self, t: &Term) -> bool {
        self.targets.contains(t)
    }
}

impl Replicator for AppSubstituter {
    fn rw(&mut self) -> &mut Rewriter {
        &mut self.rw
    }

    fn enter_func(&mut self, t: &Term, node: &TermNode) -> Term {
        if self.is_target(t) {
            return self.placeholder(t);
        }
        let name = node.args.first().cloned().unwrap_or(Term::Empty);
        let arg = node.args.get(1).cloned().unwrap_or(Term::Empty);
        let name = self.enter_expr(&name);
        let arg = self.enter_formula(&arg);
        let mut rebuilt = TermNode::new(Head::Apply, vec![name, arg]);
        rebuilt.props = node.props.clone();
        self.repf(t, rebuilt)
    }
}
