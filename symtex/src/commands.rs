//! The command registry.
//!
//! Commands are spelled `name!` with optional `[attrs]` and up to two
//! `\Box`-separated operands. Every command runs inside a calculator
//! pass and returns the term that replaces the command node. The
//! registry is explicit: nothing is discovered, everything is wired in
//! [`CommandSet::standard`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::calculator::Calculator;
use crate::comparer::{Binding, Param, ParamKind, Pattern, Scope};
use crate::error::SymtexError;
use crate::notation::{Head, Notation, Term, TermNode};
use crate::processor::create_true;
use crate::response::Notice;
use crate::rewrite::{Copier, Replicator};
use crate::solver::RuleModel;
use crate::value::Value;
use crate::writer;
use crate::SymtexResult;

pub trait Command: Send + Sync {
    /// Required operand count, or `None` for variadic commands.
    fn arity(&self) -> Option<usize> {
        None
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term>;
}

#[derive(Clone)]
pub struct CommandSet {
    map: HashMap<String, Arc<dyn Command>>,
}

impl CommandSet {
    pub fn empty() -> Self {
        CommandSet { map: HashMap::new() }
    }

    /// The stock commands.
    pub fn standard() -> Self {
        let mut set = CommandSet::empty();
        set.register("add", Arc::new(Add { active: false }));
        set.register("addex", Arc::new(Add { active: true }));
        set.register("mul", Arc::new(Mul { active: false }));
        set.register("mulex", Arc::new(Mul { active: true }));
        set.register("match", Arc::new(RunMatch));
        set.register("goal", Arc::new(ExecuteGoal));
        set.register("rules", Arc::new(PrintRules));
        set.register("dump", Arc::new(DumpNotation));
        set.register("echo-on", Arc::new(SetEcho { flag: true }));
        set.register("echo-off", Arc::new(SetEcho { flag: false }));
        set.register("track", Arc::new(Track));
        set.register("clear", Arc::new(Clear));
        set.register("closure", Arc::new(Closure));
        set
    }

    pub fn register(&mut self, name: &str, cmd: Arc<dyn Command>) {
        self.map.insert(name.to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.map.get(name).cloned()
    }
}

fn no_attrs(name: &str, node: &TermNode) -> SymtexResult<()> {
    match node.args.first() {
        Some(a) if !a.is_empty() => Err(SymtexError::engine(format!(
            "the {name} command does not define any attributes"
        ))),
        _ => Ok(()),
    }
}

fn operand(node: &TermNode, i: usize) -> Term {
    node.args.get(i + 1).cloned().unwrap_or(Term::Empty)
}

/// Rebuilds an operand into the output graph without normalizing it.
fn copy_operand(calc: &mut Calculator<'_>, t: &Term) -> Term {
    let src = calc.rw().src.clone();
    let dst = std::mem::take(&mut calc.rw().dst);
    let mut copier = Copier::with_output(src, dst);
    let out = copier.enter_subformula(t);
    calc.rw().dst = copier.into_output();
    out
}

/// Wraps an expression in a deferred-evaluation marker, a brace group
/// holding a bare command node. The next calculator pass dispatches it.
fn eval_marker(notation: &mut Notation, oper: &str, expr: Term) -> Term {
    let inner =
        notation.define_node(TermNode::new(Head::op(oper), vec![Term::Empty, expr]));
    notation.define_node(TermNode::new(Head::Group, vec![inner]).with_prop("br", "{}"))
}

fn chain_eval(notation: &mut Notation, oper: &str, expr: Term, negative: bool) -> Term {
    let expr = if negative {
        notation.define(Head::Minus, vec![expr])
    } else {
        expr
    };
    eval_marker(notation, oper, expr)
}

fn is_eval_marker(notation: &Notation, t: &Term) -> bool {
    let markers = [Head::op("mul!"), Head::op("mulex!")];
    notation
        .get_if(t, &Head::Group)
        .and_then(|f| f.args.first())
        .map(|inner| notation.get_if_any(inner, &markers).is_some())
        .unwrap_or(false)
}

/// `add!` / `addex!`: flatten a bracketed sum, staging bracketed
/// products through `mul!` so expansion happens over later passes.
struct Add {
    active: bool,
}

impl Add {
    fn add_slist(&self, calc: &mut Calculator<'_>, out: &mut Vec<Term>, t: &Term) {
        if let Some(f) = calc.rw().dst.get_if(t, &Head::Group).cloned() {
            let a = f.args.first().cloned().unwrap_or(Term::Empty);
            return self.add_slist(calc, out, &a);
        }
        let Some(f) = calc.rw().dst.get_if(t, &Head::SumList).cloned() else {
            out.push(t.clone());
            return;
        };
        for arg in &f.args {
            let mut expr = arg.clone();
            let mut negative = false;
            if let Some(sf) = calc
                .rw()
                .dst
                .get_if_any(&expr, &[Head::Plus, Head::Minus])
                .cloned()
            {
                negative = sf.head == Head::Minus;
                expr = sf.args.first().cloned().unwrap_or(Term::Empty);
            }
            if let Some(gf) = calc.rw().dst.get_if(&expr, &Head::Group).cloned() {
                if negative {
                    let mul = chain_eval(&mut calc.rw().dst, "mul!", expr.clone(), true);
                    let group = calc
                        .rw()
                        .dst
                        .define_node(TermNode::new(Head::Group, vec![mul]).with_prop("br", "()"));
                    out.push(calc.rw().dst.define(Head::Plus, vec![group]));
                } else {
                    let a = gf.args.first().cloned().unwrap_or(Term::Empty);
                    self.add_slist(calc, out, &a);
                }
                continue;
            }
            let has_group = match calc.rw().dst.get_if(&expr, &Head::ProductList).cloned() {
                Some(pf) => {
                    let dst = &calc.rw().dst;
                    pf.args.iter().any(|a| dst.get_if(a, &Head::Group).is_some())
                }
                None => false,
            };
            if has_group {
                let mul = chain_eval(&mut calc.rw().dst, "mul!", expr.clone(), negative);
                out.push(calc.rw().dst.define(Head::Plus, vec![mul]));
                continue;
            }
            let rebuilt = if negative {
                calc.rw().dst.define(Head::Minus, vec![expr])
            } else if !out.is_empty() {
                calc.rw().dst.define(Head::Plus, vec![expr])
            } else {
                expr
            };
            out.push(rebuilt);
        }
    }
}

impl Command for Add {
    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        _t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term> {
        let arg = operand(node, 0);
        let outsym = if self.active {
            calc.enter_subformula(&arg)
        } else {
            copy_operand(calc, &arg)
        };
        let mut out = Vec::new();
        self.add_slist(calc, &mut out, &outsym);
        if out.len() == 1 {
            return Ok(out.remove(0));
        }
        Ok(calc.rw().dst.define(Head::SumList, out))
    }
}

/// `mul!` / `mulex!`: expand a binary product of sums, staging longer
/// chains and powers through deferred-evaluation markers.
struct Mul {
    active: bool,
}

impl Mul {
    fn extract(notation: &Notation, t: &Term) -> Vec<Term> {
        if let Some(f) = notation.get_if_any(t, &[Head::Plus, Head::Group]) {
            let a = f.args.first().cloned().unwrap_or(Term::Empty);
            return Self::extract(notation, &a);
        }
        if let Some(f) = notation.get_if(t, &Head::SumList) {
            return f.args.clone();
        }
        vec![t.clone()]
    }

    /// `(z)^n` becomes n staged copies of `(z)`.
    fn power(&self, calc: &mut Calculator<'_>, expr: Term, n: i64) -> Option<Term> {
        let n = usize::try_from(n).ok().filter(|&n| n > 0)?;
        let group = calc
            .rw()
            .dst
            .define_node(TermNode::new(Head::Group, vec![expr]).with_prop("br", "()"));
        let args = vec![group; n];
        let plist = calc.rw().dst.define(Head::ProductList, args);
        Some(
            calc.rw()
                .dst
                .define_node(TermNode::new(Head::op("mul!"), vec![Term::Empty, plist])),
        )
    }

    fn expand(&self, calc: &mut Calculator<'_>, entry: Term) -> Term {
        let mut sym = entry.clone();
        let mut negative = false;
        if let Some(f) = calc.rw().dst.get_if(&sym, &Head::Minus) {
            sym = f.args.first().cloned().unwrap_or(Term::Empty);
            negative = true;
        }
        let Some(f) = calc.rw().dst.get_if(&sym, &Head::ProductList).cloned() else {
            return sym;
        };
        if f.args.len() > 2 {
            let rest = calc
                .rw()
                .dst
                .define(Head::ProductList, f.args[1..].to_vec());
            let inner = eval_marker(&mut calc.rw().dst, "mul!", rest);
            let first = f.args.first().cloned().unwrap_or(Term::Empty);
            let outer = calc.rw().dst.define(Head::ProductList, vec![first, inner]);
            return eval_marker(&mut calc.rw().dst, "mulex!", outer);
        }
        let a0 = f.args.first().cloned().unwrap_or(Term::Empty);
        let a1 = f.args.get(1).cloned().unwrap_or(Term::Empty);
        if is_eval_marker(&calc.rw().dst, &a0) || is_eval_marker(&calc.rw().dst, &a1) {
            return eval_marker(&mut calc.rw().dst, "mulex!", entry);
        }
        let x = Self::extract(&calc.rw().dst, &a0);
        let y = Self::extract(&calc.rw().dst, &a1);
        let x_is_atom = x.len() == 1 && x[0] == a0;
        let y_is_atom = y.len() == 1 && y[0] == a1;
        if !self.active && (x_is_atom || y_is_atom) {
            // Stage the unexpanded operand for the next pass.
            let mut res = Vec::new();
            if x_is_atom {
                res.push(eval_marker(&mut calc.rw().dst, "mul!", a0));
            } else {
                res.push(a0);
            }
            if y_is_atom {
                res.push(eval_marker(&mut calc.rw().dst, "mul!", a1));
            } else {
                res.push(a1);
            }
            let outer = calc.rw().dst.define(Head::ProductList, res);
            return eval_marker(&mut calc.rw().dst, "mulex!", outer);
        }
        let mut res: Vec<Term> = Vec::new();
        for a in &x {
            for b in &y {
                let p = calc.get_factor(a);
                let q = calc.get_factor(b);
                let Some(mut factor) = p.mul(&q) else {
                    continue;
                };
                if factor.is_zero() {
                    continue;
                }
                if negative {
                    let Some(neg) = factor.mul(&Value::Int(-1)) else {
                        continue;
                    };
                    factor = neg;
                }
                let mut pl: Vec<Term> = Vec::new();
                if !factor.numeric_eq(&Value::Int(1)) && !factor.numeric_eq(&Value::Int(-1))
                {
                    pl.push(Term::Num(factor.abs()));
                }
                if let Some(left) = calc.get_expr(a) {
                    pl.extend(left);
                }
                if let Some(right) = calc.get_expr(b) {
                    pl.extend(right);
                }
                let mut outs = match pl.len() {
                    0 => Term::int(1),
                    1 => pl.remove(0),
                    _ => calc.rw().dst.define(Head::ProductList, pl),
                };
                if factor.is_negative() {
                    outs = calc.rw().dst.define(Head::Minus, vec![outs]);
                } else if !res.is_empty() {
                    outs = calc.rw().dst.define(Head::Plus, vec![outs]);
                }
                res.push(outs);
            }
        }
        calc.rw().dst.define(Head::SumList, res)
    }
}

impl Command for Mul {
    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        _t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term> {
        let arg = operand(node, 0);
        let outsym = if self.active {
            calc.enter_subformula(&arg)
        } else {
            copy_operand(calc, &arg)
        };
        let patterns = calc.patterns;
        let power = patterns
            .power
            .match_against(&outsym, &calc.rw().dst, Scope::Root);
        if let Some(b) = power {
            if let (Some(Binding::One(z)), Some(Binding::One(Term::Num(Value::Int(n))))) =
                (b.get("z"), b.get("n"))
            {
                let z = z.clone();
                let n = *n;
                if let Some(r) = self.power(calc, z, n) {
                    return Ok(r);
                }
            }
        }
        Ok(self.expand(calc, outsym))
    }
}

/// `match![params] pattern \Box subject`: run the comparer and report
/// the bindings.
struct RunMatch;

impl RunMatch {
    fn add_param(t: &Term, notation: &Notation, params: &mut Vec<String>) -> SymtexResult<()> {
        match t.as_sym() {
            Some(s) if notation.get(t).is_none() => {
                params.push(s.name().to_string());
                Ok(())
            }
            _ => Err(SymtexError::engine(
                "the match command takes plain symbol attributes",
            )),
        }
    }
}

impl Command for RunMatch {
    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        _t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term> {
        calc.flags.echo_once = true;
        let mut params = Vec::new();
        if let Some(attrs) = node.args.first().filter(|a| !a.is_empty()) {
            let src = calc.rw().src.clone();
            match src.get_if(attrs, &Head::CommaList) {
                Some(cl) => {
                    for arg in &cl.args {
                        Self::add_param(arg, &src, &mut params)?;
                    }
                }
                None => Self::add_param(attrs, &src, &mut params)?,
            }
        }
        let subject = calc.enter_subformula(&operand(node, 0));
        let pattern_root = calc.enter_subformula(&operand(node, 1));
        let notation = calc.rw().dst.clone();
        // Attributes collect every occurrence, so a parameter repeated
        // by an ellipsis run reports the whole run.
        let pattern = Pattern::new(
            pattern_root,
            notation.clone(),
            params
                .iter()
                .map(|p| (p.as_str(), Param::list_of(ParamKind::Var)))
                .collect(),
        );
        let verdict = match pattern.match_against(&subject, &notation, Scope::Root) {
            None => "false",
            Some(subst) => {
                let mut rows = Vec::new();
                for p in &params {
                    let rendered = match subst.get(p) {
                        Some(Binding::One(t)) => writer::render(t, &notation),
                        Some(Binding::Many(items)) => items
                            .iter()
                            .map(|t| writer::render(t, &notation))
                            .collect::<Vec<_>>()
                            .join(","),
                        None => String::new(),
                    };
                    rows.push((p.clone(), rendered));
                }
                calc.notices.push(Notice::Bindings(rows));
                "true"
            }
        };
        Ok(calc
            .rw()
            .dst
            .define(Head::op("\\textit"), vec![Term::Text(verdict.to_string())]))
    }
}

/// `goal! query`: run the resolution search and report each solution.
struct ExecuteGoal;

impl Command for ExecuteGoal {
    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        _t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term> {
        no_attrs("goal", node)?;
        let sym = calc.enter_subformula(&operand(node, 0));
        let goals = RuleModel::parse_goals(&sym, &calc.rw().dst);
        let mut vars: Vec<String> = Vec::new();
        for g in &goals {
            for v in &g.variables {
                if !vars.contains(v) {
                    vars.push(v.clone());
                }
            }
        }
        let limits = calc.limits.clone();
        let (collected, truncated) = {
            let mut sols = calc.model.search(goals, &limits);
            let v: Vec<_> = sols.by_ref().collect();
            let t = sols.truncated();
            (v, t)
        };
        for (env, nota) in &collected {
            let mut rows = Vec::new();
            for v in &vars {
                if let Some(bound) = env.get(v) {
                    let resolved = crate::comparer::resolve(bound, env);
                    rows.push((v.clone(), writer::render(resolved, nota)));
                }
            }
            calc.notices.push(Notice::Bindings(rows));
        }
        if truncated {
            calc.notices.push(Notice::Info(
                "search budget exhausted; solutions may be incomplete".to_string(),
            ));
        }
        if collected.is_empty() {
            Ok(Term::none())
        } else {
            Ok(create_true(&mut calc.rw().dst))
        }
    }
}

/// `rules!`: list the declared rules.
struct PrintRules;

impl Command for PrintRules {
    fn arity(&self) -> Option<usize> {
        Some(0)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        _t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term> {
        no_attrs("rules", node)?;
        let mut count = 0usize;
        let mut lines = Vec::new();
        for rule in calc.model.rules() {
            let callback = rule
                .head
                .pred()
                .and_then(Term::as_sym)
                .map(|s| calc.model.is_callback(s.name()))
                .unwrap_or(false);
            if callback {
                continue;
            }
            lines.push(Notice::Formula(rule.to_string()));
            count += 1;
        }
        calc.notices.extend(lines);
        calc.notices
            .push(Notice::Info(format!("{count} rule(s) in database")));
        Ok(Term::none())
    }
}

/// `dump! expr`: list the output graph entries, marking the root.
struct DumpNotation;

impl Command for DumpNotation {
    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        _t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term> {
        no_attrs("dump", node)?;
        let sym = calc.enter_subformula(&operand(node, 0));
        let mut lines = Vec::new();
        for (key, entry) in calc.rw().dst.iter() {
            let marker = if Some(key) == sym.as_sym() { "*" } else { " " };
            lines.push(Notice::Info(format!("{marker}{key}: {entry:?}")));
        }
        calc.notices.extend(lines);
        Ok(sym)
    }
}

struct SetEcho {
    flag: bool,
}

impl Command for SetEcho {
    fn arity(&self) -> Option<usize> {
        Some(0)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        _t: &Term,
        _node: &TermNode,
    ) -> SymtexResult<Term> {
        calc.flags.echo = self.flag;
        Ok(Term::none())
    }
}

/// `track! expr`: evaluate while emitting a trace notice per pass.
struct Track;

impl Command for Track {
    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        _t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term> {
        no_attrs("track", node)?;
        calc.flags.track = true;
        calc.flags.echo_once = true;
        Ok(calc.enter_subformula(&operand(node, 0)))
    }
}

struct Clear;

impl Command for Clear {
    fn arity(&self) -> Option<usize> {
        Some(0)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        _t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term> {
        no_attrs("clear", node)?;
        calc.flags.clear_requested = true;
        Ok(Term::none())
    }
}

/// `closure! expr`: copy the command node verbatim, quoting its operand
/// from evaluation.
struct Closure;

impl Command for Closure {
    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn exec(
        &self,
        calc: &mut Calculator<'_>,
        t: &Term,
        node: &TermNode,
    ) -> SymtexResult<Term> {
        no_attrs("closure", node)?;
        let src = calc.rw().src.clone();
        let dst = std::mem::take(&mut calc.rw().dst);
        let mut copier = Copier::with_output(src, dst);
        let out = copier.enter_command(t, node);
        calc.rw().dst = copier.into_output();
        Ok(out)
    }
}
