//! The arithmetic normalizer.
//!
//! [`Calculator`] is the rewriting pass behind evaluation: it folds
//! numeric factors in product chains, merges equal factors into powers,
//! collects like terms in sum chains, evaluates integer powers, drops
//! redundant brackets and sign wrappers, and dispatches command forms.
//! One pass is not a fixpoint; the processor repeats it until the graph
//! stops changing.

use crate::commands::CommandSet;
use crate::comparer::{self, Binding, Param, ParamKind, Pattern, Scope};
use crate::error::SymtexError;
use crate::limits::ResourceLimits;
use crate::notation::{Head, Notation, Term, TermNode};
use crate::response::{Notice, SessionFlags};
use crate::rewrite::{Replicator, Rewriter};
use crate::solver::RuleModel;
use crate::value::Value;
use crate::SymtexResult;

/// Returns the numeric value of a term, looking through brackets and a
/// leading minus.
pub(crate) fn get_value(t: &Term, notation: &Notation) -> Option<Value> {
    if let Term::Num(v) = t {
        return Some(v.clone());
    }
    if let Some(f) = notation.get_if(t, &Head::Group) {
        return get_value(f.args.first()?, notation);
    }
    if let Some(f) = notation.get_if(t, &Head::Minus) {
        return get_value(f.args.first()?, notation)?.mul(&Value::Int(-1));
    }
    None
}

fn is_spacer(t: &Term) -> bool {
    matches!(t, Term::Sym(s) if ["\\!", "\\,", "\\:", "\\;"].contains(&s.name()))
}

/// Numeric factor accumulator for a product chain. Integer, rational and
/// float contributions fold separately so exact parts stay exact until a
/// float forces promotion.
#[derive(Default)]
struct FactorAcc {
    int: Option<Value>,
    ratio: Option<Value>,
    float: Option<Value>,
    overflow: bool,
}

impl FactorAcc {
    fn mul(&mut self, val: &Value) {
        let slot = match val {
            Value::Int(_) => &mut self.int,
            Value::Ratio(..) => &mut self.ratio,
            Value::Float(_) => &mut self.float,
        };
        *slot = match slot.take() {
            None => Some(val.clone()),
            Some(prev) => match prev.mul(val) {
                Some(r) => Some(r),
                None => {
                    self.overflow = true;
                    Some(prev)
                }
            },
        };
    }

    fn value(&self) -> Option<Value> {
        if self.overflow {
            return None;
        }
        let mut res: Option<Value> = None;
        for v in [&self.int, &self.ratio, &self.float].into_iter().flatten() {
            res = Some(match res {
                None => v.clone(),
                Some(r) => r.mul(v)?,
            });
        }
        Some(res.unwrap_or(Value::Int(1)))
    }
}

/// The abbreviated-sign patterns the calculator collapses, built once per
/// processor.
pub(crate) struct CalcPatterns {
    /// `(+x)`
    plus_wrapped: Pattern,
    /// `(-x)`
    minus_wrapped: Pattern,
    /// `(z)^n`, used by the product expansion commands.
    pub(crate) power: Pattern,
}

impl CalcPatterns {
    pub(crate) fn new() -> SymtexResult<Self> {
        Ok(CalcPatterns {
            plus_wrapped: Pattern::from_markup("(+x)", vec![("x", Param::of(ParamKind::Var))])?,
            minus_wrapped: Pattern::from_markup("(-x)", vec![("x", Param::of(ParamKind::Var))])?,
            power: Pattern::from_markup(
                "(z)^n",
                vec![
                    ("z", Param::of(ParamKind::Any)),
                    ("n", Param::of(ParamKind::Integer)),
                ],
            )?,
        })
    }
}

/// One normalization pass over a formula graph.
pub struct Calculator<'a> {
    rw: Rewriter,
    commands: &'a CommandSet,
    pub model: &'a mut RuleModel,
    pub limits: &'a ResourceLimits,
    pub flags: &'a mut SessionFlags,
    pub notices: &'a mut Vec<Notice>,
    pub(crate) patterns: &'a CalcPatterns,
    error: Option<SymtexError>,
}

impl<'a> Calculator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        src: Notation,
        commands: &'a CommandSet,
        model: &'a mut RuleModel,
        limits: &'a ResourceLimits,
        flags: &'a mut SessionFlags,
        notices: &'a mut Vec<Notice>,
        patterns: &'a CalcPatterns,
    ) -> Self {
        Calculator {
            rw: Rewriter::new(src),
            commands,
            model,
            limits,
            flags,
            notices,
            patterns,
            error: None,
        }
    }

    /// Hands back the input and output notations, or the error a handler
    /// recorded mid-pass.
    pub(crate) fn into_parts(self) -> SymtexResult<(Notation, Notation)> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(self.rw.into_parts())
    }

    pub(crate) fn fail(&mut self, e: SymtexError) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }

    /// Numeric factor of a rebuilt term: the leading value of a product
    /// chain, a bare value, or 1.
    pub(crate) fn get_factor(&self, t: &Term) -> Value {
        if let Some(f) = self.rw.dst.get_if_any(t, &[Head::Plus, Head::Group]) {
            let inner = f.args.first().cloned().unwrap_or(Term::Empty);
            return self.get_factor(&inner);
        }
        if let Some(f) = self.rw.dst.get_if(t, &Head::Minus) {
            let inner = f.args.first().cloned().unwrap_or(Term::Empty);
            return self
                .get_factor(&inner)
                .mul(&Value::Int(-1))
                .unwrap_or(Value::Int(1));
        }
        if let Some(v) = get_value(t, &self.rw.dst) {
            return v;
        }
        if let Some(f) = self.rw.dst.get_if(t, &Head::ProductList) {
            if let Some(v) = f.args.first().and_then(|a| get_value(a, &self.rw.dst)) {
                return v;
            }
        }
        Value::Int(1)
    }

    /// Symbolic part of a rebuilt term, as a product argument list.
    /// `None` means the term is purely numeric.
    pub(crate) fn get_expr(&self, t: &Term) -> Option<Vec<Term>> {
        if let Some(f) = self.rw.dst.get_if(t, &Head::Group) {
            let inner = f.args.first().cloned().unwrap_or(Term::Empty);
            if let Some(f2) = self.rw.dst.get_if_any(&inner, &[Head::Plus, Head::Minus]) {
                let a = f2.args.first().cloned().unwrap_or(Term::Empty);
                return self.get_expr(&a);
            }
        }
        if let Some(f) = self.rw.dst.get_if_any(t, &[Head::Plus, Head::Minus]) {
            let a = f.args.first().cloned().unwrap_or(Term::Empty);
            return self.get_expr(&a);
        }
        match t {
            Term::Sym(_) => {
                if get_value(t, &self.rw.dst).is_some() {
                    return None;
                }
                if let Some(f) = self.rw.dst.get_if(t, &Head::ProductList) {
                    let first_numeric = f
                        .args
                        .first()
                        .map(|a| get_value(a, &self.rw.dst).is_some())
                        .unwrap_or(false);
                    if first_numeric {
                        return Some(f.args[1..].to_vec());
                    }
                    return Some(f.args.clone());
                }
                Some(vec![t.clone()])
            }
            _ => None,
        }
    }

    pub(crate) fn make_plist(&mut self, factor: Value, expr: Option<&[Term]>) -> Term {
        match expr {
            None => Term::Num(factor),
            Some(items) => {
                let mut args = vec![Term::Num(factor)];
                for item in items {
                    let r = self.subst(&Term::Empty, item.clone(), Some(&Head::ProductList));
                    args.push(r);
                }
                self.rw.dst.define(Head::ProductList, args)
            }
        }
    }

    /// Exponent of a rebuilt term; 1 for anything without a power.
    pub(crate) fn get_degree(&self, t: &Term) -> Term {
        match self.rw.dst.get_if(t, &Head::Index) {
            Some(f) => f.args.get(3).cloned().unwrap_or(Term::Empty),
            None => Term::int(1),
        }
    }

    /// Attaches or replaces the exponent of a rebuilt term.
    pub(crate) fn make_degree(&mut self, t: &Term, deg: Term) -> Term {
        match self.rw.dst.get_if(t, &Head::Index).cloned() {
            Some(f) => {
                let base = f.args.first().cloned().unwrap_or(Term::Empty);
                let d0 = f.args.get(1).cloned().unwrap_or(Term::Empty);
                let d1 = f.args.get(2).cloned().unwrap_or(Term::Empty);
                let d3 = f.args.get(4).cloned().unwrap_or(Term::Empty);
                let deg = self.subst(&Term::Empty, deg, Some(&Head::Index));
                self.repf(t, TermNode::new(Head::Index, vec![base, d0, d1, deg, d3]))
            }
            None => {
                let base = self.subst(&Term::Empty, t.clone(), Some(&Head::Index));
                let deg = self.subst(&Term::Empty, deg, Some(&Head::Index));
                self.rw.dst.define(
                    Head::Index,
                    vec![base, Term::Empty, Term::Empty, deg, Term::Empty],
                )
            }
        }
    }

    /// Joins degree contributions into a sum chain, splicing chains and
    /// keeping existing sign wrappers.
    pub(crate) fn make_sum(&mut self, args: Vec<Term>) -> Term {
        let mut out = Vec::new();
        for t in args {
            if let Some(f) = self.rw.dst.get_if(&t, &Head::SumList).cloned() {
                out.extend(f.args);
            } else if self.rw.dst.get_if_any(&t, &[Head::Plus, Head::Minus]).is_some() {
                out.push(t);
            } else {
                let r = self.subst(&Term::Empty, t, Some(&Head::SumList));
                out.push(self.rw.dst.define(Head::Plus, vec![r]));
            }
        }
        self.rw.dst.define(Head::SumList, out)
    }

    fn match_sign(&self, p: &Pattern, subject: &Term) -> Option<Term> {
        let b = p.match_against(subject, &self.rw.dst, Scope::Root)?;
        match b.get("x") {
            Some(Binding::One(t)) => Some(t.clone()),
            _ => None,
        }
    }

    fn exprs_equal(&self, a: &Option<Vec<Term>>, b: &Option<Vec<Term>>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(x), Some(y)) => comparer::s_equal_args(
                x,
                &self.rw.dst,
                y,
                &self.rw.dst,
                Scope::Under(Head::SumList),
            ),
            _ => false,
        }
    }
}

impl<'a> Replicator for Calculator<'a> {
    fn rw(&mut self) -> &mut Rewriter {
        &mut self.rw
    }

    fn enter_command(&mut self, t: &Term, node: &TermNode) -> Term {
        let name = node
            .head
            .op_name()
            .unwrap_or_default()
            .trim_end_matches('!')
            .to_string();
        let Some(cmd) = self.commands.get(&name) else {
            self.fail(SymtexError::unknown_command(&name));
            return t.clone();
        };
        if let Some(expected) = cmd.arity() {
            let actual = node.args.len().saturating_sub(1);
            if actual != expected {
                self.fail(SymtexError::command_usage(&name, expected, actual));
                return t.clone();
            }
        }
        match cmd.exec(self, t, node) {
            Ok(r) => r,
            Err(e) => {
                self.fail(e);
                t.clone()
            }
        }
    }

    fn enter_index(&mut self, t: &Term, node: &TermNode) -> Term {
        let dims = self.enter_dims(node);
        let base = node.args.first().cloned().unwrap_or(Term::Empty);
        let scalar = self.enter_scalar(&base);
        if let Some(n) = get_value(&dims[2], &self.rw.dst).and_then(|v| v.as_int()) {
            if n == 0 {
                return Term::int(1);
            }
            if n == 1 {
                return scalar;
            }
            if let Some(val) = get_value(&scalar, &self.rw.dst) {
                if matches!(val, Value::Int(_) | Value::Ratio(..)) {
                    if let Some(p) = val.pow(&Value::Int(n)) {
                        return Term::Num(p);
                    }
                }
            }
        }
        let mut args = vec![scalar];
        args.extend(dims);
        self.repf(t, TermNode::new(Head::Index, args))
    }

    fn enter_group(&mut self, t: &Term, node: &TermNode) -> Term {
        let a = node.args.first().cloned().unwrap_or(Term::Empty);
        let outs = self.enter_formula(&a);
        if matches!(outs, Term::Num(_)) {
            return outs;
        }
        let br = node.prop("br").unwrap_or("()").to_string();
        if br == "()"
            && self
                .rw
                .dst
                .get_if_any(&outs, &[Head::ProductList, Head::Index])
                .is_some()
        {
            if self.rw.context() == Some(Head::Index) {
                let rebuilt = TermNode::new(Head::Group, vec![outs]).with_prop("br", "{}");
                return self.repf(t, rebuilt);
            }
            return outs;
        }
        if let Some(f_out) = self.rw.dst.get_if(&outs, &Head::Group) {
            if f_out.prop("br") == Some(br.as_str()) {
                return outs;
            }
        }
        if self.rw.dst.get_if_any(&outs, &[Head::Plus, Head::Minus]).is_some() {
            let ctx = self.rw.context();
            if ctx.is_none() || ctx == Some(Head::SumList) {
                return outs;
            }
        }
        let mut rebuilt = TermNode::new(Head::Group, vec![outs]);
        rebuilt.props = node.props.clone();
        self.repf(t, rebuilt)
    }

    fn enter_plist(&mut self, t: &Term, node: &TermNode) -> Term {
        let args = self.build_list(node, Self::enter_expr);
        let mut middle: Vec<Term> = Vec::new();
        let mut acc = FactorAcc::default();
        for arg in &args {
            if is_spacer(arg) {
                middle.push(arg.clone());
                continue;
            }
            let val = self.get_factor(arg);
            acc.mul(&val);
            if let Some(mut left) = self.get_expr(arg) {
                middle.append(&mut left);
            }
        }
        let Some(factor) = acc.value() else {
            // Numeric overflow: leave the chain symbolic.
            return self.repf(t, TermNode::new(Head::ProductList, args));
        };
        let mut output: Vec<Term> = Vec::new();
        let mut i = 0;
        while i < middle.len() {
            let left = middle[i].clone();
            if is_spacer(&left) {
                output.push(left);
                i += 1;
                continue;
            }
            let mut deg = vec![self.get_degree(&left)];
            let mut j = i + 1;
            while j < middle.len() {
                let right = middle[j].clone();
                // Equal up to the exponent slot.
                let same = comparer::s_equal(
                    &left,
                    &self.rw.dst,
                    &right,
                    &self.rw.dst,
                    Scope::Slots([true, true, false, true]),
                );
                if same {
                    deg.push(self.get_degree(&right));
                    middle.remove(j);
                } else {
                    j += 1;
                }
            }
            let merged = if deg.len() > 1 {
                let sum = self.make_sum(deg);
                self.make_degree(&left, sum)
            } else {
                left
            };
            output.push(merged);
            i += 1;
        }
        if factor.is_zero() {
            return Term::int(0);
        }
        let negative = factor.is_negative();
        if !factor.numeric_eq(&Value::Int(1)) && !factor.numeric_eq(&Value::Int(-1)) {
            let mut rebuilt = vec![Term::Num(factor.abs())];
            for arg in output {
                let r = self.subst(&Term::Empty, arg, Some(&Head::ProductList));
                rebuilt.push(r);
            }
            output = rebuilt;
        }
        let mut outs = match output.len() {
            0 => return Term::int(1),
            1 => output.remove(0),
            _ => self.repf(t, TermNode::new(Head::ProductList, output)),
        };
        if negative {
            outs = self.rw.dst.define(Head::Minus, vec![outs]);
            let ctx = self.rw.context();
            if ctx.is_some() && ctx != Some(Head::SumList) {
                outs = self.escape(&Term::Empty, "()", outs);
            }
        }
        outs
    }

    fn enter_additive(&mut self, t: &Term, node: &TermNode) -> Term {
        let a = node.args.first().cloned().unwrap_or(Term::Empty);
        let composite = self.enter_composite_expr(&a);
        let ctx = self.rw.context();
        if node.head == Head::Plus {
            // A leading plus is decoration except inside brackets or
            // after the first summand.
            let keep = match self.rw.parent_entry() {
                None => false,
                Some((_, pf)) => {
                    pf.head == Head::Group
                        || (pf.head == Head::SumList
                            && pf.args.iter().position(|x| x == t).unwrap_or(0) > 0)
                }
            };
            if !keep {
                return composite;
            }
            if let Some(x) = self.match_sign(&self.patterns.minus_wrapped, &composite) {
                let r = self.subst(&Term::Empty, x, ctx.as_ref());
                return self.repf(t, TermNode::new(Head::Minus, vec![r]));
            }
        } else {
            if let Some(x) = self.match_sign(&self.patterns.minus_wrapped, &composite) {
                let r = self.subst(&Term::Empty, x, ctx.as_ref());
                return self.repf(t, TermNode::new(Head::Plus, vec![r]));
            }
            if let Some(x) = self.match_sign(&self.patterns.plus_wrapped, &composite) {
                let r = self.subst(&Term::Empty, x, ctx.as_ref());
                return self.repf(t, TermNode::new(Head::Minus, vec![r]));
            }
        }
        self.repf(t, TermNode::new(node.head.clone(), vec![composite]))
    }

    fn enter_slist(&mut self, t: &Term, node: &TermNode) -> Term {
        let mut args = self.build_list(node, Self::enter_additive_expr);
        let mut output: Vec<Term> = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let left = args[i].clone();
            let factor = self.get_factor(&left);
            let expr1 = self.get_expr(&left);
            let mut k = factor.clone();
            let mut j = i + 1;
            while j < args.len() {
                let right = args[j].clone();
                let expr2 = self.get_expr(&right);
                if self.exprs_equal(&expr1, &expr2) {
                    match k.add(&self.get_factor(&right)) {
                        Some(sum) => {
                            k = sum;
                            args.remove(j);
                        }
                        None => j += 1,
                    }
                } else {
                    j += 1;
                }
            }
            if factor.numeric_eq(&k) {
                output.push(left);
            } else if !k.is_zero() {
                let negative = k.is_negative();
                let mut res = self.make_plist(k.abs(), expr1.as_deref());
                if !negative && !output.is_empty() {
                    res = self.rw.dst.define(Head::Plus, vec![res]);
                } else if negative {
                    res = self.rw.dst.define(Head::Minus, vec![res]);
                }
                output.push(res);
            }
            i += 1;
        }
        match output.len() {
            0 => Term::int(0),
            1 => output.remove(0),
            _ => self.repf(t, TermNode::new(Head::SumList, output)),
        }
    }
}
