//! Literal folding and application recognition ahead of normalization.
//!
//! Folds `\frac`-family operators over integer literals into rational
//! values, joins mixed numbers and differential symbols, recognizes
//! function application inside product chains, and resolves
//! back-references against the session history.

use crate::error::SymtexError;
use crate::notation::{
    Head, Notation, Symbol, Term, TermNode, BIG_OPERATORS, COMMON_FUNCS, UNARY_FUNCS,
};
use crate::rewrite::{Importer, Replicator, Rewriter};
use crate::value::Value;

const FRACTIONS: &[&str] = &["\\frac", "\\dfrac", "\\cfrac", "\\tfrac"];

pub struct Preprocessor<'a> {
    rw: Rewriter,
    history: &'a [(Term, Notation)],
    error: Option<SymtexError>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(src: Notation, history: &'a [(Term, Notation)]) -> Self {
        Preprocessor { rw: Rewriter::new(src), history, error: None }
    }

    pub fn run(mut self, root: &Term) -> crate::SymtexResult<(Term, Notation)> {
        let out = self.apply(root);
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok((out, self.rw.into_output()))
    }

    fn name_of(t: &Term) -> Option<&str> {
        t.as_sym().map(Symbol::name)
    }

    fn is_any(t: &Term, names: &[&str]) -> bool {
        Self::name_of(t).map(|n| names.contains(&n)).unwrap_or(false)
    }

    /// A rebuilt operand counts as an integer literal even when the
    /// writer braced it.
    fn int_literal(&self, t: &Term) -> Option<Value> {
        match t {
            Term::Num(v @ Value::Int(_)) => Some(v.clone()),
            _ => match self.rw.dst.get_if(t, &Head::Group) {
                Some(node) => match node.args.first() {
                    Some(Term::Num(v @ Value::Int(_))) => Some(v.clone()),
                    _ => None,
                },
                None => None,
            },
        }
    }

    fn transform_plist(&mut self, key: &Term, args: Vec<Term>) -> Term {
        let mut res: Vec<Term> = Vec::new();
        let mut i = 0;
        while i < args.len() {
            if i + 1 < args.len() {
                // A whole number followed by a fraction is a mixed
                // number: 1 \frac{1}{2} reads as three halves.
                if let (Some(Term::Num(a)), Some(Term::Num(b))) =
                    (args.get(i), args.get(i + 1))
                {
                    if matches!(a, Value::Int(_)) && matches!(b, Value::Ratio(..)) {
                        if let Some(sum) = a.add(b) {
                            res.push(Term::Num(sum));
                            i += 2;
                            continue;
                        }
                    }
                }
                if Self::is_any(&args[i], &["d"])
                    && Self::is_any(&args[i + 1], &["x", "y", "z", "t"])
                {
                    let joined = format!(
                        "{}{}",
                        Self::name_of(&args[i]).unwrap_or_default(),
                        Self::name_of(&args[i + 1]).unwrap_or_default()
                    );
                    res.push(Term::sym(joined));
                    i += 2;
                    continue;
                }
                let mut pri = args[i].clone();
                if let Some(index_f) = self.rw.dst.get_if(&pri, &Head::Index) {
                    let left_empty = index_f.args.get(1).map(Term::is_empty).unwrap_or(true)
                        && index_f.args.get(2).map(Term::is_empty).unwrap_or(true);
                    if left_empty {
                        pri = index_f.args.first().cloned().unwrap_or(Term::Empty);
                    }
                }
                let mut sec = args[i + 1].clone();
                let grouped = match self.rw.dst.get_if(&sec, &Head::Group) {
                    Some(group_f) => {
                        sec = group_f.args.first().cloned().unwrap_or(Term::Empty);
                        true
                    }
                    None => false,
                };
                if Self::is_any(&pri, UNARY_FUNCS) {
                    let node = TermNode::new(Head::Apply, vec![args[i].clone(), sec])
                        .with_prop("fmt", "unary");
                    res.push(self.rw.dst.define_node(node));
                    i += 2;
                    continue;
                }
                if grouped && Self::is_any(&pri, COMMON_FUNCS) {
                    let node = TermNode::new(Head::Apply, vec![args[i].clone(), sec]);
                    res.push(self.rw.dst.define_node(node));
                    i += 2;
                    continue;
                }
                if !grouped && Self::is_any(&pri, BIG_OPERATORS) {
                    let rest = args[i + 1..].to_vec();
                    let body = self.transform_plist(&Term::Empty, rest);
                    let node = TermNode::new(Head::Apply, vec![args[i].clone(), body])
                        .with_prop("fmt", "oper");
                    res.push(self.rw.dst.define_node(node));
                    break;
                }
            }
            res.push(args[i].clone());
            i += 1;
        }
        if res.len() == 1 {
            return res.remove(0);
        }
        self.repf(key, TermNode::new(Head::ProductList, res))
    }
}

impl<'a> Replicator for Preprocessor<'a> {
    fn rw(&mut self) -> &mut Rewriter {
        &mut self.rw
    }

    fn enter_plist(&mut self, t: &Term, node: &TermNode) -> Term {
        let args = self.build_list(node, Self::enter_additive_expr);
        self.transform_plist(t, args)
    }

    fn enter_oper(&mut self, t: &Term, node: &TermNode) -> Term {
        let mut args = Vec::with_capacity(node.args.len());
        for a in &node.args {
            let a = a.clone();
            let r = self.enter_expr(&a);
            args.push(r);
        }
        if let Head::Op(name) = &node.head {
            if FRACTIONS.contains(&name.as_str()) && args.len() == 2 {
                if let (Some(n), Some(d)) =
                    (self.int_literal(&args[0]), self.int_literal(&args[1]))
                {
                    if let Some(q) = n.div(&d) {
                        return Term::Num(q);
                    }
                }
            }
        }
        let mut rebuilt = TermNode::new(node.head.clone(), args);
        rebuilt.props = node.props.clone();
        self.repf(t, rebuilt)
    }

    fn enter_group(&mut self, t: &Term, node: &TermNode) -> Term {
        let a = node.args.first().cloned().unwrap_or(Term::Empty);
        let out = self.enter_formula(&a);
        if matches!(out, Term::Num(_)) {
            return out;
        }
        let mut rebuilt = TermNode::new(Head::Group, vec![out]);
        rebuilt.props = node.props.clone();
        self.repf(t, rebuilt)
    }

    fn enter_backref(&mut self, t: &Term, node: &TermNode) -> Term {
        let k = node
            .args
            .first()
            .and_then(Term::as_num)
            .and_then(Value::as_int)
            .unwrap_or(0);
        let len = self.history.len() as i64;
        let idx = if k > 0 { k - 1 } else { len + k };
        let Some((root, notation)) = usize::try_from(idx)
            .ok()
            .and_then(|i| self.history.get(i))
            .cloned()
        else {
            self.error = Some(SymtexError::engine(format!(
                "back-reference [[{k}]] has no matching execution"
            )));
            return Term::Empty;
        };
        let dst = std::mem::take(&mut self.rw.dst);
        let mut importer = Importer::with_output(notation, dst);
        let linked = importer.enter_subformula(&root);
        self.rw.dst = importer.into_output();
        let ctx = self.context();
        self.subst(t, linked, ctx.as_ref())
    }
}
