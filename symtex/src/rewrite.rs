//! The traversal and rebuilding framework.
//!
//! [`Replicator`] walks a source graph along the grammatical structure
//! (formula, comparison, comma list, sum list, product list, index,
//! scalar, leaf) and rebuilds it into a destination notation. Every
//! default handler is a faithful copy; rewriters override the handlers
//! for the categories they transform and inherit the rest.
//!
//! Rebuilding tracks an explicit parent stack so handlers can consult
//! their syntactic context, and [`Replicator::subst`] re-inserts brackets
//! wherever a rebuilt child would otherwise re-associate with its new
//! context.

use crate::notation::{Head, Notation, Symbol, Term, TermNode};

/// Mutable traversal state shared by all rewriters.
#[derive(Debug, Default)]
pub struct Rewriter {
    pub src: Notation,
    pub dst: Notation,
    stack: Vec<(Term, TermNode)>,
}

impl Rewriter {
    pub fn new(src: Notation) -> Self {
        Rewriter { src, dst: Notation::new(), stack: Vec::new() }
    }

    pub fn with_output(src: Notation, dst: Notation) -> Self {
        Rewriter { src, dst, stack: Vec::new() }
    }

    pub fn push(&mut self, t: &Term, node: &TermNode) {
        self.stack.push((t.clone(), node.clone()));
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Head of the node enclosing the one currently being rebuilt.
    pub fn context(&self) -> Option<Head> {
        self.parent_entry().map(|(_, n)| n.head.clone())
    }

    /// Term and node enclosing the one currently being rebuilt.
    pub fn parent_entry(&self) -> Option<&(Term, TermNode)> {
        if self.stack.len() < 2 {
            return None;
        }
        self.stack.get(self.stack.len() - 2)
    }

    /// Term currently being rebuilt.
    pub fn current(&self) -> Option<&(Term, TermNode)> {
        self.stack.last()
    }

    pub fn into_output(self) -> Notation {
        self.dst
    }

    pub fn into_parts(self) -> (Notation, Notation) {
        (self.src, self.dst)
    }
}

/// Bracket requirements for a rebuilt child in a given context. A sign
/// chain nested in a sign or product, or a looser list nested in a
/// tighter one, re-associates without parentheses.
fn needs_parens(ctx: &Head, child: &TermNode) -> bool {
    if *ctx == Head::SumList && child.head.is_command() {
        return true;
    }
    matches!(
        (ctx, &child.head),
        (Head::ProductList, Head::SumList)
            | (Head::ProductList, Head::CommaList)
            | (Head::SumList, Head::CommaList)
            | (Head::ProductList, Head::Plus)
            | (Head::ProductList, Head::Minus)
            | (Head::Plus, Head::Plus)
            | (Head::Plus, Head::Minus)
            | (Head::Minus, Head::Plus)
            | (Head::Minus, Head::Minus)
            | (Head::Plus, Head::SumList)
            | (Head::Minus, Head::SumList)
    )
}

fn is_named_operator(head: &Head) -> bool {
    matches!(head, Head::Op(name) if !name.ends_with('!') && !name.starts_with("\\text"))
}

pub trait Replicator: Sized {
    fn rw(&mut self) -> &mut Rewriter;

    /// Key translation for rebuilt nodes; identity by default.
    fn mapsym(&mut self, sym: &Symbol) -> Symbol {
        sym.clone()
    }

    /// Registers `node` in the output under the translated key of `t`,
    /// or under a fresh key for non-symbol terms.
    fn repf(&mut self, t: &Term, node: TermNode) -> Term {
        let key = t.as_sym().map(|s| self.mapsym(s));
        Term::Sym(self.rw().dst.put(key, node))
    }

    fn context(&mut self) -> Option<Head> {
        self.rw().context()
    }

    /// Wraps `inner` in a bracket group.
    fn escape(&mut self, t: &Term, br: &str, inner: Term) -> Term {
        let node = TermNode::new(Head::Group, vec![inner]).with_prop("br", br);
        self.repf(t, node)
    }

    /// Re-brackets a rebuilt term for the context it lands in.
    fn subst(&mut self, t: &Term, new_term: Term, ctx: Option<&Head>) -> Term {
        let Some(node) = self.rw().dst.get(&new_term).cloned() else {
            return new_term;
        };
        if let Some(ctx) = ctx {
            if is_named_operator(ctx) {
                return self.escape(t, "{}", new_term);
            }
            if *ctx == Head::Index || needs_parens(ctx, &node) {
                return self.escape(t, "()", new_term);
            }
        }
        new_term
    }

    fn apply(&mut self, t: &Term) -> Term {
        self.enter_formula(t)
    }

    fn enter_formula(&mut self, t: &Term) -> Term {
        if let Some(node) = self.rw().src.get(t).cloned() {
            if node.head.is_command() {
                self.rw().push(t, &node);
                let r = self.enter_command(t, &node);
                self.rw().pop();
                return r;
            }
            if node.head == Head::Negation {
                self.rw().push(t, &node);
                let r = self.enter_negation(t, &node);
                self.rw().pop();
                return r;
            }
        }
        self.enter_subformula(t)
    }

    fn enter_subformula(&mut self, t: &Term) -> Term {
        if let Some(node) = self.rw().src.get_if(t, &Head::Comparison).cloned() {
            self.rw().push(t, &node);
            let r = self.enter_comparison(t, &node);
            self.rw().pop();
            return r;
        }
        self.enter_comma_list(t)
    }

    fn enter_comma_list(&mut self, t: &Term) -> Term {
        if let Some(node) = self.rw().src.get_if(t, &Head::CommaList).cloned() {
            self.rw().push(t, &node);
            let r = self.enter_clist(t, &node);
            self.rw().pop();
            return r;
        }
        self.enter_sum_list(t)
    }

    fn enter_sum_list(&mut self, t: &Term) -> Term {
        if let Some(node) = self.rw().src.get_if(t, &Head::SumList).cloned() {
            self.rw().push(t, &node);
            let r = self.enter_slist(t, &node);
            self.rw().pop();
            return r;
        }
        self.enter_additive_expr(t)
    }

    fn enter_additive_expr(&mut self, t: &Term) -> Term {
        if let Some(node) =
            self.rw().src.get_if_any(t, &[Head::Plus, Head::Minus]).cloned()
        {
            self.rw().push(t, &node);
            let r = self.enter_additive(t, &node);
            self.rw().pop();
            return r;
        }
        self.enter_composite_expr(t)
    }

    fn enter_composite_expr(&mut self, t: &Term) -> Term {
        let node = match self.rw().src.get(t) {
            Some(n) => n.clone(),
            None => return self.enter_expr(t),
        };
        match node.head {
            Head::ProductList => {
                self.rw().push(t, &node);
                let r = self.enter_plist(t, &node);
                self.rw().pop();
                r
            }
            Head::Slash => {
                self.rw().push(t, &node);
                let r = self.enter_slash(t, &node);
                self.rw().pop();
                r
            }
            Head::Star => {
                self.rw().push(t, &node);
                let r = self.enter_star(t, &node);
                self.rw().pop();
                r
            }
            _ => self.enter_expr(t),
        }
    }

    fn enter_expr(&mut self, t: &Term) -> Term {
        let node = match self.rw().src.get(t) {
            Some(n) => n.clone(),
            None => {
                return match t {
                    Term::Sym(s) => self.enter_symbol(&s.clone()),
                    _ => self.enter_raw_term(t),
                };
            }
        };
        match &node.head {
            Head::Index => {
                self.rw().push(t, &node);
                let r = self.enter_index(t, &node);
                self.rw().pop();
                r
            }
            Head::Op(_) if !node.head.is_command() && !is_text_head(&node.head) => {
                self.rw().push(t, &node);
                let r = self.enter_oper(t, &node);
                self.rw().pop();
                r
            }
            _ => self.enter_scalar(t),
        }
    }

    fn enter_scalar(&mut self, t: &Term) -> Term {
        let node = match self.rw().src.get(t) {
            Some(n) => n.clone(),
            None => return self.enter_term(t),
        };
        match &node.head {
            Head::Group => {
                self.rw().push(t, &node);
                let r = self.enter_group(t, &node);
                self.rw().pop();
                r
            }
            Head::Apply => {
                self.rw().push(t, &node);
                let r = self.enter_func(t, &node);
                self.rw().pop();
                r
            }
            Head::BackRef => {
                self.rw().push(t, &node);
                let r = self.enter_backref(t, &node);
                self.rw().pop();
                r
            }
            Head::Op(_) if is_text_head(&node.head) => {
                self.rw().push(t, &node);
                let r = self.enter_text(t, &node);
                self.rw().pop();
                r
            }
            _ => self.enter_term(t),
        }
    }

    fn enter_term(&mut self, t: &Term) -> Term {
        match t {
            Term::Sym(s) if self.rw().src.get(t).is_none() => self.enter_symbol(&s.clone()),
            _ => self.enter_raw_term(t),
        }
    }

    fn enter_symbol(&mut self, sym: &Symbol) -> Term {
        Term::Sym(sym.clone())
    }

    fn enter_raw_term(&mut self, t: &Term) -> Term {
        t.clone()
    }

    /// Rebuilds a variadic chain, splicing rebuilt children that carry
    /// the same head into the parent list.
    fn build_list(
        &mut self,
        node: &TermNode,
        f: fn(&mut Self, &Term) -> Term,
    ) -> Vec<Term> {
        let mut out = Vec::new();
        for a in &node.args {
            let r = f(self, a);
            if self.rw().dst.get_if(&r, &node.head).is_some() {
                if let Some(child) = self.rw().dst.remove(&r) {
                    out.extend(child.args);
                }
            } else {
                out.push(r);
            }
        }
        out
    }

    /// Rebuilds the four script slots of an index node.
    fn enter_dims(&mut self, node: &TermNode) -> Vec<Term> {
        let mut out = Vec::with_capacity(4);
        for i in 1..5 {
            match node.args.get(i) {
                Some(dim) if !dim.is_empty() => {
                    let dim = dim.clone();
                    out.push(self.enter_scalar(&dim));
                }
                _ => out.push(Term::Empty),
            }
        }
        out
    }

    fn enter_command(&mut self, t: &Term, node: &TermNode) -> Term {
        let mut args = Vec::with_capacity(node.args.len());
        match node.args.first() {
            Some(attrs) if !attrs.is_empty() => {
                let attrs = attrs.clone();
                let r = self.enter_comma_list(&attrs);
                args.push(r);
            }
            _ => args.push(Term::Empty),
        }
        for a in node.args.iter().skip(1) {
            let a = a.clone();
            let r = self.enter_subformula(&a);
            args.push(r);
        }
        let mut rebuilt = TermNode::new(node.head.clone(), args);
        rebuilt.props = node.props.clone();
        self.repf(t, rebuilt)
    }

    fn enter_negation(&mut self, t: &Term, node: &TermNode) -> Term {
        let a = node.args.first().cloned().unwrap_or(Term::Empty);
        let r = self.enter_subformula(&a);
        self.repf(t, TermNode::new(Head::Negation, vec![r]))
    }

    fn enter_comparison(&mut self, t: &Term, node: &TermNode) -> Term {
        let lhs = node.args.first().cloned().unwrap_or(Term::Empty);
        let rhs = node.args.get(1).cloned().unwrap_or(Term::Empty);
        let lhs = self.enter_additive_expr(&lhs);
        let rhs = self.enter_comma_list(&rhs);
        let mut rebuilt = TermNode::new(Head::Comparison, vec![lhs, rhs]);
        rebuilt.props = node.props.clone();
        self.repf(t, rebuilt)
    }

    fn enter_clist(&mut self, t: &Term, node: &TermNode) -> Term {
        let args = self.build_list(node, Self::enter_sum_list);
        self.repf(t, TermNode::new(Head::CommaList, args))
    }

    fn enter_slist(&mut self, t: &Term, node: &TermNode) -> Term {
        let args = self.build_list(node, Self::enter_additive_expr);
        self.repf(t, TermNode::new(Head::SumList, args))
    }

    fn enter_additive(&mut self, t: &Term, node: &TermNode) -> Term {
        let a = node.args.first().cloned().unwrap_or(Term::Empty);
        let r = self.enter_composite_expr(&a);
        self.repf(t, TermNode::new(node.head.clone(), vec![r]))
    }

    fn enter_plist(&mut self, t: &Term, node: &TermNode) -> Term {
        let args = self.build_list(node, Self::enter_expr);
        self.repf(t, TermNode::new(Head::ProductList, args))
    }

    fn enter_slash(&mut self, t: &Term, node: &TermNode) -> Term {
        let a = node.args.first().cloned().unwrap_or(Term::Empty);
        let b = node.args.get(1).cloned().unwrap_or(Term::Empty);
        let a = self.enter_expr(&a);
        let b = self.enter_expr(&b);
        self.repf(t, TermNode::new(Head::Slash, vec![a, b]))
    }

    fn enter_star(&mut self, t: &Term, node: &TermNode) -> Term {
        let a = node.args.first().cloned().unwrap_or(Term::Empty);
        let b = node.args.get(1).cloned().unwrap_or(Term::Empty);
        let a = self.enter_expr(&a);
        let b = self.enter_expr(&b);
        self.repf(t, TermNode::new(Head::Star, vec![a, b]))
    }

    fn enter_index(&mut self, t: &Term, node: &TermNode) -> Term {
        let base = node.args.first().cloned().unwrap_or(Term::Empty);
        let base = self.enter_scalar(&base);
        let dims = self.enter_dims(node);
        let mut args = vec![base];
        args.extend(dims);
        self.repf(t, TermNode::new(Head::Index, args))
    }

    fn enter_oper(&mut self, t: &Term, node: &TermNode) -> Term {
        let mut args = Vec::with_capacity(node.args.len());
        for a in &node.args {
            let a = a.clone();
            let r = self.enter_expr(&a);
            args.push(r);
        }
        let mut rebuilt = TermNode::new(node.head.clone(), args);
        rebuilt.props = node.props.clone();
        self.repf(t, rebuilt)
    }

    fn enter_group(&mut self, t: &Term, node: &TermNode) -> Term {
        let a = node.args.first().cloned().unwrap_or(Term::Empty);
        let r = self.enter_formula(&a);
        let mut rebuilt = TermNode::new(Head::Group, vec![r]);
        rebuilt.props = node.props.clone();
        self.repf(t, rebuilt)
    }

    fn enter_func(&mut self, t: &Term, node: &TermNode) -> Term {
        let name = node.args.first().cloned().unwrap_or(Term::Empty);
        let arg = node.args.get(1).cloned().unwrap_or(Term::Empty);
        let name = self.enter_expr(&name);
        let arg = self.enter_formula(&arg);
        let mut rebuilt = TermNode::new(Head::Apply, vec![name, arg]);
        rebuilt.props = node.props.clone();
        self.repf(t, rebuilt)
    }

    fn enter_text(&mut self, t: &Term, node: &TermNode) -> Term {
        self.repf(t, node.clone())
    }

    fn enter_backref(&mut self, t: &Term, node: &TermNode) -> Term {
        self.repf(t, node.clone())
    }
}

fn is_text_head(head: &Head) -> bool {
    matches!(head, Head::Op(name) if name.starts_with("\\text") && name != "\\textstyle")
}

/// Plain structural copy into a fresh output notation.
pub struct Copier {
    rw: Rewriter,
}

impl Copier {
    pub fn new(src: Notation) -> Self {
        Copier { rw: Rewriter::new(src) }
    }

    pub fn with_output(src: Notation, dst: Notation) -> Self {
        Copier { rw: Rewriter::with_output(src, dst) }
    }

    pub fn into_output(self) -> Notation {
        self.rw.into_output()
    }
}

impl Replicator for Copier {
    fn rw(&mut self) -> &mut Rewriter {
        &mut self.rw
    }
}

/// Copy that re-keys every node onto fresh symbols, for importing a
/// subgraph into a notation that may already use the original keys.
pub struct Importer {
    rw: Rewriter,
    symmap: std::collections::HashMap<Symbol, Symbol>,
}

impl Importer {
    pub fn with_output(src: Notation, dst: Notation) -> Self {
        Importer {
            rw: Rewriter::with_output(src, dst),
            symmap: std::collections::HashMap::new(),
        }
    }

    pub fn into_output(self) -> Notation {
        self.rw.into_output()
    }
}

impl Replicator for Importer {
    fn rw(&mut self) -> &mut Rewriter {
        &mut self.rw
    }

    fn mapsym(&mut self, sym: &Symbol) -> Symbol {
        self.symmap
            .entry(sym.clone())
            .or_insert_with(Symbol::fresh)
            .clone()
    }
}
