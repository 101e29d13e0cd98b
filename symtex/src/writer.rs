//! Rendering a graph back to markup.
//!
//! Tokens are glued with a space wherever running them together would
//! change the lexing (digit runs, backslash words, variable markers).

use crate::notation::{Head, Notation, Term, TermNode};

/// Renders the subgraph rooted at `t`.
pub fn render(t: &Term, notation: &Notation) -> String {
    let mut w = MathWriter { notation, out: String::new() };
    w.write_term(t);
    w.out
}

/// Counts the literal leaves under `t`. The single-term parameter kind
/// accepts subjects with at most one.
pub fn count_terms(t: &Term, notation: &Notation) -> usize {
    match t {
        Term::Empty => 0,
        Term::Num(_) | Term::Text(_) => 1,
        Term::Sym(_) => match notation.get(t) {
            None => 1,
            Some(node) => node.args.iter().map(|a| count_terms(a, notation)).sum(),
        },
    }
}

struct MathWriter<'a> {
    notation: &'a Notation,
    out: String,
}

fn needs_space(last: char, next: char) -> bool {
    last.is_ascii_alphanumeric()
        && (next.is_ascii_alphanumeric() || next == '\\' || next == '#' || next == '.')
}

impl<'a> MathWriter<'a> {
    fn push(&mut self, token: &str) {
        if let (Some(a), Some(b)) = (self.out.chars().last(), token.chars().next()) {
            if needs_space(a, b) {
                self.out.push(' ');
            }
        }
        self.out.push_str(token);
    }

    fn write_term(&mut self, t: &Term) {
        match t {
            Term::Empty => {}
            Term::Num(v) => self.push(&v.to_string()),
            Term::Text(text) => self.push(text),
            Term::Sym(sym) => match self.notation.get(t) {
                Some(node) => self.write_node(&node.clone()),
                None => self.push(sym.name()),
            },
        }
    }

    fn write_node(&mut self, node: &TermNode) {
        match &node.head {
            Head::Comparison => {
                self.write_arg(node, 0);
                self.push(node.prop("op").unwrap_or("="));
                self.write_arg(node, 1);
            }
            Head::CommaList => {
                for (i, a) in node.args.iter().enumerate() {
                    if i > 0 {
                        self.push(",");
                    }
                    self.write_term(a);
                }
            }
            Head::SumList | Head::ProductList => {
                for a in &node.args {
                    self.write_term(a);
                }
            }
            Head::Plus => {
                self.push("+");
                self.write_arg(node, 0);
            }
            Head::Minus => {
                self.push("-");
                self.write_arg(node, 0);
            }
            Head::Slash => {
                self.write_arg(node, 0);
                self.push("/");
                self.write_arg(node, 1);
            }
            Head::Star => {
                self.write_arg(node, 0);
                self.push("\\cdot");
                self.write_arg(node, 1);
            }
            Head::Index => self.write_index(node),
            Head::Group => {
                let (open, close) = match node.prop("br") {
                    Some("{}") => ("{", "}"),
                    Some("||") => ("|", "|"),
                    _ => ("(", ")"),
                };
                self.push(open);
                self.write_arg(node, 0);
                self.out.push_str(close);
            }
            Head::Apply => self.write_apply(node),
            Head::Negation => {
                self.push("\\neg");
                self.write_arg(node, 0);
            }
            Head::BackRef => {
                self.push("[[");
                self.write_arg(node, 0);
                self.out.push_str("]]");
            }
            Head::Op(name) if node.head.is_command() => {
                self.push(name);
                if !node.args.is_empty() && !node.args[0].is_empty() {
                    self.push("[");
                    self.write_arg(node, 0);
                    self.out.push_str("]");
                }
                for (i, a) in node.args.iter().enumerate().skip(1) {
                    if i > 1 {
                        self.push("\\Box");
                    }
                    self.write_term(a);
                }
            }
            Head::Op(name) => {
                self.push(name);
                if let Some(Term::Text(text)) = node.args.first() {
                    self.push("{");
                    self.out.push_str(text);
                    self.out.push('}');
                } else {
                    for a in &node.args {
                        self.write_operand(a);
                    }
                }
            }
        }
    }

    fn write_index(&mut self, node: &TermNode) {
        self.write_arg(node, 0);
        let sup = node.args.get(3).cloned().unwrap_or(Term::Empty);
        let sub = node.args.get(4).cloned().unwrap_or(Term::Empty);
        if !sup.is_empty() {
            self.out.push('^');
            self.write_script(&sup);
        }
        if !sub.is_empty() {
            self.out.push('_');
            self.write_script(&sub);
        }
    }

    fn write_apply(&mut self, node: &TermNode) {
        let name = match node.args.first() {
            Some(Term::Sym(s)) => s.name().to_string(),
            _ => String::new(),
        };
        match node.prop("fmt") {
            Some("operatorname") => {
                self.push("\\operatorname");
                self.out.push('{');
                self.out.push_str(&name);
                self.out.push('}');
                self.out.push('(');
                if let Some(a) = node.args.get(1) {
                    self.write_term(a);
                }
                self.out.push(')');
            }
            Some("unary") | Some("oper") => {
                self.push(&name);
                if let Some(a) = node.args.get(1) {
                    self.write_term(a);
                }
            }
            _ => {
                self.push(&name);
                self.push("(");
                if let Some(a) = node.args.get(1) {
                    self.write_term(a);
                }
                self.out.push(')');
            }
        }
    }

    /// Scripts are written bare when a single token suffices, braced
    /// otherwise.
    fn write_script(&mut self, t: &Term) {
        let simple = match t {
            Term::Num(v) => !v.is_negative() && v.as_int().is_some(),
            Term::Sym(_) => self.notation.get(t).is_none(),
            _ => false,
        };
        if simple {
            self.write_term(t);
        } else {
            self.out.push('{');
            self.write_term(t);
            self.out.push('}');
        }
    }

    /// Operands of named operators are braced unless they are bare
    /// leaves.
    fn write_operand(&mut self, t: &Term) {
        let simple = match t {
            Term::Num(v) => !v.is_negative() && v.as_int().is_some(),
            Term::Sym(_) => self.notation.get(t).is_none(),
            _ => false,
        };
        if simple {
            self.write_term(t);
        } else {
            self.push("{");
            self.write_term(t);
            self.out.push('}');
        }
    }

    fn write_arg(&mut self, node: &TermNode, i: usize) {
        if let Some(a) = node.args.get(i) {
            let a = a.clone();
            self.write_term(&a);
        }
    }
}
