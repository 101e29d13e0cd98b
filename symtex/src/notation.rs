//! The term graph store.
//!
//! A formula is a directed acyclic graph of nodes keyed by [`Symbol`]s.
//! Every interior node is a [`TermNode`] (head, arguments, properties)
//! registered in a [`Notation`]; a [`Symbol`] without an entry is a plain
//! literal leaf. This dual role lets rewriters share untouched subgraphs
//! between input and output notations by reference.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::value::Value;

static FRESH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reserved symbol name returned by control commands that produce no value.
pub const NONE_NAME: &str = "\\none";
/// The ellipsis literal used by run-length patterns.
pub const ELLIPSIS_NAME: &str = "...";
/// The turnstile literal separating a rule head from its goals.
pub const TURNSTILE_NAME: &str = "\\dashv";
/// The cut literal inside goal lists.
pub const CUT_NAME: &str = "!";

/// Decorative markers that carry no mathematical meaning. List comparison
/// filters them out on both sides.
pub const STYLES: &[&str] = &[
    "\\bf", "\\rm", "\\displaystyle", "\\textstyle", "\\frak", "\\cal",
    "\\!", "\\,", "\\:", "\\>", "\\;", "\\ ",
];

/// Function names applied to a bare operand, `\sin x`.
pub const UNARY_FUNCS: &[&str] = &[
    "\\sin", "\\sinh", "\\cos", "\\cosh", "\\cot", "\\coth", "\\sec",
    "\\csc", "\\tan", "\\tanh", "\\delta", "\\Delta", "\\varDelta",
];

/// Names conventionally used as functions when followed by a
/// parenthesized group, `f(x)`.
pub const COMMON_FUNCS: &[&str] = &[
    "f", "g", "\\omega", "\\Omega", "\\sigma", "\\rho", "\\psi", "\\Psi",
    "\\phi", "\\Phi", "\\pi", "\\Pi", "\\nabla", "\\mu", "\\tau", "\\theta",
    "\\Theta", "\\Gamma", "\\Xi", "\\xi", "\\kappa",
];

/// Big operators that consume the remainder of a product chain.
pub const BIG_OPERATORS: &[&str] = &[
    "\\sum", "\\lim", "\\int", "\\prod", "\\intop", "\\coprod", "\\iint",
    "\\iiint", "\\oint",
];

/// An interned node reference or literal leaf.
///
/// Fresh symbols minted by [`Symbol::fresh`] draw from a process-wide
/// counter, so subgraphs imported across notations never collide.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol(name.into())
    }

    /// Mints a new reference symbol, `_n0`, `_n1`, ...
    pub fn fresh() -> Self {
        let n = FRESH_COUNTER.fetch_add(1, Ordering::Relaxed);
        Symbol(format!("_n{n}"))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Pattern variables are spelled with a leading `#`. The bare `##`
    /// marker is a literal, not a variable.
    pub fn is_variable(&self) -> bool {
        self.0.starts_with('#') && self.0 != "##"
    }

    pub fn is_style(&self) -> bool {
        STYLES.contains(&self.0.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// The closed set of structural node kinds.
///
/// Named operators (`\frac`, `\sqrt`, styles applied as operators) and
/// command forms share [`Head::Op`]; a command form is an `Op` whose name
/// ends in `!`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Head {
    /// Binary relation; the operator is kept in the `op` property.
    Comparison,
    CommaList,
    /// Additive chain; every operand after the first is wrapped in
    /// [`Head::Plus`] or [`Head::Minus`].
    SumList,
    /// Multiplicative chain by juxtaposition.
    ProductList,
    Slash,
    Star,
    /// Five argument slots: base, sup-left, sub-left, sup-right, sub-right.
    /// Unused slots hold [`Term::Empty`]. Slot 3 (sup-right) is the
    /// exponent.
    Index,
    Plus,
    Minus,
    /// Bracketed subformula; the bracket style lives in the `br` property.
    Group,
    /// Function application: name expression followed by the argument
    /// formula. The `fmt` property records how it was written.
    Apply,
    Negation,
    /// Reference to an earlier execution, `[[n]]`.
    BackRef,
    /// A named operator such as `\frac`, or a command form when the name
    /// ends in `!`.
    Op(String),
}

impl Head {
    pub fn op(name: impl Into<String>) -> Self {
        Head::Op(name.into())
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Head::Op(name) if name.ends_with('!'))
    }

    pub fn op_name(&self) -> Option<&str> {
        match self {
            Head::Op(name) => Some(name),
            _ => None,
        }
    }
}

/// An argument slot of a node: nothing, a symbol (node reference or
/// literal), a numeric literal, or verbatim text.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Empty,
    Sym(Symbol),
    Num(Value),
    Text(String),
}

impl Term {
    pub fn sym(name: impl Into<String>) -> Self {
        Term::Sym(Symbol::new(name.into()))
    }

    pub fn int(n: i64) -> Self {
        Term::Num(Value::Int(n))
    }

    pub fn as_sym(&self) -> Option<&Symbol> {
        match self {
            Term::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<&Value> {
        match self {
            Term::Num(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Term::Empty)
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Sym(s) if s.is_variable())
    }

    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, Term::Sym(s) if s.name() == name)
    }

    pub fn is_style(&self) -> bool {
        matches!(self, Term::Sym(s) if s.is_style())
    }

    /// The `\none` sentinel produced by control commands.
    pub fn none() -> Self {
        Term::sym(NONE_NAME)
    }

    pub fn is_none_sentinel(&self) -> bool {
        self.is_named(NONE_NAME)
    }
}

pub type Props = BTreeMap<String, String>;

/// One interior node of the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct TermNode {
    pub head: Head,
    pub args: Vec<Term>,
    pub props: Props,
}

impl TermNode {
    pub fn new(head: Head, args: Vec<Term>) -> Self {
        TermNode { head, args, props: Props::new() }
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<String>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    pub fn prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    pub fn has_prop(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }
}

/// Insertion-ordered store of graph nodes.
#[derive(Clone, Debug, Default)]
pub struct Notation {
    rel: IndexMap<Symbol, TermNode>,
}

impl Notation {
    pub fn new() -> Self {
        Notation { rel: IndexMap::new() }
    }

    /// Registers `node` under `sym`, or under a fresh symbol when `sym`
    /// is `None`. Returns the key used.
    pub fn put(&mut self, sym: Option<Symbol>, node: TermNode) -> Symbol {
        let key = sym.unwrap_or_else(Symbol::fresh);
        self.rel.insert(key.clone(), node);
        key
    }

    /// Registers a new node under a fresh symbol and returns it as a term.
    pub fn define(&mut self, head: Head, args: Vec<Term>) -> Term {
        Term::Sym(self.put(None, TermNode::new(head, args)))
    }

    pub fn define_node(&mut self, node: TermNode) -> Term {
        Term::Sym(self.put(None, node))
    }

    /// Node lookup through a term; non-symbol terms are leaves.
    pub fn get(&self, t: &Term) -> Option<&TermNode> {
        t.as_sym().and_then(|s| self.rel.get(s))
    }

    /// Node lookup filtered by head.
    pub fn get_if(&self, t: &Term, head: &Head) -> Option<&TermNode> {
        self.get(t).filter(|n| &n.head == head)
    }

    /// Node lookup filtered by a set of heads.
    pub fn get_if_any(&self, t: &Term, heads: &[Head]) -> Option<&TermNode> {
        self.get(t).filter(|n| heads.contains(&n.head))
    }

    /// Removes a node, preserving the order of the remaining entries.
    pub fn remove(&mut self, t: &Term) -> Option<TermNode> {
        t.as_sym().and_then(|s| self.rel.shift_remove(s))
    }

    /// Imports every entry of `other`; on a reference collision the
    /// incoming entry wins. Rewriters re-register rebuilt nodes under
    /// their original keys, so the later graph holds the current version
    /// of a shared node.
    pub fn merge(&mut self, other: &Notation) {
        for (sym, node) in &other.rel {
            self.rel.insert(sym.clone(), node.clone());
        }
    }

    /// Entries whose node carries `head`, optionally restricted to a
    /// fixed argument count.
    pub fn select<'a>(
        &'a self,
        head: &'a Head,
        arity: Option<usize>,
    ) -> impl Iterator<Item = (&'a Symbol, &'a TermNode)> {
        self.rel
            .iter()
            .filter(move |(_, n)| &n.head == head && arity.map_or(true, |k| n.args.len() == k))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &TermNode)> {
        self.rel.iter()
    }

    pub fn len(&self) -> usize {
        self.rel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rel.is_empty()
    }

    pub fn clear(&mut self) {
        self.rel.clear();
    }
}
