//! # Symtex Engine
//!
//! **Symbolic mathematics over displayed-math markup**
//!
//! Symtex parses LaTeX-style formulas into a term graph, normalizes them
//! with a rewriting calculator, and answers logical queries with a
//! resolution engine whose rules are themselves written as formulas.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use symtex::{ResourceLimits, Session, SymtexResult};
//!
//! fn main() -> SymtexResult<()> {
//!     let mut session = Session::new(ResourceLimits::default())?;
//!
//!     // Arithmetic normalization.
//!     let r = session.exec("\\frac 2 3 x + \\frac 1 5 x")?;
//!     assert_eq!(r.rendered.as_deref(), Some("\\frac{13}{15}x"));
//!
//!     // Declare rules, then query them.
//!     session.exec("\\operatorname{parent}(t,b)")?;
//!     session.exec(
//!         "\\operatorname{child}(#x,#y) \\dashv (\\operatorname{parent}(#y,#x))",
//!     )?;
//!     let r = session.exec("goal! \\operatorname{child}(#c,t)")?;
//!     assert!(r.rendered.is_some());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Notation
//! Every formula is a directed acyclic graph of [`notation::TermNode`]s
//! keyed by symbols in a [`notation::Notation`]. Rewriters rebuild a
//! source graph into a destination graph, sharing untouched subgraphs.
//!
//! ### Calculator
//! The [`processor::MathProcessor`] repeats a normalization pass until
//! the graph stops changing: folding numeric factors, collecting like
//! terms, merging powers and dispatching `name!` command forms.
//!
//! ### Comparer
//! Patterns match commutatively over sum and product chains, with
//! ellipsis runs and typed parameters. The same machinery backs `match!`
//! and the unifier of the resolution engine.
//!
//! ### Resolution
//! Rules declared as `head \dashv goal, goal` are queried with `goal!`.
//! The search is depth-first over an explicit stack, with cut, negation
//! as failure, assignment goals and built-in predicates.

pub mod calculator;
pub mod commands;
pub mod comparer;
pub mod error;
pub mod limits;
pub mod notation;
pub mod parser;
pub mod preprocessor;
pub mod processor;
pub mod response;
pub mod rewrite;
pub mod session;
pub mod solver;
pub mod value;
pub mod writer;

pub use commands::{Command, CommandSet};
pub use comparer::{Binding, Bindings, Param, ParamKind, Pattern, Scope};
pub use error::SymtexError;
pub use limits::ResourceLimits;
pub use notation::{Head, Notation, Symbol, Term, TermNode};
pub use parser::parse;
pub use processor::MathProcessor;
pub use response::{Execution, Notice, SessionFlags};
pub use rewrite::{Copier, Importer, Replicator, Rewriter};
pub use session::Session;
pub use solver::{Callback, CallbackSet, Rule, RuleModel, RuleTerm};
pub use value::Value;
pub use writer::render;

/// Result type for engine operations.
pub type SymtexResult<T> = Result<T, SymtexError>;

#[cfg(test)]
mod tests;
