//! Evaluation driver.
//!
//! [`MathProcessor`] owns the command registry and the rule database.
//! Processing a formula runs the preprocessor once, checks whether the
//! input declares a rule, and otherwise repeats the calculator pass
//! until the graph stops changing or the pass budget runs out.

use std::sync::Arc;

use crate::calculator::{CalcPatterns, Calculator};
use crate::commands::CommandSet;
use crate::comparer::{self, Scope};
use crate::limits::ResourceLimits;
use crate::notation::{Head, Notation, Term, TURNSTILE_NAME};
use crate::preprocessor::Preprocessor;
use crate::response::{Notice, SessionFlags};
use crate::rewrite::Replicator;
use crate::solver::{self, Rule, RuleModel, RuleTerm};
use crate::writer;
use crate::SymtexResult;

/// The `\textit{True}` acknowledgement returned for rule declarations.
pub(crate) fn create_true(notation: &mut Notation) -> Term {
    notation.define(Head::op("\\textit"), vec![Term::Text("True".into())])
}

pub struct MathProcessor {
    pub commands: CommandSet,
    pub model: RuleModel,
    pub limits: ResourceLimits,
    patterns: CalcPatterns,
}

impl MathProcessor {
    pub fn new(limits: ResourceLimits) -> SymtexResult<Self> {
        Ok(MathProcessor {
            commands: CommandSet::standard(),
            model: RuleModel::new(),
            limits,
            patterns: CalcPatterns::new()?,
        })
    }

    /// Preprocesses and normalizes a formula to fixpoint. Rule
    /// declarations short-circuit into the rule database.
    pub fn process(
        &mut self,
        root: &Term,
        notation: &Notation,
        history: &[(Term, Notation)],
        flags: &mut SessionFlags,
    ) -> SymtexResult<(Term, Notation, Vec<Notice>)> {
        let mut notices = Vec::new();
        let pre = Preprocessor::new(notation.clone(), history);
        let (mut root, mut notation) = pre.run(root)?;
        if let Some(res) = self.process_rule(&root, &mut notation) {
            return Ok((res, notation, notices));
        }
        let mut pass = 0usize;
        loop {
            let mut calc = Calculator::new(
                notation,
                &self.commands,
                &mut self.model,
                &self.limits,
                flags,
                &mut notices,
                &self.patterns,
            );
            let outs = calc.apply(&root);
            let (src, dst) = calc.into_parts()?;
            if comparer::s_equal(&outs, &dst, &root, &src, Scope::Root) {
                return Ok((outs, dst, notices));
            }
            root = outs;
            notation = dst;
            pass += 1;
            if flags.track {
                notices.push(Notice::Trace {
                    pass,
                    formula: writer::render(&root, &notation),
                });
            }
            if pass >= self.limits.max_rewrite_passes {
                tracing::warn!(pass, "normalization did not converge");
                return Ok((root, notation, notices));
            }
        }
    }

    /// Recognizes `head \dashv (g_1, ..., g_n)` and bare operator facts,
    /// storing them as rules. Returns the acknowledgement term when the
    /// input was a declaration.
    fn process_rule(&mut self, root: &Term, notation: &mut Notation) -> Option<Term> {
        if let Some(f) = notation.get_if(root, &Head::ProductList).cloned() {
            if f.args.len() == 3
                && solver::get_operator(&f.args[0], notation).is_some()
                && f.args[1].is_named(TURNSTILE_NAME)
            {
                let shared = Arc::new(notation.clone());
                let mut goals = Vec::new();
                match notation.get_if(&f.args[2], &Head::Group).cloned() {
                    Some(g) => {
                        let body = g.args.first().cloned().unwrap_or(Term::Empty);
                        match notation.get_if(&body, &Head::CommaList).cloned() {
                            Some(cl) => {
                                for gt in &cl.args {
                                    goals.push(RuleTerm::new(gt.clone(), Arc::clone(&shared)));
                                }
                            }
                            None => goals.push(RuleTerm::new(body, Arc::clone(&shared))),
                        }
                    }
                    None => goals.push(RuleTerm::new(f.args[2].clone(), Arc::clone(&shared))),
                }
                let head = RuleTerm::new(f.args[0].clone(), shared);
                self.model.add_rule(Rule::new(head, goals));
                return Some(create_true(notation));
            }
        }
        if solver::get_operator(root, notation).is_some() {
            let shared = Arc::new(notation.clone());
            self.model
                .add_rule(Rule::fact(RuleTerm::new(root.clone(), shared)));
            return Some(create_true(notation));
        }
        None
    }
}
