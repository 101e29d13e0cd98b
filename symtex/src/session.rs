//! Interactive session state.
//!
//! A [`Session`] owns a processor, the execution history backing `[[n]]`
//! references, and the echo and tracking toggles. Each accepted input
//! produces an [`Execution`] with its 1-based index, the rendered result
//! and any notices the commands emitted.

use tracing::debug;

use crate::limits::ResourceLimits;
use crate::parser;
use crate::processor::MathProcessor;
use crate::response::{Execution, SessionFlags};
use crate::writer;
use crate::SymtexResult;

pub struct Session {
    pub processor: MathProcessor,
    flags: SessionFlags,
    history: Vec<(crate::notation::Term, crate::notation::Notation)>,
}

impl Session {
    pub fn new(limits: ResourceLimits) -> SymtexResult<Self> {
        Ok(Session {
            processor: MathProcessor::new(limits)?,
            flags: SessionFlags::default(),
            history: Vec::new(),
        })
    }

    /// Parses, evaluates and records one input line.
    ///
    /// Control commands answer with the `\none` sentinel, which
    /// suppresses the rendered output. A parse error does not consume an
    /// execution index.
    pub fn exec(&mut self, input: &str) -> SymtexResult<Execution> {
        let (root, notation) = parser::parse(input, &self.processor.limits)?;
        let index = self.history.len() + 1;
        debug!(index, input, "executing");
        let (outsym, notation, notices) =
            self.processor
                .process(&root, &notation, &self.history, &mut self.flags)?;
        let rendered = if outsym.is_none_sentinel() {
            None
        } else {
            let body = writer::render(&outsym, &notation);
            if self.flags.echo || self.flags.echo_once {
                Some(format!("{input} \\Rightarrow {body}"))
            } else {
                Some(body)
            }
        };
        self.history.push((outsym, notation));
        self.flags.echo_once = false;
        self.flags.track = false;
        if self.flags.clear_requested {
            self.reset();
        }
        Ok(Execution { index, rendered, notices })
    }

    /// Forgets the history, the rule database and the session toggles.
    pub fn reset(&mut self) {
        self.history.clear();
        self.processor.model.clear();
        self.flags = SessionFlags::default();
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
