use serde::Serialize;

/// A side output produced while executing an input: command reports,
/// solution tables, per-pass traces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notice {
    /// A rendered formula.
    Formula(String),
    /// Free-form informational text.
    Info(String),
    /// A table of variable bindings, already rendered.
    Bindings(Vec<(String, String)>),
    /// One normalization pass, emitted when tracking is on.
    Trace { pass: usize, formula: String },
}

/// Session toggles driven by control commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFlags {
    /// Echo the parsed input back before the result.
    pub echo: bool,
    /// Echo only the next execution.
    pub echo_once: bool,
    /// Emit a trace notice per normalization pass.
    pub track: bool,
    /// Set by `clear!`; the session resets state after the execution.
    pub clear_requested: bool,
}

/// The outcome of executing one input line.
#[derive(Debug, Clone, Serialize)]
pub struct Execution {
    /// 1-based execution number, usable in `[[n]]` back-references.
    pub index: usize,
    /// The normalized result, absent for control commands.
    pub rendered: Option<String>,
    pub notices: Vec<Notice>,
}
