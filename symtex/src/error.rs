use std::fmt;

/// Errors surfaced by the engine.
///
/// A failed pattern match or an exhausted search is a normal outcome and
/// is never reported through this type.
#[derive(Debug, Clone, PartialEq)]
pub enum SymtexError {
    /// Malformed markup, with a 1-based source position.
    Parse { message: String, line: usize, col: usize },
    /// A command form whose name is not registered.
    UnknownCommand { name: String },
    /// A command form applied to the wrong number of arguments.
    CommandUsage { name: String, expected: usize, actual: usize },
    /// Input exceeds the configured size limit.
    InputTooLarge { actual: usize, limit: usize },
    /// Internal invariant violation.
    Engine(String),
}

impl SymtexError {
    pub fn parse(message: impl Into<String>, line: usize, col: usize) -> Self {
        SymtexError::Parse { message: message.into(), line, col }
    }

    pub fn unknown_command(name: impl Into<String>) -> Self {
        SymtexError::UnknownCommand { name: name.into() }
    }

    pub fn command_usage(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        SymtexError::CommandUsage { name: name.into(), expected, actual }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        SymtexError::Engine(message.into())
    }
}

impl fmt::Display for SymtexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymtexError::Parse { message, line, col } => {
                write!(f, "parse error at {line}:{col}: {message}")
            }
            SymtexError::UnknownCommand { name } => {
                write!(f, "unknown command '{name}'")
            }
            SymtexError::CommandUsage { name, expected, actual } => {
                write!(
                    f,
                    "command '{name}' expects {expected} argument(s), got {actual}"
                )
            }
            SymtexError::InputTooLarge { actual, limit } => {
                write!(f, "input is {actual} bytes, limit is {limit}")
            }
            SymtexError::Engine(message) => write!(f, "engine error: {message}"),
        }
    }
}

impl std::error::Error for SymtexError {}
