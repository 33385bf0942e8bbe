use std::fmt;

use thiserror::Error;

/// What kind of registry entry a failed lookup was looking for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolKind {
    Type,
    Operation,
    Variable,
    Function,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Type => f.write_str("type"),
            SymbolKind::Operation => f.write_str("operation"),
            SymbolKind::Variable => f.write_str("variable"),
            SymbolKind::Function => f.write_str("function"),
        }
    }
}

/// Fatal failures of a synthesis run. None of these are recoverable; the run
/// is abandoned and no program text is produced.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("unknown {kind} `{name}`")]
    UnknownSymbol { kind: SymbolKind, name: String },

    #[error("call to `{callee}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("a program needs at least one function")]
    InvalidSize,

    #[error("function `{0}` was never given a body")]
    MissingBody(String),

    #[error("failed to parse synthesis config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
