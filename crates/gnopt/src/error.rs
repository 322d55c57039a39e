use std::fmt;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which half of a declaration carried the value marker when the two halves
/// disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarSide {
    Short,
    Long,
}

impl fmt::Display for GrammarSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => f.write_str("short"),
            Self::Long => f.write_str("long"),
        }
    }
}

impl GrammarSide {
    fn other(self) -> Self {
        match self {
            Self::Short => Self::Long,
            Self::Long => Self::Short,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A declaration token matched none of the short, GNU or DOS grammars.
    #[error("unparseable option syntax: '{0}'")]
    UnparseableSyntax(String),

    /// Short and long spellings of one declaration disagree on whether a
    /// value is required. `side` is the half that asked for a value.
    #[error(
        "inconsistent grammar in [{}]: {side} option requires a value but {} option does not",
        .tokens.join(", "),
        .side.other()
    )]
    InconsistentGrammar {
        side: GrammarSide,
        tokens: Vec<String>,
    },

    #[error("invalid option: '{0}'")]
    InvalidOption(String),

    #[error("option '{0}' expected a value")]
    ValueNeeded(String),

    #[error("invalid value '{value}' for option '{option}': expected {target}")]
    ValueConversion {
        option: String,
        value: String,
        target: &'static str,
    },

    /// The callback shape does not match the declaration's value requirement.
    #[error("callback for '{spelling}' must be a {expected} callback")]
    CallbackMismatch {
        spelling: String,
        expected: &'static str,
    },

    #[error("failed to write help: {0}")]
    Io(#[from] std::io::Error),
}
