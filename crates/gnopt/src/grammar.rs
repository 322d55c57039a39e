//! The declaration mini-language.
//!
//! | Token      | Meaning                                  |
//! |------------|------------------------------------------|
//! | `-x`       | short flag                               |
//! | `-x?`      | short option taking a value              |
//! | `--name`   | GNU long flag                            |
//! | `--name=?` | GNU long option taking `--name=VALUE`    |
//! | `/name`    | DOS-style flag                           |
//! | `/name:?`  | DOS-style option taking `/name:VALUE`    |
//!
//! `-?` declares the literal flag `?`; `-??` declares `?` taking a value.

use crate::error::{Error, Result};

const GNU_PREFIX: &str = "--";
const GNU_VALUE_MARKER: &str = "=?";
const DOS_PREFIX: char = '/';
const DOS_VALUE_MARKER: &str = ":?";
const SHORT_PREFIX: char = '-';
const SHORT_VALUE_MARKER: char = '?';

/// How a long option is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongStyle {
    Gnu,
    Dos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongName {
    pub name: String,
    pub style: LongStyle,
}

impl LongName {
    pub fn new(name: impl Into<String>, style: LongStyle) -> Self {
        Self {
            name: name.into(),
            style,
        }
    }

    /// `--name` or `/name`.
    pub fn spelling(&self) -> String {
        match self.style {
            LongStyle::Gnu => format!("{GNU_PREFIX}{}", self.name),
            LongStyle::Dos => format!("{DOS_PREFIX}{}", self.name),
        }
    }

    /// `--name=<val>` or `/name:<val>`.
    pub fn spelling_with_value(&self) -> String {
        match self.style {
            LongStyle::Gnu => format!("{GNU_PREFIX}{}=<val>", self.name),
            LongStyle::Dos => format!("{DOS_PREFIX}{}:<val>", self.name),
        }
    }
}

/// One classified declaration token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grammar {
    Short { name: char, wants_value: bool },
    Long { long: LongName, wants_value: bool },
}

/// Characters accepted as an option name's leading character.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '?' | '!' | '#')
}

impl Grammar {
    pub fn classify(token: &str) -> Result<Self> {
        let grammar = if let Some(rest) = token.strip_prefix(GNU_PREFIX) {
            classify_gnu(rest)
        } else if let Some(rest) = token.strip_prefix(DOS_PREFIX) {
            classify_dos(rest)
        } else if let Some(rest) = token.strip_prefix(SHORT_PREFIX) {
            classify_short(rest)
        } else {
            None
        };
        grammar.ok_or_else(|| Error::UnparseableSyntax(token.to_string()))
    }

    pub fn wants_value(&self) -> bool {
        match self {
            Self::Short { wants_value, .. } | Self::Long { wants_value, .. } => *wants_value,
        }
    }

    /// The spelling a user types on the command line, without value marker.
    pub fn display(&self) -> String {
        match self {
            Self::Short { name, .. } => format!("{SHORT_PREFIX}{name}"),
            Self::Long { long, .. } => long.spelling(),
        }
    }
}

fn classify_gnu(rest: &str) -> Option<Grammar> {
    let (name, wants_value) = match rest.strip_suffix(GNU_VALUE_MARKER) {
        Some(name) => (name, true),
        None => (rest, false),
    };
    if name.is_empty() {
        return None;
    }
    Some(Grammar::Long {
        long: LongName::new(name, LongStyle::Gnu),
        wants_value,
    })
}

fn classify_dos(rest: &str) -> Option<Grammar> {
    if !rest.chars().next().is_some_and(is_name_char) {
        return None;
    }
    let (name, wants_value) = match rest.strip_suffix(DOS_VALUE_MARKER) {
        Some(name) if !name.is_empty() => (name, true),
        _ => (rest, false),
    };
    Some(Grammar::Long {
        long: LongName::new(name, LongStyle::Dos),
        wants_value,
    })
}

fn classify_short(rest: &str) -> Option<Grammar> {
    let mut chars = rest.chars();
    let name = chars.next().filter(|c| is_name_char(*c))?;
    let wants_value = match chars.as_str() {
        "" => false,
        tail if tail.len() == 1 && tail.starts_with(SHORT_VALUE_MARKER) => true,
        _ => return None,
    };
    Some(Grammar::Short { name, wants_value })
}
