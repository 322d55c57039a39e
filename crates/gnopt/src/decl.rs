//! Compiled option declarations and the callbacks bound to them.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, GrammarSide, Result};
use crate::grammar::{Grammar, LongName, LongStyle};

type FlagFn<'a> = Box<dyn FnMut() -> Result<()> + 'a>;
type ValueFn<'a> = Box<dyn FnMut(&Value<'_>) -> Result<()> + 'a>;

/// The action bound to a declaration: either a plain flag or an option that
/// receives its value.
pub enum Callback<'a> {
    Flag(FlagFn<'a>),
    Value(ValueFn<'a>),
}

impl<'a> Callback<'a> {
    pub fn flag<F>(f: F) -> Self
    where
        F: FnMut() -> Result<()> + 'a,
    {
        Self::Flag(Box::new(f))
    }

    pub fn value<F>(f: F) -> Self
    where
        F: FnMut(&Value<'_>) -> Result<()> + 'a,
    {
        Self::Value(Box::new(f))
    }

    pub fn takes_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    fn kind(&self) -> &'static str {
        if self.takes_value() { "value" } else { "flag" }
    }
}

impl fmt::Debug for Callback<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback::{}", if self.takes_value() { "Value" } else { "Flag" })
    }
}

/// What happens when a declaration matches.
#[derive(Debug)]
pub(crate) enum Action<'a> {
    Invoke(Callback<'a>),
    /// Built-in help: stop scanning and hand back rendered help text.
    Help,
}

/// One logical option, addressable through any of its spellings.
#[derive(Debug)]
pub struct Declaration<'a> {
    short_names: Vec<char>,
    long_names: Vec<LongName>,
    needs_value: bool,
    description: String,
    action: Action<'a>,
}

impl<'a> Declaration<'a> {
    /// Compile grammar tokens into a declaration.
    ///
    /// All spellings must agree on whether a value is required. An empty
    /// token list yields an inert declaration that never matches.
    pub fn compile<S: AsRef<str>>(
        tokens: &[S],
        description: impl Into<String>,
        callback: Callback<'a>,
    ) -> Result<Self> {
        let decl = Self::compile_grammar(tokens, description, Action::Invoke(callback))?;
        if let Action::Invoke(cb) = &decl.action {
            if !decl.is_inert() && cb.takes_value() != decl.needs_value {
                return Err(Error::CallbackMismatch {
                    spelling: decl.primary_spelling(),
                    expected: if decl.needs_value { "value" } else { "flag" },
                });
            }
            tracing::trace!(
                spelling = %decl.primary_spelling(),
                callback = cb.kind(),
                "compiled declaration"
            );
        }
        Ok(decl)
    }

    /// `-h`, `-?`, `--help`.
    pub(crate) fn builtin_help() -> Self {
        Self {
            short_names: vec!['h', '?'],
            long_names: vec![LongName::new("help", LongStyle::Gnu)],
            needs_value: false,
            description: "show this help".to_string(),
            action: Action::Help,
        }
    }

    fn compile_grammar<S: AsRef<str>>(
        tokens: &[S],
        description: impl Into<String>,
        action: Action<'a>,
    ) -> Result<Self> {
        let mut short_names = Vec::new();
        let mut long_names = Vec::new();
        let mut short_wants_value = false;
        let mut long_wants_value = false;

        for token in tokens {
            match Grammar::classify(token.as_ref())? {
                Grammar::Short { name, wants_value } => {
                    short_wants_value |= wants_value;
                    if !short_names.contains(&name) {
                        short_names.push(name);
                    }
                }
                Grammar::Long { long, wants_value } => {
                    long_wants_value |= wants_value;
                    long_names.push(long);
                }
            }
        }

        let needs_value = match (short_names.is_empty(), long_names.is_empty()) {
            (false, false) if short_wants_value != long_wants_value => {
                return Err(Error::InconsistentGrammar {
                    side: if short_wants_value {
                        GrammarSide::Short
                    } else {
                        GrammarSide::Long
                    },
                    tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
                });
            }
            (false, _) => short_wants_value,
            (true, _) => long_wants_value,
        };

        Ok(Self {
            short_names,
            long_names,
            needs_value,
            description: description.into(),
            action,
        })
    }

    pub fn short_names(&self) -> &[char] {
        &self.short_names
    }

    pub fn long_names(&self) -> &[LongName] {
        &self.long_names
    }

    pub fn needs_value(&self) -> bool {
        self.needs_value
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// True when the declaration has no spellings at all.
    pub fn is_inert(&self) -> bool {
        self.short_names.is_empty() && self.long_names.is_empty()
    }

    pub fn matches_short(&self, c: char) -> bool {
        self.short_names.contains(&c)
    }

    pub fn matches_long(&self, name: &str) -> bool {
        self.long_names.iter().any(|l| l.name == name)
    }

    /// True only for a `/name` spelling; GNU spellings do not count.
    pub fn matches_dos(&self, name: &str) -> bool {
        self.long_names
            .iter()
            .any(|l| l.style == LongStyle::Dos && l.name == name)
    }

    pub(crate) fn action_mut(&mut self) -> &mut Action<'a> {
        &mut self.action
    }

    /// The first declared spelling, used to name the option in messages.
    pub fn primary_spelling(&self) -> String {
        self.short_names
            .first()
            .map(|c| format!("-{c}"))
            .or_else(|| self.long_names.first().map(LongName::spelling))
            .unwrap_or_default()
    }
}

/// A raw option value, handed to value callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Value<'v> {
    option: &'v str,
    raw: &'v str,
}

impl<'v> Value<'v> {
    pub fn new(option: &'v str, raw: &'v str) -> Self {
        Self { option, raw }
    }

    pub fn as_str(&self) -> &'v str {
        self.raw
    }

    /// The spelling the value was given to, e.g. `-o` or `--out`.
    pub fn option(&self) -> &'v str {
        self.option
    }

    pub fn parse<T: FromStr>(&self) -> Result<T> {
        self.raw
            .trim()
            .parse()
            .map_err(|_| self.conversion_error(std::any::type_name::<T>()))
    }

    pub fn to_i64(&self) -> Result<i64> {
        self.raw.trim().parse().map_err(|_| self.conversion_error("an integer"))
    }

    pub fn to_u64(&self) -> Result<u64> {
        self.raw
            .trim()
            .parse()
            .map_err(|_| self.conversion_error("an unsigned integer"))
    }

    pub fn to_f64(&self) -> Result<f64> {
        self.raw.trim().parse().map_err(|_| self.conversion_error("a number"))
    }

    pub fn to_bool(&self) -> Result<bool> {
        match self.raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(self.conversion_error("a boolean")),
        }
    }

    fn conversion_error(&self, target: &'static str) -> Error {
        Error::ValueConversion {
            option: self.option.to_string(),
            value: self.raw.to_string(),
            target,
        }
    }
}

impl AsRef<str> for Value<'_> {
    fn as_ref(&self) -> &str {
        self.raw
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_flag<'a>() -> Callback<'a> {
        Callback::flag(|| Ok(()))
    }

    fn noop_value<'a>() -> Callback<'a> {
        Callback::value(|_| Ok(()))
    }

    #[test]
    fn compiles_short_and_long_spellings() {
        let decl = Declaration::compile(&["-o?", "--out=?", "/out:?"], "output", noop_value()).unwrap();
        assert_eq!(decl.short_names(), &['o']);
        assert_eq!(
            decl.long_names(),
            &[
                LongName::new("out", LongStyle::Gnu),
                LongName::new("out", LongStyle::Dos)
            ]
        );
        assert!(decl.needs_value());
        assert_eq!(decl.description(), "output");
        assert!(decl.matches_short('o'));
        assert!(decl.matches_long("out"));
        assert!(!decl.matches_long("o"));
        assert!(decl.matches_dos("out"));

        let gnu_only = Declaration::compile(&["--out=?"], "", noop_value()).unwrap();
        assert!(!gnu_only.matches_dos("out"));
    }

    #[test]
    fn needs_value_follows_markers() {
        let flag = Declaration::compile(&["-v", "--verbose"], "", noop_flag()).unwrap();
        assert!(!flag.needs_value());
        let long_only = Declaration::compile(&["--level=?"], "", noop_value()).unwrap();
        assert!(long_only.needs_value());
        let short_only = Declaration::compile(&["-I?"], "", noop_value()).unwrap();
        assert!(short_only.needs_value());
    }

    #[test]
    fn mixed_markers_fail_with_disagreeing_side() {
        match Declaration::compile(&["-o?", "--out"], "", noop_value()) {
            Err(Error::InconsistentGrammar { side, tokens }) => {
                assert_eq!(side, GrammarSide::Short);
                assert_eq!(tokens, vec!["-o?", "--out"]);
            }
            other => panic!("expected InconsistentGrammar, got: {other:?}"),
        }
        match Declaration::compile(&["-o", "--out=?"], "", noop_value()) {
            Err(Error::InconsistentGrammar { side, .. }) => assert_eq!(side, GrammarSide::Long),
            other => panic!("expected InconsistentGrammar, got: {other:?}"),
        }
    }

    #[test]
    fn bad_token_fails_whole_declaration() {
        match Declaration::compile(&["-v", "verbose"], "", noop_flag()) {
            Err(Error::UnparseableSyntax(t)) => assert_eq!(t, "verbose"),
            other => panic!("expected UnparseableSyntax, got: {other:?}"),
        }
    }

    #[test]
    fn empty_declaration_is_inert() {
        let tokens: [&str; 0] = [];
        let decl = Declaration::compile(&tokens, "nothing", noop_value()).unwrap();
        assert!(decl.is_inert());
        assert!(!decl.matches_long(""));
        assert_eq!(decl.primary_spelling(), "");
    }

    #[test]
    fn callback_shape_is_checked_at_compile_time() {
        match Declaration::compile(&["-v"], "", noop_value()) {
            Err(Error::CallbackMismatch { spelling, expected }) => {
                assert_eq!(spelling, "-v");
                assert_eq!(expected, "flag");
            }
            other => panic!("expected CallbackMismatch, got: {other:?}"),
        }
        match Declaration::compile(&["--out=?"], "", noop_flag()) {
            Err(Error::CallbackMismatch { spelling, expected }) => {
                assert_eq!(spelling, "--out");
                assert_eq!(expected, "value");
            }
            other => panic!("expected CallbackMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::new("-n", " 42 ").to_i64().unwrap(), 42);
        assert_eq!(Value::new("-n", "7").to_u64().unwrap(), 7);
        assert_eq!(Value::new("-n", "2.5").to_f64().unwrap(), 2.5);
        assert!(Value::new("-b", "Yes").to_bool().unwrap());
        assert!(!Value::new("-b", "off").to_bool().unwrap());
        assert_eq!(Value::new("-p", "8080").parse::<u16>().unwrap(), 8080);
        assert_eq!(Value::new("-o", "file.txt").to_string(), "file.txt");
    }

    #[test]
    fn value_conversion_failure_names_option() {
        match Value::new("--count", "many").to_i64() {
            Err(Error::ValueConversion {
                option,
                value,
                target,
            }) => {
                assert_eq!(option, "--count");
                assert_eq!(value, "many");
                assert_eq!(target, "an integer");
            }
            other => panic!("expected ValueConversion, got: {other:?}"),
        }
        assert!(Value::new("-b", "maybe").to_bool().is_err());
    }
}
