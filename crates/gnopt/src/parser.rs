use std::io::Write;

use crate::decl::{Callback, Declaration, Value};
use crate::error::Result;
use crate::help;
use crate::registry::{DeclId, Registry};
use crate::scan::{Finish, ScanState, Scanner, StopPredicate, UnknownHandler};

/// Parser-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Register `-h`, `-?` and `--help`.
    pub default_help: bool,
    /// Program name shown on the usage line.
    pub program: Option<String>,
    /// Text printed before the usage line.
    pub banner: String,
    /// Text printed after the option list.
    pub tail: String,
    /// Minimum width of the spelling column in help output.
    pub pad: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_help: true,
            program: None,
            banner: String::new(),
            tail: String::new(),
            pad: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Every token was scanned.
    Complete,
    /// The built-in help option was seen; scanning stopped and this is the
    /// rendered help text.
    Help(String),
}

impl ParseOutcome {
    pub fn is_help(&self) -> bool {
        matches!(self, Self::Help(_))
    }
}

/// Callback-driven option parser.
///
/// Options are declared with [`on`](Self::on) (or the `on_flag`/`on_value`
/// shorthands), then [`parse`](Self::parse) runs a single pass over the
/// arguments, invoking callbacks as their options appear. Everything that is
/// not an option ends up in [`positional`](Self::positional).
pub struct OptionParser<'a> {
    config: ParserConfig,
    registry: Registry<'a>,
    stop_predicates: Vec<StopPredicate<'a>>,
    on_unknown: Option<UnknownHandler<'a>>,
    positional: Vec<String>,
}

impl Default for OptionParser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OptionParser<'a> {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        let mut registry = Registry::new();
        if config.default_help {
            registry.push(Declaration::builtin_help());
        }
        Self {
            config,
            registry,
            stop_predicates: Vec::new(),
            on_unknown: None,
            positional: Vec::new(),
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Banner, tail, program name and padding can change at any time; the
    /// help registration cannot.
    pub fn config_mut(&mut self) -> &mut ParserConfig {
        &mut self.config
    }

    /// Declare an option.
    ///
    /// Fails if a token is malformed, if the spellings disagree on whether a
    /// value is required, or if the callback shape does not match.
    pub fn on<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
        description: impl Into<String>,
        callback: Callback<'a>,
    ) -> Result<DeclId> {
        let decl = Declaration::compile(tokens, description, callback)?;
        Ok(self.registry.push(decl))
    }

    pub fn on_flag<S, F>(&mut self, tokens: &[S], description: impl Into<String>, f: F) -> Result<DeclId>
    where
        S: AsRef<str>,
        F: FnMut() -> Result<()> + 'a,
    {
        self.on(tokens, description, Callback::flag(f))
    }

    pub fn on_value<S, F>(&mut self, tokens: &[S], description: impl Into<String>, f: F) -> Result<DeclId>
    where
        S: AsRef<str>,
        F: FnMut(&Value<'_>) -> Result<()> + 'a,
    {
        self.on(tokens, description, Callback::value(f))
    }

    /// Decide what happens with options that match no declaration: return
    /// `true` to fail with `InvalidOption`, `false` to skip the token.
    ///
    /// Without a handler unknown options are fatal.
    pub fn on_unknown_option<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(&str) -> bool + 'a,
    {
        self.on_unknown = Some(Box::new(f));
        self
    }

    /// Once `f` returns true, the current token and everything after it is
    /// positional.
    pub fn stop_if<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(&ScanState<'_>) -> bool + 'a,
    {
        self.stop_predicates.push(Box::new(f));
        self
    }

    /// Stop option parsing after the first positional argument, leaving the
    /// rest for a sub-command.
    pub fn stop_at_first_positional(&mut self) -> &mut Self {
        self.stop_if(|state| !state.positional().is_empty())
    }

    pub fn declarations(&self) -> &Registry<'a> {
        &self.registry
    }

    pub fn declaration(&self, id: DeclId) -> Option<&Declaration<'a>> {
        self.registry.get(id)
    }

    /// Scan `args` (without the program name).
    ///
    /// Callbacks already invoked when an error is returned are not undone.
    pub fn parse<I>(&mut self, args: I) -> Result<ParseOutcome>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.positional.clear();
        tracing::debug!(
            args = args.len(),
            declarations = self.registry.len(),
            "parsing arguments"
        );

        let scanner = Scanner::new(
            &mut self.registry,
            &mut self.stop_predicates,
            self.on_unknown.as_deref_mut(),
        );
        match scanner.run(&args)? {
            Finish::Complete(positional) => {
                self.positional = positional;
                Ok(ParseOutcome::Complete)
            }
            Finish::Help => Ok(ParseOutcome::Help(self.help())),
        }
    }

    /// Scan a full process-style argument vector starting at `begin`
    /// (usually 1, skipping the program name).
    pub fn parse_from<S: AsRef<str>>(&mut self, argv: &[S], begin: usize) -> Result<ParseOutcome> {
        let args: Vec<String> = argv
            .iter()
            .skip(begin)
            .map(|s| s.as_ref().to_string())
            .collect();
        self.parse(args)
    }

    /// Scan the arguments of the current process.
    pub fn parse_env(&mut self) -> Result<ParseOutcome> {
        let argv: Vec<String> = std::env::args_os()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        if self.config.program.is_none() {
            self.config.program = argv.first().map(|p| program_name(p));
        }
        self.parse_from(&argv, 1)
    }

    /// Positional arguments from the last successful parse.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }

    pub fn help(&self) -> String {
        help::render(&self.registry, &self.config)
    }

    pub fn write_help<W: Write>(&self, sink: &mut W) -> Result<()> {
        help::write_help(&self.registry, &self.config, sink)
    }
}

fn program_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
