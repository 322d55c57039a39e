//! Single left-to-right pass over an argument vector.
//!
//! Every token is one of:
//! - `--`: end of options, consumed
//! - `--name` / `--name=value`: long option
//! - `-abc` / `-ovalue`: short bundle
//! - `-x` (followed by its value for value-taking options): simple short
//! - `/name` / `/name:value`: DOS option, only when `name` is declared with
//!   a `/` spelling
//! - anything else: positional

use crate::decl::{Action, Callback, Declaration, Value};
use crate::error::{Error, Result};
use crate::registry::Registry;

pub(crate) type StopPredicate<'a> = Box<dyn FnMut(&ScanState<'_>) -> bool + 'a>;
pub(crate) type UnknownHandler<'a> = Box<dyn FnMut(&str) -> bool + 'a>;

const END_OF_OPTIONS: &str = "--";

/// Scan progress, visible to stop predicates.
#[derive(Debug, Clone)]
pub struct ScanState<'s> {
    args: &'s [String],
    cursor: usize,
    positional: Vec<String>,
    stopped: bool,
}

impl<'s> ScanState<'s> {
    fn new(args: &'s [String]) -> Self {
        Self {
            args,
            cursor: 0,
            positional: Vec::new(),
            stopped: false,
        }
    }

    pub fn args(&self) -> &'s [String] {
        self.args
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The token about to be classified.
    pub fn current(&self) -> Option<&'s str> {
        self.args.get(self.cursor).map(String::as_str)
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Result of handling one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Append the token to the positional list and move on.
    Positional,
    /// The option consumed this many tokens (1, or 2 when the value was the
    /// following token).
    Consumed(usize),
    /// The built-in help option matched.
    Help,
}

#[derive(Debug)]
pub(crate) enum Finish {
    Complete(Vec<String>),
    Help,
}

pub(crate) struct Scanner<'p, 'a> {
    registry: &'p mut Registry<'a>,
    stop_predicates: &'p mut [StopPredicate<'a>],
    on_unknown: Option<&'p mut (dyn FnMut(&str) -> bool + 'a)>,
}

impl<'p, 'a> Scanner<'p, 'a> {
    pub(crate) fn new(
        registry: &'p mut Registry<'a>,
        stop_predicates: &'p mut [StopPredicate<'a>],
        on_unknown: Option<&'p mut (dyn FnMut(&str) -> bool + 'a)>,
    ) -> Self {
        Self {
            registry,
            stop_predicates,
            on_unknown,
        }
    }

    pub(crate) fn run(mut self, args: &[String]) -> Result<Finish> {
        let mut state = ScanState::new(args);

        while let Some(token) = state.current() {
            if !state.stopped && self.should_stop(&state) {
                tracing::debug!(cursor = state.cursor, "stop predicate matched");
                state.stopped = true;
            }

            if token == END_OF_OPTIONS && !state.stopped {
                state.stopped = true;
                state.cursor += 1;
                continue;
            }

            let step = if state.stopped {
                Step::Positional
            } else {
                self.step(args, state.cursor)?
            };

            match step {
                Step::Positional => {
                    state.positional.push(token.to_string());
                    state.cursor += 1;
                }
                Step::Consumed(n) => state.cursor += n,
                Step::Help => return Ok(Finish::Help),
            }
        }

        Ok(Finish::Complete(state.positional))
    }

    fn should_stop(&mut self, state: &ScanState<'_>) -> bool {
        self.stop_predicates.iter_mut().any(|stop| stop(state))
    }

    /// Classify and dispatch the token at `cursor`.
    pub(crate) fn step(&mut self, args: &[String], cursor: usize) -> Result<Step> {
        let Some(token) = args.get(cursor).map(String::as_str) else {
            return Ok(Step::Consumed(0));
        };

        if let Some(body) = token.strip_prefix("--") {
            return self.long_option(body);
        }
        if let Some(body) = token.strip_prefix('/') {
            return self.dos_option(body);
        }

        let Some(shorts) = token.strip_prefix('-') else {
            return Ok(Step::Positional);
        };
        let mut chars = shorts.chars();
        match (chars.next(), chars.next()) {
            (Some(_), Some(_)) => self.short_bundle(shorts),
            (Some(c), None) => self.simple_short(c, token, args.get(cursor + 1)),
            _ => Ok(Step::Positional),
        }
    }

    fn long_option(&mut self, body: &str) -> Result<Step> {
        let (name, value) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let spelling = format!("--{name}");

        let Some(decl) = find_long(self.registry, name) else {
            self.unknown(&spelling)?;
            return Ok(Step::Consumed(1));
        };
        dispatch_long(decl, spelling, value)
    }

    /// `/name` or `/name:value`. Anything that does not name a declared DOS
    /// spelling, such as `/usr/bin`, stays positional.
    fn dos_option(&mut self, body: &str) -> Result<Step> {
        let (name, value) = match body.split_once(':') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let Some(decl) = find_dos(self.registry, name) else {
            return Ok(Step::Positional);
        };
        dispatch_long(decl, format!("/{name}"), value)
    }

    /// `-vd`, `-ofile`: flags run left to right; a value-taking option in
    /// first position takes the rest of the token as its value.
    fn short_bundle(&mut self, shorts: &str) -> Result<Step> {
        for (pos, (offset, c)) in shorts.char_indices().enumerate() {
            let spelling = format!("-{c}");

            let Some(decl) = find_short(self.registry, c) else {
                self.unknown(&spelling)?;
                tracing::debug!(bundle = shorts, "abandoning rest of short bundle");
                return Ok(Step::Consumed(1));
            };

            match decl.action_mut() {
                Action::Help => return Ok(Step::Help),
                Action::Invoke(Callback::Value(f)) => {
                    if pos != 0 {
                        return Err(Error::ValueNeeded(spelling));
                    }
                    let value = &shorts[offset + c.len_utf8()..];
                    tracing::trace!(option = %spelling, value, "attached short value");
                    f(&Value::new(&spelling, value))?;
                    return Ok(Step::Consumed(1));
                }
                Action::Invoke(Callback::Flag(f)) => {
                    tracing::trace!(option = %spelling, "bundled short flag");
                    f()?;
                }
            }
        }
        Ok(Step::Consumed(1))
    }

    /// `-x`, or `-x VALUE` when `x` takes a value.
    fn simple_short(&mut self, c: char, token: &str, next: Option<&String>) -> Result<Step> {
        let Some(decl) = find_short(self.registry, c) else {
            self.unknown(token)?;
            return Ok(Step::Consumed(1));
        };

        match decl.action_mut() {
            Action::Help => Ok(Step::Help),
            Action::Invoke(Callback::Value(f)) => match next {
                Some(value) if !value.starts_with('-') => {
                    tracing::trace!(option = token, value = %value, "short option");
                    f(&Value::new(token, value))?;
                    Ok(Step::Consumed(2))
                }
                _ => Err(Error::ValueNeeded(token.to_string())),
            },
            Action::Invoke(Callback::Flag(f)) => {
                tracing::trace!(option = token, "short flag");
                f()?;
                Ok(Step::Consumed(1))
            }
        }
    }

    fn unknown(&mut self, token: &str) -> Result<()> {
        let fatal = self
            .on_unknown
            .as_deref_mut()
            .is_none_or(|handler| handler(token));
        if fatal {
            return Err(Error::InvalidOption(token.to_string()));
        }
        tracing::debug!(option = token, "skipping unknown option");
        Ok(())
    }
}

fn dispatch_long(decl: &mut Declaration<'_>, spelling: String, value: Option<&str>) -> Result<Step> {
    match decl.action_mut() {
        Action::Help => Ok(Step::Help),
        Action::Invoke(Callback::Value(f)) => {
            let Some(value) = value else {
                return Err(Error::ValueNeeded(spelling));
            };
            tracing::trace!(option = %spelling, value, "long option");
            f(&Value::new(&spelling, value))?;
            Ok(Step::Consumed(1))
        }
        Action::Invoke(Callback::Flag(f)) => {
            if value.is_some() {
                tracing::debug!(option = %spelling, "ignoring value given to flag");
            }
            tracing::trace!(option = %spelling, "long flag");
            f()?;
            Ok(Step::Consumed(1))
        }
    }
}

fn find_short<'r, 'a>(registry: &'r mut Registry<'a>, c: char) -> Option<&'r mut Declaration<'a>> {
    let id = registry.find_short(c)?;
    registry.get_mut(id)
}

fn find_dos<'r, 'a>(registry: &'r mut Registry<'a>, name: &str) -> Option<&'r mut Declaration<'a>> {
    let id = registry.find_dos(name)?;
    registry.get_mut(id)
}

fn find_long<'r, 'a>(registry: &'r mut Registry<'a>, name: &str) -> Option<&'r mut Declaration<'a>> {
    let id = registry.find_long(name)?;
    registry.get_mut(id)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    type Log = RefCell<Vec<String>>;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn registry(log: &Log) -> Registry<'_> {
        let mut registry = Registry::new();
        for tokens in [&["-v", "--verbose"][..], &["-d", "--debug"][..]] {
            let name = tokens[1].trim_start_matches('-').to_string();
            registry.push(
                Declaration::compile(
                    tokens,
                    "",
                    Callback::flag(move || {
                        log.borrow_mut().push(name.clone());
                        Ok(())
                    }),
                )
                .unwrap(),
            );
        }
        registry.push(
            Declaration::compile(
                &["-o?", "--out=?"],
                "",
                Callback::value(|v| {
                    log.borrow_mut().push(format!("out={}", v.as_str()));
                    Ok(())
                }),
            )
            .unwrap(),
        );
        registry.push(Declaration::builtin_help());
        registry
    }

    fn step(registry: &mut Registry<'_>, argv: &[&str]) -> Result<Step> {
        let argv = args(argv);
        let mut preds: Vec<StopPredicate<'_>> = Vec::new();
        Scanner::new(registry, &mut preds, None).step(&argv, 0)
    }

    #[test]
    fn bare_words_and_lone_dash_are_positional() {
        let log = Log::default();
        let mut reg = registry(&log);
        assert_eq!(step(&mut reg, &["file"]).unwrap(), Step::Positional);
        assert_eq!(step(&mut reg, &["-"]).unwrap(), Step::Positional);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn long_option_with_and_without_value() {
        let log = Log::default();
        let mut reg = registry(&log);
        assert_eq!(step(&mut reg, &["--out=a=b"]).unwrap(), Step::Consumed(1));
        assert_eq!(step(&mut reg, &["--verbose"]).unwrap(), Step::Consumed(1));
        assert_eq!(step(&mut reg, &["--out="]).unwrap(), Step::Consumed(1));
        assert_eq!(*log.borrow(), vec!["out=a=b", "verbose", "out="]);

        match step(&mut reg, &["--out", "x"]) {
            Err(Error::ValueNeeded(name)) => assert_eq!(name, "--out"),
            other => panic!("expected ValueNeeded, got: {other:?}"),
        }
    }

    #[test]
    fn simple_short_consumes_following_value() {
        let log = Log::default();
        let mut reg = registry(&log);
        assert_eq!(step(&mut reg, &["-o", "x"]).unwrap(), Step::Consumed(2));
        assert_eq!(step(&mut reg, &["-v", "x"]).unwrap(), Step::Consumed(1));
        assert_eq!(*log.borrow(), vec!["out=x", "verbose"]);
    }

    #[test]
    fn simple_short_refuses_flag_as_value() {
        let log = Log::default();
        let mut reg = registry(&log);
        for argv in [&["-o", "--help"][..], &["-o", "-"][..], &["-o"][..]] {
            match step(&mut reg, argv) {
                Err(Error::ValueNeeded(name)) => assert_eq!(name, "-o"),
                other => panic!("expected ValueNeeded for {argv:?}, got: {other:?}"),
            }
        }
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn bundle_runs_flags_in_order() {
        let log = Log::default();
        let mut reg = registry(&log);
        assert_eq!(step(&mut reg, &["-dvd"]).unwrap(), Step::Consumed(1));
        assert_eq!(*log.borrow(), vec!["debug", "verbose", "debug"]);
    }

    #[test]
    fn leading_value_option_takes_rest_of_bundle() {
        let log = Log::default();
        let mut reg = registry(&log);
        assert_eq!(step(&mut reg, &["-ov", "x"]).unwrap(), Step::Consumed(1));
        assert_eq!(step(&mut reg, &["-ofile"]).unwrap(), Step::Consumed(1));
        assert_eq!(*log.borrow(), vec!["out=v", "out=file"]);
    }

    #[test]
    fn value_option_mid_bundle_is_rejected() {
        let log = Log::default();
        let mut reg = registry(&log);
        for argv in ["-vo", "-vofile"] {
            match step(&mut reg, &[argv]) {
                Err(Error::ValueNeeded(name)) => assert_eq!(name, "-o"),
                other => panic!("expected ValueNeeded for {argv}, got: {other:?}"),
            }
        }
        // flags before the offending option already ran
        assert_eq!(*log.borrow(), vec!["verbose", "verbose"]);
    }

    #[test]
    fn unknown_options_are_fatal_without_handler() {
        let log = Log::default();
        let mut reg = registry(&log);
        for (argv, expected) in [("--bogus=1", "--bogus"), ("-x", "-x"), ("-vx", "-x")] {
            match step(&mut reg, &[argv]) {
                Err(Error::InvalidOption(name)) => assert_eq!(name, expected),
                other => panic!("expected InvalidOption for {argv}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_in_bundle_abandons_the_rest() {
        let seen = RefCell::new(Vec::new());
        let log = Log::default();
        let mut reg = registry(&log);
        let mut skip = |token: &str| {
            seen.borrow_mut().push(token.to_string());
            false
        };
        let handler: &mut dyn FnMut(&str) -> bool = &mut skip;
        let mut preds: Vec<StopPredicate<'_>> = Vec::new();
        let argv = args(&["-vxd"]);
        let step = Scanner::new(&mut reg, &mut preds, Some(handler))
            .step(&argv, 0)
            .unwrap();
        assert_eq!(step, Step::Consumed(1));
        assert_eq!(*log.borrow(), vec!["verbose"]);
        assert_eq!(*seen.borrow(), vec!["-x"]);
    }

    #[test]
    fn help_stops_the_scan() {
        let log = Log::default();
        let mut reg = registry(&log);
        assert_eq!(step(&mut reg, &["-h"]).unwrap(), Step::Help);
        assert_eq!(step(&mut reg, &["--help"]).unwrap(), Step::Help);
        assert_eq!(step(&mut reg, &["-vh"]).unwrap(), Step::Help);
    }

    #[test]
    fn run_handles_separator_and_stop_predicates() {
        let log = Log::default();
        let mut reg = registry(&log);
        let mut preds: Vec<StopPredicate<'_>> =
            vec![Box::new(|s: &ScanState<'_>| !s.positional().is_empty())];
        let argv = args(&["-v", "sub", "-d", "--", "x"]);
        let finish = Scanner::new(&mut reg, &mut preds, None).run(&argv).unwrap();
        match finish {
            Finish::Complete(positional) => assert_eq!(positional, vec!["sub", "-d", "--", "x"]),
            other => panic!("expected Complete, got: {other:?}"),
        }
        assert_eq!(*log.borrow(), vec!["verbose"]);
    }

    #[test]
    fn dos_spelling_is_recognised_only_when_declared() {
        let log = Log::default();
        let mut reg = registry(&log);
        reg.push(
            Declaration::compile(
                &["/define:?"],
                "",
                Callback::value(|v| {
                    log.borrow_mut().push(format!("{}={}", v.option(), v));
                    Ok(())
                }),
            )
            .unwrap(),
        );
        assert_eq!(step(&mut reg, &["/define:X=1"]).unwrap(), Step::Consumed(1));
        // `/out` is only declared as `--out`
        assert_eq!(step(&mut reg, &["/out:x"]).unwrap(), Step::Positional);
        assert_eq!(step(&mut reg, &["/usr/bin"]).unwrap(), Step::Positional);
        assert_eq!(step(&mut reg, &["/"]).unwrap(), Step::Positional);
        match step(&mut reg, &["/define"]) {
            Err(Error::ValueNeeded(name)) => assert_eq!(name, "/define"),
            other => panic!("expected ValueNeeded, got: {other:?}"),
        }
        assert_eq!(*log.borrow(), vec!["/define=X=1"]);
    }

    #[test]
    fn first_true_stop_predicate_skips_the_rest() {
        let later_calls = std::cell::Cell::new(0);
        let log = Log::default();
        let mut reg = registry(&log);
        let mut preds: Vec<StopPredicate<'_>> = vec![
            Box::new(|s: &ScanState<'_>| {
                assert!(!s.is_stopped());
                s.args()[s.cursor()] == "stop"
            }),
            Box::new(|_: &ScanState<'_>| {
                later_calls.set(later_calls.get() + 1);
                false
            }),
        ];
        let argv = args(&["a", "-v", "stop", "-d"]);
        match Scanner::new(&mut reg, &mut preds, None).run(&argv).unwrap() {
            Finish::Complete(positional) => assert_eq!(positional, vec!["a", "stop", "-d"]),
            other => panic!("expected Complete, got: {other:?}"),
        }
        assert_eq!(later_calls.get(), 2);
        assert_eq!(*log.borrow(), vec!["verbose"]);
    }

    #[test]
    fn separator_is_consumed_once() {
        let log = Log::default();
        let mut reg = registry(&log);
        let mut preds: Vec<StopPredicate<'_>> = Vec::new();
        let argv = args(&["--", "--", "-v"]);
        match Scanner::new(&mut reg, &mut preds, None).run(&argv).unwrap() {
            Finish::Complete(positional) => assert_eq!(positional, vec!["--", "-v"]),
            other => panic!("expected Complete, got: {other:?}"),
        }
        assert!(log.borrow().is_empty());
    }
}
