use anyhow::{Context, Result};
use gnopt::{Grammar, OptionParser, ParseOutcome};
use serde::Serialize;
use std::cell::RefCell;

use crate::manifest::{Manifest, OptionSpec};

/// One callback invocation observed during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// First declared spelling of the matched option.
    pub option: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub invocations: Vec<Invocation>,
    pub positional: Vec<String>,
}

pub enum ScanResult {
    Report(ScanReport),
    Help(String),
}

pub type InvocationLog = RefCell<Vec<Invocation>>;

fn label(spec: &OptionSpec) -> String {
    spec.grammar
        .first()
        .and_then(|t| Grammar::classify(t).ok())
        .map(|g| g.display())
        .unwrap_or_default()
}

fn wants_value(spec: &OptionSpec) -> bool {
    spec.grammar
        .iter()
        .filter_map(|t| Grammar::classify(t).ok())
        .any(|g| g.wants_value())
}

/// Build a parser whose callbacks append to `log`.
pub fn build_parser<'a>(manifest: &Manifest, log: &'a InvocationLog) -> Result<OptionParser<'a>> {
    let mut parser = OptionParser::with_config(manifest.parser_config());

    for (idx, spec) in manifest.options.iter().enumerate() {
        let option = label(spec);
        let registered = if wants_value(spec) {
            parser.on_value(spec.grammar.as_slice(), &spec.description, move |v| {
                log.borrow_mut().push(Invocation {
                    option: option.clone(),
                    value: Some(v.as_str().to_string()),
                });
                Ok(())
            })
        } else {
            parser.on_flag(spec.grammar.as_slice(), &spec.description, move || {
                log.borrow_mut().push(Invocation {
                    option: option.clone(),
                    value: None,
                });
                Ok(())
            })
        };
        registered.with_context(|| {
            format!("invalid declaration #{} [{}]", idx + 1, spec.grammar.join(", "))
        })?;
    }

    if manifest.ignore_unknown {
        parser.on_unknown_option(|token| {
            tracing::warn!(option = token, "ignoring unknown option");
            false
        });
    }
    if manifest.stop_at_first_positional {
        parser.stop_at_first_positional();
    }

    tracing::debug!(
        declarations = parser.declarations().len(),
        "compiled manifest"
    );
    Ok(parser)
}

pub fn scan(manifest: &Manifest, args: &[String]) -> Result<ScanResult> {
    let log = InvocationLog::default();
    let mut parser = build_parser(manifest, &log)?;
    let outcome = parser
        .parse(args.iter().cloned())
        .context("failed to parse arguments")?;
    let positional = parser.positional().to_vec();
    drop(parser);

    Ok(match outcome {
        ParseOutcome::Complete => ScanResult::Report(ScanReport {
            invocations: log.into_inner(),
            positional,
        }),
        ParseOutcome::Help(text) => ScanResult::Help(text),
    })
}

impl ScanReport {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for inv in &self.invocations {
            match &inv.value {
                Some(value) => out.push_str(&format!("** {} = {:?}\n", inv.option, value)),
                None => out.push_str(&format!("** {}\n", inv.option)),
            }
        }
        out.push_str("** positional:\n");
        for (i, arg) in self.positional.iter().enumerate() {
            out.push_str(&format!("  [{i}] {arg:?}\n"));
        }
        out
    }
}
