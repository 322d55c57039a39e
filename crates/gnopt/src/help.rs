//! Help text rendering.

use std::io::Write;

use crate::decl::Declaration;
use crate::error::Result;
use crate::parser::ParserConfig;
use crate::registry::Registry;

fn short_spelling(c: char, needs_value: bool) -> String {
    if needs_value {
        format!("-{c}<val>")
    } else {
        format!("-{c}")
    }
}

fn spellings(decl: &Declaration<'_>) -> Vec<String> {
    let shorts = decl
        .short_names()
        .iter()
        .map(|c| short_spelling(*c, decl.needs_value()));
    let longs = decl.long_names().iter().map(|l| {
        if decl.needs_value() {
            l.spelling_with_value()
        } else {
            l.spelling()
        }
    });
    shorts.chain(longs).collect()
}

fn format_usage(registry: &Registry<'_>, config: &ParserConfig) -> String {
    let mut out = String::from("usage:");
    if let Some(program) = config.program.as_deref().filter(|p| !p.trim().is_empty()) {
        out.push(' ');
        out.push_str(program.trim());
    }
    for decl in registry.iter().filter(|d| !d.is_inert()) {
        if let Some(first) = spellings(decl).into_iter().next() {
            out.push_str(&format!(" [{first}]"));
        }
    }
    out.push_str(" <args ...>");
    out
}

/// Render the full help text: banner, usage line, one line per declaration
/// in registration order, tail.
pub fn render(registry: &Registry<'_>, config: &ParserConfig) -> String {
    let rows: Vec<(String, &str)> = registry
        .iter()
        .filter(|d| !d.is_inert())
        .map(|d| (spellings(d).join(", "), d.description().trim()))
        .collect();
    let width = rows
        .iter()
        .map(|(left, _)| left.chars().count())
        .max()
        .unwrap_or(0)
        .max(config.pad);

    let mut out = String::new();
    if !config.banner.trim().is_empty() {
        out.push_str(config.banner.trim_end());
        out.push('\n');
    }
    out.push_str(&format_usage(registry, config));
    out.push_str("\n\navailable options:\n");
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {left}\n"));
        } else {
            out.push_str(&format!("  {left:<width$}  {help}\n"));
        }
    }
    if !config.tail.trim().is_empty() {
        out.push('\n');
        out.push_str(config.tail.trim_end());
        out.push('\n');
    }
    out
}

pub fn write_help<W: Write>(registry: &Registry<'_>, config: &ParserConfig, sink: &mut W) -> Result<()> {
    sink.write_all(render(registry, config).as_bytes())?;
    sink.flush()?;
    Ok(())
}
