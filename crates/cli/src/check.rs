use anyhow::Result;
use gnopt::{Declaration, OptionParser};
use serde::Serialize;

use crate::manifest::Manifest;
use crate::session::{InvocationLog, build_parser};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub program: Option<String>,
    pub declarations: Vec<DeclarationSummary>,
    pub inert: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationSummary {
    pub short: Vec<String>,
    pub long: Vec<String>,
    pub needs_value: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl From<&Declaration<'_>> for DeclarationSummary {
    fn from(decl: &Declaration<'_>) -> Self {
        Self {
            short: decl.short_names().iter().map(|c| format!("-{c}")).collect(),
            long: decl.long_names().iter().map(|l| l.spelling()).collect(),
            needs_value: decl.needs_value(),
            description: decl.description().to_string(),
        }
    }
}

/// Compile every declaration in the manifest and summarize the result.
pub fn check_manifest(manifest: &Manifest) -> Result<CheckReport> {
    let log = InvocationLog::default();
    let parser = build_parser(manifest, &log)?;
    Ok(summarize(manifest, &parser))
}

fn summarize(manifest: &Manifest, parser: &OptionParser<'_>) -> CheckReport {
    let registry = parser.declarations();
    CheckReport {
        program: manifest.program.clone(),
        declarations: registry.iter().map(DeclarationSummary::from).collect(),
        inert: registry.iter().filter(|d| d.is_inert()).count(),
    }
}
