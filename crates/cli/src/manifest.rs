use anyhow::{Context, Result, bail};
use gnopt::ParserConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST_NAME: &str = "gnopt.json";

/// Option declarations and help settings for one program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub banner: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tail: String,

    /// Minimum width of the spelling column in help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad: Option<usize>,

    #[serde(default = "default_true")]
    pub default_help: bool,

    /// Treat everything after the first positional argument as positional.
    #[serde(default)]
    pub stop_at_first_positional: bool,

    /// Skip unknown options instead of failing.
    #[serde(default)]
    pub ignore_unknown: bool,

    #[serde(default)]
    pub options: Vec<OptionSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    /// Grammar tokens, e.g. `["-o?", "--out=?"]`.
    pub grammar: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn default_true() -> bool {
    true
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            schema_version: None,
            program: None,
            banner: String::new(),
            tail: String::new(),
            pad: None,
            default_help: true,
            stop_at_first_positional: false,
            ignore_unknown: false,
            options: Vec::new(),
        }
    }
}

impl Manifest {
    pub fn parser_config(&self) -> ParserConfig {
        let defaults = ParserConfig::default();
        ParserConfig {
            default_help: self.default_help,
            program: self.program.clone(),
            banner: self.banner.clone(),
            tail: self.tail.clone(),
            pad: self.pad.unwrap_or(defaults.pad),
        }
    }
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    if !path.is_file() {
        bail!("manifest not found: {}", path.display());
    }

    tracing::debug!(path = %path.display(), "loading manifest");
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse manifest JSON: {}", path.display()))
}

pub fn write_default_manifest(project_dir: &Path, overwrite: bool) -> Result<PathBuf> {
    let dest = project_dir.join(DEFAULT_MANIFEST_NAME);
    if dest.exists() && !overwrite {
        bail!("{DEFAULT_MANIFEST_NAME} already exists in {}", project_dir.display());
    }

    let program = program_name_for(project_dir).unwrap_or_else(|| "my-cli".to_string());
    let mut json = serde_json::to_string_pretty(&default_manifest(&program))
        .context("failed to serialize manifest")?;
    json.push('\n');

    // rename replaces an existing manifest in one step
    let tmp = dest.with_extension("json.tmp");
    fs::write(&tmp, &json).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, &dest)
        .with_context(|| format!("failed to move {} into place", dest.display()))?;
    Ok(dest)
}

fn option(grammar: &[&str], description: &str) -> OptionSpec {
    OptionSpec {
        grammar: grammar.iter().map(|s| s.to_string()).collect(),
        description: description.to_string(),
    }
}

fn default_manifest(program: &str) -> Manifest {
    Manifest {
        schema_version: Some(1),
        program: Some(program.to_string()),
        banner: format!("{program} 0.1.0"),
        options: vec![
            option(&["-v", "--verbose"], "toggle verbose"),
            option(&["-d", "--debug"], "toggle debug mode"),
            option(&["-o?", "--out=?"], "set output file"),
            option(&["-I?", "--include=?"], "add a path to the include search path"),
        ],
        ..Default::default()
    }
}

/// Name of the project directory; `.` and `..` resolve to real names.
fn program_name_for(project_dir: &Path) -> Option<String> {
    let dir = fs::canonicalize(project_dir).ok()?;
    dir.file_name()?.to_str().map(str::to_string)
}
