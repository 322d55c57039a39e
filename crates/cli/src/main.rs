mod check;
mod manifest;
mod session;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::{fs, io::Write, path::PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

use crate::manifest::{DEFAULT_MANIFEST_NAME, load_manifest, write_default_manifest};
use crate::session::ScanResult;

#[derive(Parser)]
#[command(name = "gnopt")]
#[command(version, about = "Declare, inspect and try out option grammars", long_about = None)]
struct Cli {
    /// Log everything, including per-token scanning decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter gnopt.json manifest
    Init(InitArgs),

    /// Compile every declaration in a manifest
    Check(CheckArgs),

    /// Print the help text a manifest produces
    Usage(UsageArgs),

    /// Scan arguments against a manifest and report what matched
    Scan(ScanArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Overwrite an existing manifest
    #[arg(short, long)]
    force: bool,
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to gnopt.json manifest
    #[arg(short, long, default_value = DEFAULT_MANIFEST_NAME, value_name = "FILE")]
    manifest: PathBuf,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct UsageArgs {
    /// Path to gnopt.json manifest
    #[arg(short, long, default_value = DEFAULT_MANIFEST_NAME, value_name = "FILE")]
    manifest: PathBuf,
}

#[derive(Parser)]
struct ScanArgs {
    /// Path to gnopt.json manifest
    #[arg(short, long, default_value = DEFAULT_MANIFEST_NAME, value_name = "FILE")]
    manifest: PathBuf,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,

    /// Arguments to scan, after `--`
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Check(args) => check_command(args),
        Commands::Usage(args) => usage(args),
        Commands::Scan(args) => scan(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let manifest_path = write_default_manifest(&dir, args.force)?;

    eprintln!("Created: {}", manifest_path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit {DEFAULT_MANIFEST_NAME} to declare your options");
    eprintln!("  2. Run: gnopt usage");
    eprintln!("  3. Run: gnopt scan -- -v --out=a.bin input.c");

    Ok(())
}

fn check_command(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let manifest = load_manifest(&args.manifest)?;
    let report = check::check_manifest(&manifest)
        .with_context(|| format!("manifest check failed: {}", args.manifest.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    eprintln!("=== Declaration Check Results ===");
    if let Some(program) = &report.program {
        eprintln!("Program: {program}");
    }
    eprintln!("Declarations: {}", report.declarations.len());
    for decl in &report.declarations {
        let spellings: Vec<&str> = decl
            .short
            .iter()
            .chain(decl.long.iter())
            .map(String::as_str)
            .collect();
        if spellings.is_empty() {
            continue;
        }
        let kind = if decl.needs_value { "value" } else { "flag" };
        eprintln!("  {} ({kind})", spellings.join(", "));
    }
    if report.inert > 0 {
        eprintln!("WARNING: {} declaration(s) have no spellings", report.inert);
    }
    eprintln!("OK");

    Ok(())
}

fn usage(args: UsageArgs) -> Result<()> {
    tracing::debug!("executing usage command");

    let manifest = load_manifest(&args.manifest)?;
    let log = session::InvocationLog::default();
    let parser = session::build_parser(&manifest, &log)?;

    let mut stdout = std::io::stdout().lock();
    parser
        .write_help(&mut stdout)
        .context("failed to write help")?;
    stdout.flush()?;
    Ok(())
}

fn scan(args: ScanArgs) -> Result<()> {
    tracing::debug!(args = args.args.len(), "executing scan command");

    let manifest = load_manifest(&args.manifest)?;
    match session::scan(&manifest, &args.args)? {
        ScanResult::Help(text) => {
            if args.json {
                bail!("help requested; run `gnopt usage` for the help text");
            }
            print!("{text}");
        }
        ScanResult::Report(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.to_text());
            }
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
