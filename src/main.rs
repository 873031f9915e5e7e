//! folio - check and resolve generated e-reader documents

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use folio::{ParameterSet, ReaderConfig, parse_index, read_document, scan_chapter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Inspect e-reader chapter and index documents", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio inspect ch2.html                 Show chapter bounds and check its locations
    folio resolve index.html location=150  Show which chapter the index forwards to")]
struct Cli {
    /// JSON file overriding attribute, parameter and key names
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a chapter's bounds and neighbours and check its location tags
    Inspect {
        #[arg(value_name = "CHAPTER")]
        chapter: PathBuf,
    },
    /// Resolve a query string against an index document
    Resolve {
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// Query string as it would appear in the URL
        #[arg(value_name = "QUERY", default_value = "")]
        query: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Command::Inspect { chapter } => inspect(chapter, &config),
        Command::Resolve { index, query } => resolve(index, query, &config),
    });

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ReaderConfig, String> {
    let Some(path) = path else {
        return Ok(ReaderConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    ReaderConfig::from_json(&text).map_err(|e| format!("{}: {e}", path.display()))
}

/// Returns false when the chapter breaks the location contract.
fn inspect(path: &Path, config: &ReaderConfig) -> Result<bool, String> {
    let html = read_document(path).map_err(|e| e.to_string())?;
    let scan = scan_chapter(&html, &config.attributes).map_err(|e| e.to_string())?;
    let descriptor = &scan.descriptor;

    println!("File: {}", path.display());
    println!("Bounds: {}", descriptor.range);
    println!("Locations: {}", scan.locations.len());
    println!(
        "Previous: {}",
        descriptor.previous.as_deref().unwrap_or("(start of book)")
    );
    println!(
        "Next: {}",
        descriptor.next.as_deref().unwrap_or("(end of book)")
    );
    if let Some(index) = &descriptor.index {
        println!("Index: {index}");
    }

    let problems = scan.problems();
    for problem in &problems {
        println!("problem: {problem}");
    }
    Ok(problems.is_empty())
}

fn resolve(path: &Path, query: &str, config: &ReaderConfig) -> Result<bool, String> {
    let html = read_document(path).map_err(|e| e.to_string())?;
    let index = parse_index(&html, &config.attributes).map_err(|e| e.to_string())?;
    log::debug!("Index lists {} chapters spanning {:?}", index.len(), index.span());

    let redirect = index
        .resolve(&ParameterSet::parse(query))
        .map_err(|e| e.to_string())?;
    println!("{}", redirect.target);
    Ok(true)
}
