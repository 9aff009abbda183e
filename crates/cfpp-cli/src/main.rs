//! cfpp command-line driver.
//!
//! Reads a JSON template, expands every extrinsic node, and prints the
//! result to stdout with two-space indentation and lexicographically sorted
//! keys. Any evaluation error prints a single `<dotted path>: <message>`
//! line on stderr and exits non-zero.

use cfpp_eval::Evaluator;
use cfpp_types::Config;
use clap::Parser;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cfpp", version, about = "Pre-processor for JSON templates with extrinsic functions")]
struct Cli {
    /// Template file to expand.
    filename: PathBuf,

    /// Directory to add to the search path used when reading files
    /// referenced from the template. The working directory is always
    /// searched first, regardless of this setting. Repeat the option once
    /// per directory.
    #[arg(short = 's', long = "search-path", value_name = "DIR")]
    search_path: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(expanded) => {
            println!("{expanded}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, String> {
    let text = fs::read_to_string(&cli.filename)
        .map_err(|e| format!("{}: {e}", cli.filename.display()))?;
    let parsed: Value =
        serde_json::from_str(&text).map_err(|e| format!("{}: {e}", cli.filename.display()))?;

    let config = Config::with_search_path(cli.search_path.iter().cloned());
    let expanded = Evaluator::new(config)
        .evaluate_document(&parsed)
        .map_err(|e| e.to_string())?;

    serde_json::to_string_pretty(&expanded).map_err(|e| e.to_string())
}
