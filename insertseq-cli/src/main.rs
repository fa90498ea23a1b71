//! Command-line interface for insertseq
//! Interprets one sequence line and prints a value for every selection.
//!
//! Usage:
//!   insertseq `<line>` [-n `<count>`]              - Values for `count` empty selections
//!   insertseq `<line>` -s a -s b                   - Values for the given selection texts
//!   printf 'a\nb\n' | insertseq `<line>` --stdin   - Selection texts from stdin lines
//!   insertseq `<line>` --json                      - Values plus diagnostics as JSON

use clap::{Arg, ArgAction, ArgMatches, Command};
use insertseq_config::Loader;
use insertseq_core::{GenerateError, GenerationContext, Sequence, Severity};
use std::io::{self, BufRead};
use std::process::ExitCode;
use thiserror::Error;

const DEFAULT_MAX: &str = "1000";

#[derive(Error, Debug)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] insertseq_config::Error),

    #[error("{0}")]
    Generate(#[from] GenerateError),

    #[error("invalid --set '{0}', expected KEY=VALUE")]
    Override(String),

    #[error("reading stdin: {0}")]
    Stdin(#[from] io::Error),

    #[error("serializing output: {0}")]
    Json(#[from] serde_json::Error),
}

fn build_command() -> Command {
    Command::new("insertseq")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate sequences from a compact one-line notation")
        .arg(
            Arg::new("line")
                .help("Sequence notation, e.g. '5 steps:2 ~03d' or '%2025-01-31 step:1m'")
                .allow_hyphen_values(true)
                .default_value("")
                .index(1),
        )
        .arg(
            Arg::new("selection")
                .long("selection")
                .short('s')
                .help("Original text of one insertion point (repeatable)")
                .allow_hyphen_values(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("count")
                .long("count")
                .short('n')
                .help("Number of empty insertion points")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("stdin")
                .long("stdin")
                .help("Read insertion point texts from stdin, one per line")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML settings file layered over the defaults"),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .help("Override one setting, e.g. --set number_format=03d (repeatable)")
                .value_name("KEY=VALUE")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("delimiter")
                .long("delimiter")
                .help("Extra text that ends the start token and modifier values"),
        )
        .arg(
            Arg::new("max")
                .long("max")
                .help("Upper bound on emitted values when a stop expression decides")
                .value_parser(clap::value_parser!(usize))
                .default_value(DEFAULT_MAX),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print values and diagnostics as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log debug diagnostics to stderr")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "insertseq=debug" } else { "insertseq=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn run(matches: &ArgMatches) -> Result<(), CliError> {
    let mut settings = load_settings(matches)?;
    if matches.get_flag("verbose") {
        settings.debug = true;
    }

    let selections = read_selections(matches)?;
    let delimiter = matches.get_one::<String>("delimiter").cloned();
    let ctx = GenerationContext::with_delimiter(selections, settings, delimiter);

    let line = matches.get_one::<String>("line").map_or("", String::as_str);
    let max = matches.get_one::<usize>("max").copied().unwrap_or(1000);
    let mut sequence = Sequence::prepare(line, &ctx)?;
    let values = sequence.collect(max);

    if matches.get_flag("json") {
        let diagnostics: Vec<_> = ctx
            .diagnostics()
            .entries()
            .into_iter()
            .map(|d| {
                serde_json::json!({
                    "severity": match d.severity {
                        Severity::Debug => "debug",
                        Severity::Warning => "warning",
                    },
                    "message": d.message,
                })
            })
            .collect();
        let output = serde_json::json!({
            "kind": format!("{:?}", sequence.kind()),
            "values": values,
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for value in &values {
            println!("{value}");
        }
    }
    Ok(())
}

fn load_settings(matches: &ArgMatches) -> Result<insertseq_core::Settings, CliError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(overrides) = matches.get_many::<String>("set") {
        for entry in overrides {
            let (key, value) = entry
                .split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .ok_or_else(|| CliError::Override(entry.clone()))?;
            loader = loader.set_override(key, value.to_string())?;
        }
    }
    Ok(loader.build()?)
}

/// Selection texts in order: `--selection` values, `--count` empty ones, then
/// stdin lines. One empty selection when nothing was given.
fn read_selections(matches: &ArgMatches) -> Result<Vec<String>, CliError> {
    let mut selections: Vec<String> = matches
        .get_many::<String>("selection")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if let Some(count) = matches.get_one::<usize>("count") {
        selections.extend(std::iter::repeat(String::new()).take(*count));
    }
    if matches.get_flag("stdin") {
        for line in io::stdin().lock().lines() {
            selections.push(line?);
        }
    }
    if selections.is_empty() && matches.get_one::<usize>("count").is_none() {
        selections.push(String::new());
    }
    Ok(selections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        build_command().debug_assert();
    }

    #[test]
    fn selections_default_to_one_empty() {
        let matches = build_command().get_matches_from(["insertseq", "1"]);
        assert_eq!(read_selections(&matches).unwrap(), vec![String::new()]);
    }

    #[test]
    fn selections_and_count_combine() {
        let matches =
            build_command().get_matches_from(["insertseq", "1", "-s", "a", "-s", "b", "-n", "2"]);
        assert_eq!(read_selections(&matches).unwrap(), vec!["a", "b", "", ""]);
    }

    #[test]
    fn bad_override_is_rejected() {
        let matches = build_command().get_matches_from(["insertseq", "1", "--set", "nokey"]);
        assert!(matches!(load_settings(&matches), Err(CliError::Override(_))));
    }
}
