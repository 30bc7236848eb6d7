//! The `tally` binary: opens the store, parses the argument list and hands
//! it to the interpreter pipeline in the library crate.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::Level;

use tally::{render, session, Outcome, SessionContext, StdinConfirm};
use tally_store::Store;

const USAGE_HINT: &str = "usage: tally [--db FILE] <command> [args]... (try 'tally help')";

/// Personal ledger: persons, signed money entries, balances.
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ledger database file (default: <data dir>/tally/tally.db)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Command and its arguments, e.g. `add alice 12.50 lunch --date 2024-01-01`
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .init();
    }

    if cli.args.is_empty() {
        eprintln!("{USAGE_HINT}");
        return ExitCode::from(1);
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format!("error: {e:#}").red());
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut store = Store::open(&db_path)
        .with_context(|| format!("failed to open ledger database {}", db_path.display()))?;

    let context = SessionContext::new();
    let mut stdout = io::stdout();
    let mut confirm = StdinConfirm;

    // Single recovery boundary: every interpreter error lands here. Only
    // argument-shape failures make the non-interactive invocation exit
    // non-zero; everything else is reported and the process ends normally.
    // The store connection closes when `store` drops.
    match session::run_tokens(&cli.args, &context, &mut store, &mut stdout, &mut confirm) {
        Ok(Outcome::Continue | Outcome::Exit) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            render::print_error(&e);
            if e.is_usage() {
                eprintln!("{USAGE_HINT}");
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn default_db_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("tally").join("tally.db"))
        .context("could not determine a data directory; pass --db FILE")
}
