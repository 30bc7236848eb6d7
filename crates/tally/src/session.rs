//! Session context and the interactive loop.
//!
//! The context carries the flags and variables accumulated by an
//! invocation. In an interactive session every line starts from a clone of
//! the context of the command that opened the session, so child commands
//! inherit `--date`, `--color` and friends without being able to mutate
//! their parent. Positional arguments are rebuilt per line and never
//! inherited.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use tally_store::Store;

use crate::command::{self, Command, Confirm, Outcome};
use crate::error::{ArgError, CommandError};
use crate::grammar;
use crate::render;

/// Carried-over parser state: enabled flags and bound variables.
///
/// Cloned from parent to child; the clone is extended by the child's own
/// arguments and discarded when its dispatch completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    flags: BTreeSet<String>,
    vars: BTreeMap<String, Vec<String>>,
}

impl SessionContext {
    /// An empty context, used for the top-level invocation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a boolean flag is enabled.
    #[must_use]
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    /// The captured values of a variable, if bound.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<&[String]> {
        self.vars.get(name).map(Vec::as_slice)
    }

    /// Enable a flag; setting it twice in one invocation chain is an error.
    pub(crate) fn set_flag(&mut self, name: &str) -> Result<(), ArgError> {
        if !self.flags.insert(name.to_string()) {
            return Err(ArgError::DuplicateArgument(name.to_string()));
        }
        Ok(())
    }

    /// Bind a variable; rebinding in one invocation chain is an error.
    pub(crate) fn bind_var(&mut self, name: &str, values: Vec<String>) -> Result<(), ArgError> {
        if self.vars.contains_key(name) {
            return Err(ArgError::DuplicateArgument(name.to_string()));
        }
        self.vars.insert(name.to_string(), values);
        Ok(())
    }
}

/// Parse and execute one token list seeded from `base`.
///
/// This is the whole pipeline shared by the process entry point and the
/// interactive loop: grammar parse, command decode, dispatch. An empty
/// command prints a hint instead of failing.
pub fn run_tokens<W: Write, C: Confirm>(
    tokens: &[String],
    base: &SessionContext,
    store: &mut Store,
    out: &mut W,
    confirm: &mut C,
) -> Result<Outcome, CommandError> {
    let invocation = grammar::parse(tokens, base)?;
    match Command::decode(&invocation.positional)? {
        Some(cmd) => {
            debug!(?cmd, "dispatching");
            command::execute(cmd, &invocation.context, store, out, confirm)
        }
        None => {
            writeln!(out, "Use command 'help' to show available commands")?;
            Ok(Outcome::Continue)
        }
    }
}

/// Run the interactive loop until an explicit `exit` (or EOF).
///
/// Each line is tokenized with shell-style quoting, bound to a clone of
/// `base`, and executed. Errors are printed and the loop continues; only
/// `exit` (possibly from a nested session) ends it.
pub fn interactive<W: Write, C: Confirm>(
    base: &SessionContext,
    store: &mut Store,
    out: &mut W,
    confirm: &mut C,
) -> Result<Outcome, CommandError> {
    let mut editor = DefaultEditor::new()?;

    let history = history_path();
    if let Some(ref path) = history {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = editor.load_history(path);
    }

    let outcome = loop {
        match editor.readline("tally> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                match run_line(line, base, store, out, confirm) {
                    Ok(Outcome::Exit) => break Outcome::Exit,
                    Ok(Outcome::Continue) => {}
                    Err(e) => render::print_error(&e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                writeln!(out, "(interrupted)")?;
            }
            Err(ReadlineError::Eof) => break Outcome::Exit,
            Err(e) => return Err(e.into()),
        }
    };

    if let Some(ref path) = history {
        let _ = editor.save_history(path);
    }
    Ok(outcome)
}

fn run_line<W: Write, C: Confirm>(
    line: &str,
    base: &SessionContext,
    store: &mut Store,
    out: &mut W,
    confirm: &mut C,
) -> Result<Outcome, CommandError> {
    let tokens = grammar::split_line(line)?;
    run_tokens(&tokens, base, store, out, confirm)
}

fn history_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tally").join("history"))
}
