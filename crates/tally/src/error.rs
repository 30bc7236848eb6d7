//! Interpreter error types.
//!
//! Everything a command line can do wrong is an explicit error kind here.
//! All of them are recovered at a single boundary: the interactive loop
//! prints them and keeps reading, the non-interactive entry point prints
//! them and decides the exit code.

use thiserror::Error;

/// Error produced while tokenizing or parsing the argument list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgError {
    /// The argument name is not in the grammar table.
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    /// A flag or variable was supplied twice in one invocation chain.
    #[error("duplicate argument: --{0}")]
    DuplicateArgument(String),
    /// Input ran out before a variable collected all of its values.
    #[error("missing value for --{0}")]
    MissingArgumentValue(String),
    /// A quoted section of an interactive line was never closed.
    #[error("unmatched {0} quote in input")]
    UnmatchedQuote(char),
}

/// Error produced while decoding or executing a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The positional arguments do not match the command's arity.
    #[error("invalid arguments ({given}), requires: {required}")]
    InvalidArguments {
        /// The arguments that were supplied, comma separated.
        given: String,
        /// The shape the command requires, e.g. `<name> <amount> <reason>`.
        required: &'static str,
    },
    /// The first positional argument names no known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// The person has no entries that could be addressed by index.
    #[error("'{0}' has no entries to delete")]
    NotFound(String),
    /// The entry index is outside `[0, count)`.
    #[error("{index} is not a valid index for {name} (valid: 0-{max})")]
    InvalidIndex {
        /// Person whose entries were addressed.
        name: String,
        /// The rejected index.
        index: i64,
        /// Highest valid index.
        max: u64,
    },
    /// A positional argument could not be parsed as a number.
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
    /// The `date` variable could not be parsed.
    #[error("'{0}' is not a valid date, expected [YYYY-MM-DD][_HH:MM]")]
    InvalidDate(String),
    /// Argument parsing failed before dispatch.
    #[error(transparent)]
    Args(#[from] ArgError),
    /// The ledger store rejected the operation.
    #[error(transparent)]
    Store(#[from] tally_store::StoreError),
    /// Terminal or file I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The line editor failed.
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl CommandError {
    /// Whether this is an argument-shape failure, which exits non-zero at
    /// the non-interactive top level instead of being swallowed.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::InvalidArguments { .. } | Self::UnknownCommand(_) | Self::Args(_)
        )
    }
}
