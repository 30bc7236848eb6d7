//! Command interpreter for the tally personal ledger.
//!
//! The pipeline for every invocation, whether it comes from the process
//! argument list or from a line typed into the interactive session:
//!
//! 1. [`grammar`] tokenizes the raw tokens into flags, variables and
//!    positional arguments, seeded from the inherited [`session::SessionContext`].
//! 2. [`command::Command::decode`] turns the positional arguments into a
//!    typed command, enforcing arity.
//! 3. [`command::execute`] runs the command against the
//!    [`tally_store::Store`], rendering through [`render`].
//!
//! The `run` command enters a nested interactive loop in which each line
//! inherits a copy of the parent's flags and variables; see [`session`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backup;
pub mod command;
pub mod error;
pub mod grammar;
pub mod render;
pub mod session;

pub use command::{Command, Confirm, Outcome, StdinConfirm};
pub use error::{ArgError, CommandError};
pub use session::SessionContext;
