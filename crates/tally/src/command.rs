//! Command decoding and dispatch.
//!
//! Positional arguments are decoded once into a [`Command`] value; nothing
//! downstream matches on command strings again. Every destructive command
//! goes through a [`Confirm`] prompt that no flag can bypass.

use std::io::{self, Write};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tracing::info;

use tally_store::{Store, StoreError};

use crate::backup;
use crate::error::CommandError;
use crate::render;
use crate::session::{self, SessionContext};

/// A decoded command with its positional payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the command reference.
    Help,
    /// Print every person with their balance.
    List,
    /// Print one person's entry history.
    Get {
        /// Person to show.
        name: String,
    },
    /// Record a new entry.
    Add {
        /// Owning person.
        name: String,
        /// Signed amount.
        amount: Decimal,
        /// Free-text description.
        reason: String,
    },
    /// Register a new person.
    AddPerson {
        /// Name to register.
        name: String,
    },
    /// Remove one entry, addressed by recency index.
    Remove {
        /// Owning person.
        name: String,
        /// Reverse index: 0 = most recent entry.
        index: i64,
    },
    /// Remove a person and all of their entries.
    RemovePerson {
        /// Person to remove.
        name: String,
    },
    /// Enter the interactive session.
    Run,
    /// Snapshot the database file.
    Backup,
    /// Leave the session (or the process).
    Exit,
}

impl Command {
    /// Decode positional arguments into a command, enforcing arity.
    ///
    /// Returns `Ok(None)` for an empty argument list, which callers turn
    /// into a usage hint rather than an error.
    pub fn decode(positional: &[String]) -> Result<Option<Self>, CommandError> {
        let Some((cmd, rest)) = positional.split_first() else {
            return Ok(None);
        };

        let command = match cmd.as_str() {
            "help" => zero_arity(rest, Self::Help)?,
            "list" => zero_arity(rest, Self::List)?,
            "run" => zero_arity(rest, Self::Run)?,
            "backup" => zero_arity(rest, Self::Backup)?,
            "exit" => zero_arity(rest, Self::Exit)?,
            "get" => {
                let [name] = arity(rest, "<name>")?;
                Self::Get { name }
            }
            "add" => {
                let [name, amount, reason] = arity(rest, "<name> <amount> <reason>")?;
                let amount = amount
                    .parse::<Decimal>()
                    .map_err(|_| CommandError::InvalidNumber(amount))?;
                Self::Add { name, amount, reason }
            }
            "add-person" | "add-p" => {
                let [name] = arity(rest, "<name>")?;
                Self::AddPerson { name }
            }
            "rm" => {
                let [name, index] = arity(rest, "<name> <idx>")?;
                let index = index
                    .parse::<i64>()
                    .map_err(|_| CommandError::InvalidNumber(index))?;
                Self::Remove { name, index }
            }
            "rm-p" | "rm-person" => {
                let [name] = arity(rest, "<name>")?;
                Self::RemovePerson { name }
            }
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Enforce that `rest` holds exactly `N` positional arguments.
fn arity<const N: usize>(
    rest: &[String],
    required: &'static str,
) -> Result<[String; N], CommandError> {
    <[String; N]>::try_from(rest.to_vec()).map_err(|_| CommandError::InvalidArguments {
        given: rest.join(", "),
        required,
    })
}

fn zero_arity(rest: &[String], command: Command) -> Result<Command, CommandError> {
    let [] = arity(rest, "no arguments")?;
    Ok(command)
}

/// Whether an operation should go ahead. Implementations block on the
/// interactive surface; tests script the answers.
pub trait Confirm {
    /// Ask the user; `true` means proceed.
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

/// Stdin-backed confirmation: accepts `y` or `Y`, anything else declines.
///
/// Blocks without timeout; destructive operations are interactive-only.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt} (y/N) ")?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// What the caller's loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep going.
    Continue,
    /// Terminate the session (propagates through nested sessions).
    Exit,
}

/// Execute a decoded command against the store.
///
/// All output goes through `out` so tests can capture it; errors bubble up
/// to the caller's single recovery boundary.
pub fn execute<W: Write, C: Confirm>(
    cmd: Command,
    ctx: &SessionContext,
    store: &mut Store,
    out: &mut W,
    confirm: &mut C,
) -> Result<Outcome, CommandError> {
    let color = ctx.has_flag("color");

    match cmd {
        Command::Help => render::print_help(out)?,
        Command::List => {
            let overview = store.overview()?;
            render::print_overview(out, &overview, ctx.has_flag("all"), color)?;
        }
        Command::Get { name } => {
            if !store.person_exists(&name)? {
                return Err(StoreError::NotFound(name).into());
            }
            let history = store.history(&name)?;
            render::print_history(out, &name, &history, color)?;
        }
        Command::Add { name, amount, reason } => {
            let created_at = resolve_timestamp(ctx)?;
            let id = store.create_entry(&name, amount, &reason, created_at)?;
            info!(id, %name, %amount, "entry created");
            writeln!(
                out,
                "Added entry for {}: {}",
                render::name(&name, color),
                render::balance(amount, color)
            )?;
        }
        Command::AddPerson { name } => {
            store.create_person(&name)?;
            writeln!(out, "Added person {}", render::name(&name, color))?;
        }
        Command::Remove { name, index } => return remove_entry(name, index, store, out, confirm, color),
        Command::RemovePerson { name } => {
            return remove_person(name, store, out, confirm, color)
        }
        Command::Run => return session::interactive(ctx, store, out, confirm),
        Command::Backup => {
            let dest = backup::create_backup(store)?;
            writeln!(out, "Backup written to {}", dest.display())?;
        }
        Command::Exit => return Ok(Outcome::Exit),
    }

    Ok(Outcome::Continue)
}

fn remove_entry<W: Write, C: Confirm>(
    name: String,
    index: i64,
    store: &mut Store,
    out: &mut W,
    confirm: &mut C,
    color: bool,
) -> Result<Outcome, CommandError> {
    let count = store.count_entries(&name)?;
    if count == 0 {
        return Err(CommandError::NotFound(name));
    }
    if index < 0 || index as u64 >= count {
        return Err(CommandError::InvalidIndex { name, index, max: count - 1 });
    }

    // Index is validated against the count above, so the entry exists.
    let entry = store
        .entry_by_reverse_index(&name, index as u64)?
        .ok_or(CommandError::InvalidIndex { name, index, max: count - 1 })?;

    writeln!(out, "{}", render::entry_line(&entry, color))?;
    if confirm.confirm("Delete this entry?")? {
        store.remove_entry(entry.id)?;
        info!(id = entry.id, "entry removed");
        writeln!(out, "Deleted entry")?;
    } else {
        writeln!(out, "Deletion cancelled")?;
    }
    Ok(Outcome::Continue)
}

fn remove_person<W: Write, C: Confirm>(
    name: String,
    store: &mut Store,
    out: &mut W,
    confirm: &mut C,
    color: bool,
) -> Result<Outcome, CommandError> {
    if !store.person_exists(&name)? {
        return Err(StoreError::NotFound(name).into());
    }
    let balance = store.current_balance(&name)?;
    let entries = store.count_entries(&name)?;

    writeln!(out, "{}", render::person_line(&name, balance, entries, color))?;
    if confirm.confirm("Delete person?")? {
        store.remove_person(&name)?;
        info!(%name, "person removed");
        writeln!(out, "Removed person {}", render::name(&name, color))?;
    } else {
        writeln!(out, "Deletion cancelled")?;
    }
    Ok(Outcome::Continue)
}

/// Resolve the timestamp for a new entry: the `date` variable if bound,
/// the current local time otherwise.
fn resolve_timestamp(ctx: &SessionContext) -> Result<NaiveDateTime, CommandError> {
    match ctx.var("date") {
        Some([spec, ..]) => parse_date_spec(spec, Local::now().date_naive()),
        _ => Ok(Local::now().naive_local()),
    }
}

/// Parse a `[YYYY-MM-DD][_HH:MM]` date specification.
///
/// A missing date portion defaults to `today`, a missing time portion to
/// midnight.
fn parse_date_spec(spec: &str, today: NaiveDate) -> Result<NaiveDateTime, CommandError> {
    let invalid = || CommandError::InvalidDate(spec.to_string());

    let (date_part, time_part) = match spec.split_once('_') {
        Some((date, time)) => (date, Some(time)),
        None => (spec, None),
    };

    let date = if date_part.is_empty() {
        today
    } else {
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid())?
    };
    let time = match time_part {
        Some(time) if !time.is_empty() => {
            NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| invalid())?
        }
        _ => NaiveTime::MIN,
    };

    Ok(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_decode_empty_is_none() {
        assert_eq!(Command::decode(&[]).unwrap(), None);
    }

    #[test]
    fn test_decode_add() {
        let cmd = Command::decode(&args(&["add", "alice", "-20.50", "coffee"]))
            .unwrap()
            .unwrap();
        assert_eq!(
            cmd,
            Command::Add {
                name: "alice".into(),
                amount: dec!(-20.50),
                reason: "coffee".into(),
            }
        );
    }

    #[test]
    fn test_decode_add_bad_amount() {
        let err = Command::decode(&args(&["add", "alice", "lots", "coffee"])).unwrap_err();
        assert!(matches!(err, CommandError::InvalidNumber(s) if s == "lots"));
    }

    #[test]
    fn test_decode_person_aliases() {
        let long = Command::decode(&args(&["add-person", "bob"])).unwrap().unwrap();
        let short = Command::decode(&args(&["add-p", "bob"])).unwrap().unwrap();
        assert_eq!(long, short);

        let long = Command::decode(&args(&["rm-person", "bob"])).unwrap().unwrap();
        let short = Command::decode(&args(&["rm-p", "bob"])).unwrap().unwrap();
        assert_eq!(long, short);
    }

    #[test]
    fn test_decode_arity_mismatch_names_required_shape() {
        let err = Command::decode(&args(&["add", "alice"])).unwrap_err();
        match err {
            CommandError::InvalidArguments { given, required } => {
                assert_eq!(given, "alice");
                assert_eq!(required, "<name> <amount> <reason>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_zero_arity_rejects_extras() {
        let err = Command::decode(&args(&["list", "alice"])).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments { .. }));
    }

    #[test]
    fn test_decode_unknown_command() {
        let err = Command::decode(&args(&["frobnicate"])).unwrap_err();
        assert!(matches!(err, CommandError::UnknownCommand(s) if s == "frobnicate"));
    }

    #[test]
    fn test_decode_rm_bad_index() {
        let err = Command::decode(&args(&["rm", "alice", "first"])).unwrap_err();
        assert!(matches!(err, CommandError::InvalidNumber(s) if s == "first"));
    }

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_date_spec_full() {
        let at = parse_date_spec("2024-01-01_09:30", march(15)).unwrap();
        assert_eq!(at.to_string(), "2024-01-01 09:30:00");
    }

    #[test]
    fn test_date_spec_date_only_defaults_to_midnight() {
        let at = parse_date_spec("2024-01-01", march(15)).unwrap();
        assert_eq!(at.to_string(), "2024-01-01 00:00:00");
    }

    #[test]
    fn test_date_spec_time_only_defaults_to_today() {
        let at = parse_date_spec("_09:30", march(15)).unwrap();
        assert_eq!(at.to_string(), "2024-03-15 09:30:00");
    }

    #[test]
    fn test_date_spec_trailing_underscore() {
        let at = parse_date_spec("2024-01-01_", march(15)).unwrap();
        assert_eq!(at.to_string(), "2024-01-01 00:00:00");
    }

    #[test]
    fn test_date_spec_invalid() {
        assert!(matches!(
            parse_date_spec("01/01/2024", march(15)),
            Err(CommandError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_date_spec("2024-01-01_9am", march(15)),
            Err(CommandError::InvalidDate(_))
        ));
    }
}
