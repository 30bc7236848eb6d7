//! Textual presentation: sign-prefixed balances, timestamps, the overview
//! and history listings, and the static help text.
//!
//! Color is opt-in via the `color` flag and only ever changes how output
//! looks, never what happens.

use std::cmp::Ordering;
use std::io::Write;

use chrono::NaiveDateTime;
use colored::Colorize;
use rust_decimal::Decimal;

use tally_store::{Entry, PersonBalance};

use crate::error::CommandError;

/// Render a balance with an explicit sign: `+12.34`, `-12.34`, `=0.00`.
#[must_use]
pub fn balance(value: Decimal, color: bool) -> String {
    signed(value, &two_places(value), color)
}

/// Like [`balance`] but right-aligned to a fixed width for tabular output.
#[must_use]
pub fn fixed_balance(value: Decimal, color: bool) -> String {
    signed(value, &format!("{:>7}", two_places(value)), color)
}

/// A person or entry name, cyan when colored.
#[must_use]
pub fn name(text: &str, color: bool) -> String {
    if color {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

/// A timestamp in human-readable local form, cyan when colored.
#[must_use]
pub fn timestamp(at: NaiveDateTime, color: bool) -> String {
    let text = at.format("%Y-%m-%d %H:%M").to_string();
    if color {
        text.cyan().to_string()
    } else {
        text
    }
}

/// One entry with its owner, shown before deletion confirmations.
#[must_use]
pub fn entry_line(entry: &Entry, color: bool) -> String {
    format!(
        "{} {} {} ({})",
        name(&entry.person, color),
        balance(entry.amount, color),
        timestamp(entry.created_at, color),
        entry.reason
    )
}

/// One person with balance and entry count, shown before removal.
#[must_use]
pub fn person_line(person: &str, value: Decimal, entries: u64, color: bool) -> String {
    format!(
        "{} ({}, {} {})",
        name(person, color),
        balance(value, color),
        entries,
        plural(entries)
    )
}

/// Print the overview table: every person with their balance, and with
/// entry counts when `show_counts` is set.
pub fn print_overview<W: Write>(
    out: &mut W,
    overview: &[PersonBalance],
    show_counts: bool,
    color: bool,
) -> std::io::Result<()> {
    for person in overview {
        write!(out, "{:<10} {}", person.name, fixed_balance(person.balance, color))?;
        if show_counts {
            write!(out, " ({} {})", person.entries, plural(person.entries))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Print a person's history oldest-first, followed by the running total.
pub fn print_history<W: Write>(
    out: &mut W,
    person: &str,
    history: &[Entry],
    color: bool,
) -> std::io::Result<()> {
    writeln!(out, "{}:", name(person, color))?;

    let mut total = Decimal::ZERO;
    for entry in history {
        total += entry.amount;
        writeln!(
            out,
            "{} {} ({})",
            fixed_balance(entry.amount, color),
            timestamp(entry.created_at, color),
            entry.reason
        )?;
    }
    writeln!(out, "----------")?;
    writeln!(out, "{}", fixed_balance(total, color))?;
    Ok(())
}

/// Print the static command reference.
pub fn print_help<W: Write>(out: &mut W) -> std::io::Result<()> {
    const COMMANDS: &[(&str, &str)] = &[
        ("help", "Show this help message"),
        ("list", "Show the balance of every person (--all adds entry counts)"),
        ("get <name>", "Show all entries of the given person"),
        (
            "add <name> <amount> <reason>",
            "Record a new entry; --date [YYYY-MM-DD][_HH:MM] backdates it",
        ),
        ("add-person | add-p <name>", "Register a new person"),
        (
            "rm <name> <idx>",
            "Remove the entry at the given recency index (latest entry = 0)",
        ),
        ("rm-person | rm-p <name>", "Remove a person and all their entries"),
        ("run", "Enter an interactive session; arguments carry over per line"),
        ("backup", "Snapshot the database file into the backup folder"),
        ("exit", "Leave the interactive session"),
    ];

    writeln!(out, "Commands:")?;
    for (syntax, description) in COMMANDS {
        writeln!(out, "  {syntax:<34} {description}")?;
    }
    Ok(())
}

/// Print an error to the error stream, red when the terminal supports it.
pub fn print_error(err: &CommandError) {
    eprintln!("{}", format!("error: {err}").red());
}

fn signed(value: Decimal, body: &str, color: bool) -> String {
    let (sign, painted) = match value.cmp(&Decimal::ZERO) {
        Ordering::Less => ('-', format!("-{body}").red()),
        Ordering::Equal => ('=', format!("={body}").yellow()),
        Ordering::Greater => ('+', format!("+{body}").green()),
    };
    if color {
        painted.to_string()
    } else {
        format!("{sign}{body}")
    }
}

/// Absolute value rendered with exactly two decimal places.
fn two_places(value: Decimal) -> String {
    let mut rounded = value.abs().round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        "entry"
    } else {
        "entries"
    }
}
