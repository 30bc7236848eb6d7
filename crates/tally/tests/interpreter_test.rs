//! End-to-end interpreter tests: raw tokens through grammar, decode and
//! dispatch against an in-memory store, with scripted confirmations and a
//! captured output buffer.

use std::io;

use rust_decimal_macros::dec;

use tally::{CommandError, Confirm, Outcome, SessionContext};
use tally_store::{Store, StoreError};

/// Confirmation fake: pops pre-scripted answers and records every prompt.
#[derive(Debug, Default)]
struct ScriptedConfirm {
    answers: Vec<bool>,
    prompts: Vec<String>,
}

impl ScriptedConfirm {
    fn answering(answers: &[bool]) -> Self {
        Self {
            // Popped from the back.
            answers: answers.iter().rev().copied().collect(),
            prompts: Vec::new(),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop().expect("unexpected confirmation prompt"))
    }
}

fn run(
    store: &mut Store,
    confirm: &mut ScriptedConfirm,
    words: &[&str],
) -> Result<(Outcome, String), CommandError> {
    let tokens: Vec<String> = words.iter().map(ToString::to_string).collect();
    let mut out = Vec::new();
    let outcome = tally::session::run_tokens(
        &tokens,
        &SessionContext::new(),
        store,
        &mut out,
        confirm,
    )?;
    Ok((outcome, String::from_utf8(out).unwrap()))
}

fn run_ok(store: &mut Store, confirm: &mut ScriptedConfirm, words: &[&str]) -> String {
    run(store, confirm, words).expect("command failed").1
}

#[test]
fn test_add_person_add_entries_get_history() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    run_ok(&mut store, &mut confirm, &["add", "Alice", "50", "gift"]);
    run_ok(&mut store, &mut confirm, &["add", "Alice", "-20", "coffee"]);

    let output = run_ok(&mut store, &mut confirm, &["get", "Alice"]);
    assert!(output.starts_with("Alice:\n"));
    assert!(output.contains("(gift)"));
    assert!(output.contains("(coffee)"));
    assert!(output.trim_end().ends_with("+  30.00"));

    assert_eq!(store.current_balance("Alice").unwrap(), dec!(30));
    assert_eq!(store.count_entries("Alice").unwrap(), 2);
}

#[test]
fn test_add_before_add_person_fails_and_store_unchanged() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    let err = run(&mut store, &mut confirm, &["add", "Bob", "10", "x"]).unwrap_err();
    assert!(matches!(
        err,
        CommandError::Store(StoreError::NotFound(name)) if name == "Bob"
    ));
    assert!(store.overview().unwrap().is_empty());
}

#[test]
fn test_get_unknown_person_fails() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    let err = run(&mut store, &mut confirm, &["get", "Nobody"]).unwrap_err();
    assert!(matches!(err, CommandError::Store(StoreError::NotFound(_))));
}

#[test]
fn test_duplicate_person_is_rejected() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    let err = run(&mut store, &mut confirm, &["add-person", "Alice"]).unwrap_err();
    assert!(matches!(
        err,
        CommandError::Store(StoreError::Duplicate(name)) if name == "Alice"
    ));
}

#[test]
fn test_rm_out_of_range_reports_valid_range() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    run_ok(&mut store, &mut confirm, &["add", "Alice", "50", "gift"]);
    run_ok(&mut store, &mut confirm, &["add", "Alice", "-20", "coffee"]);

    let err = run(&mut store, &mut confirm, &["rm", "Alice", "5"]).unwrap_err();
    assert!(matches!(err, CommandError::InvalidIndex { .. }));
    assert!(err.to_string().contains("0-1"));
    assert!(confirm.prompts.is_empty(), "no prompt for an invalid index");
}

#[test]
fn test_rm_without_entries_is_not_found() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    let err = run(&mut store, &mut confirm, &["rm", "Alice", "0"]).unwrap_err();
    assert!(matches!(err, CommandError::NotFound(name) if name == "Alice"));
}

#[test]
fn test_rm_confirmed_removes_most_recent_entry() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::answering(&[true]);

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    run_ok(
        &mut store,
        &mut confirm,
        &["add", "Alice", "50", "gift", "--date", "2024-01-01"],
    );
    run_ok(
        &mut store,
        &mut confirm,
        &["add", "Alice", "-20", "coffee", "--date", "2024-01-02"],
    );

    let output = run_ok(&mut store, &mut confirm, &["rm", "Alice", "0"]);
    assert!(output.contains("(coffee)"), "shows the entry being deleted");
    assert!(output.contains("Deleted entry"));

    let reasons: Vec<_> = store
        .history("Alice")
        .unwrap()
        .into_iter()
        .map(|e| e.reason)
        .collect();
    assert_eq!(reasons, ["gift"]);
}

#[test]
fn test_rm_cancelled_mutates_nothing() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::answering(&[false]);

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    run_ok(&mut store, &mut confirm, &["add", "Alice", "50", "gift"]);

    let output = run_ok(&mut store, &mut confirm, &["rm", "Alice", "0"]);
    assert!(output.contains("Deletion cancelled"));
    assert_eq!(store.count_entries("Alice").unwrap(), 1);
}

#[test]
fn test_rm_person_confirmed_cascades() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::answering(&[true]);

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    run_ok(&mut store, &mut confirm, &["add", "Alice", "50", "gift"]);

    let output = run_ok(&mut store, &mut confirm, &["rm-p", "Alice"]);
    assert!(output.contains("(+50.00, 1 entry)"));
    assert!(output.contains("Removed person Alice"));
    assert!(!store.person_exists("Alice").unwrap());
    assert_eq!(store.count_entries("Alice").unwrap(), 0);
}

#[test]
fn test_rm_person_cancelled_mutates_nothing() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::answering(&[false]);

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    let output = run_ok(&mut store, &mut confirm, &["rm-p", "Alice"]);
    assert!(output.contains("Deletion cancelled"));
    assert!(store.person_exists("Alice").unwrap());
}

#[test]
fn test_flags_do_not_bypass_confirmation() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::answering(&[false]);

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    run_ok(&mut store, &mut confirm, &["add", "Alice", "50", "gift"]);

    run_ok(
        &mut store,
        &mut confirm,
        &["rm", "Alice", "0", "--color", "--all"],
    );
    assert_eq!(confirm.prompts.len(), 1, "prompt still happens with flags set");
    assert_eq!(store.count_entries("Alice").unwrap(), 1);
}

#[test]
fn test_backdated_entry_uses_date_var() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    run_ok(
        &mut store,
        &mut confirm,
        &["add", "Alice", "50", "gift", "--date", "2024-01-01_09:00"],
    );

    let history = store.history("Alice").unwrap();
    assert_eq!(history[0].created_at.to_string(), "2024-01-01 09:00:00");
}

#[test]
fn test_date_var_does_not_leak_into_next_invocation() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    // Two invocations seeded from the same base context, the way the
    // interactive loop seeds every line: the first binds `date`, the
    // second starts from the untouched base and falls back to now.
    run_ok(
        &mut store,
        &mut confirm,
        &["add", "Alice", "50", "gift", "--date", "2024-01-01_09:00"],
    );
    run_ok(&mut store, &mut confirm, &["add", "Alice", "-20", "coffee"]);

    let history = store.history("Alice").unwrap();
    assert_eq!(history[0].created_at.to_string(), "2024-01-01 09:00:00");
    assert!(
        history[1].created_at.date().to_string() != "2024-01-01",
        "second entry must not inherit the backdate"
    );
}

#[test]
fn test_invalid_date_var() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    run_ok(&mut store, &mut confirm, &["add-person", "Alice"]);
    let err = run(
        &mut store,
        &mut confirm,
        &["add", "Alice", "50", "gift", "--date", "someday"],
    )
    .unwrap_err();
    assert!(matches!(err, CommandError::InvalidDate(s) if s == "someday"));
    assert_eq!(store.count_entries("Alice").unwrap(), 0);
}

#[test]
fn test_list_is_sorted_and_includes_zero_balances() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    run_ok(&mut store, &mut confirm, &["add-person", "bob"]);
    run_ok(&mut store, &mut confirm, &["add-person", "alice"]);
    run_ok(&mut store, &mut confirm, &["add", "bob", "10", "lunch"]);

    let output = run_ok(&mut store, &mut confirm, &["list"]);
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("alice"));
    assert!(lines[0].contains("=   0.00"));
    assert!(lines[1].starts_with("bob"));
    assert!(lines[1].contains("+  10.00"));
}

#[test]
fn test_list_all_flag_adds_entry_counts() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    run_ok(&mut store, &mut confirm, &["add-person", "alice"]);
    let output = run_ok(&mut store, &mut confirm, &["list", "-a"]);
    assert!(output.contains("(0 entries)"));
}

#[test]
fn test_exit_propagates() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    let (outcome, _) = run(&mut store, &mut confirm, &["exit"]).unwrap();
    assert_eq!(outcome, Outcome::Exit);
}

#[test]
fn test_empty_invocation_prints_hint() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    let (outcome, output) = run(&mut store, &mut confirm, &["--color"]).unwrap();
    assert_eq!(outcome, Outcome::Continue);
    assert!(output.contains("help"));
}

#[test]
fn test_unknown_command() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    let err = run(&mut store, &mut confirm, &["frobnicate"]).unwrap_err();
    assert!(matches!(err, CommandError::UnknownCommand(ref s) if s == "frobnicate"));
    assert!(err.is_usage());
}

#[test]
fn test_help_lists_every_command() {
    let mut store = Store::open_in_memory().unwrap();
    let mut confirm = ScriptedConfirm::default();

    let output = run_ok(&mut store, &mut confirm, &["help"]);
    for cmd in ["help", "list", "get", "add", "add-person", "rm", "rm-person", "run", "backup", "exit"] {
        assert!(output.contains(cmd), "help is missing '{cmd}'");
    }
}
