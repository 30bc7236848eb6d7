//! The [`Store`] handle mediating all ledger persistence.
//!
//! Amounts are persisted as canonical decimal strings rather than SQLite
//! `REAL` values so no precision is lost round-tripping through the store;
//! aggregation therefore happens in Rust over [`Decimal`] values.
//! Timestamps are persisted as `%Y-%m-%dT%H:%M:%S` text, which makes
//! lexicographic order equal chronological order.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::entry::{Entry, PersonBalance};
use crate::error::StoreError;

/// Timestamp column format. Sorts lexicographically in chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Handle to the ledger database.
///
/// Opened once at process start and passed explicitly to whoever needs it;
/// there is no global connection. All operations commit individually and are
/// atomic at the granularity of a single call.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) the ledger database at `path`.
    ///
    /// The schema is created idempotently, so opening an existing database
    /// is harmless.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        setup_schema(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    /// Open a fresh in-memory store. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        setup_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Path of the backing database file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Check whether a person with this name is registered.
    pub fn person_exists(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM person WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Register a new person.
    ///
    /// Fails with [`StoreError::Duplicate`] if the name is taken.
    pub fn create_person(&self, name: &str) -> Result<(), StoreError> {
        if self.person_exists(name)? {
            return Err(StoreError::Duplicate(name.to_string()));
        }
        self.conn
            .execute("INSERT INTO person (name) VALUES (?1)", params![name])?;
        Ok(())
    }

    /// Remove a person and all of their entries.
    ///
    /// Both deletes run inside a single transaction: a crash mid-operation
    /// can never leave orphaned entries behind. Fails with
    /// [`StoreError::NotFound`] if the person is absent; returns whether the
    /// person row was actually removed.
    pub fn remove_person(&mut self, name: &str) -> Result<bool, StoreError> {
        if !self.person_exists(name)? {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM money WHERE name = ?1", params![name])?;
        let removed = tx.execute("DELETE FROM person WHERE name = ?1", params![name])?;
        tx.commit()?;

        Ok(removed > 0)
    }

    /// Record a new entry for an existing person, returning its id.
    ///
    /// Fails with [`StoreError::NotFound`] if the person is absent; no
    /// partial row is written in that case.
    pub fn create_entry(
        &self,
        name: &str,
        amount: Decimal,
        reason: &str,
        created_at: NaiveDateTime,
    ) -> Result<i64, StoreError> {
        if !self.person_exists(name)? {
            return Err(StoreError::NotFound(name.to_string()));
        }
        self.conn.execute(
            "INSERT INTO money (name, amount, created_at, reason) VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                amount.to_string(),
                created_at.format(TIMESTAMP_FORMAT).to_string(),
                reason,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Delete an entry by surrogate key. Idempotent: deleting an id that
    /// does not exist is not an error.
    pub fn remove_entry(&self, entry_id: i64) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM money WHERE id = ?1", params![entry_id])?;
        Ok(())
    }

    /// Fetch the entry at `index` when a person's entries are ordered most
    /// recent first (index 0 = latest). Returns `None` past the end.
    pub fn entry_by_reverse_index(
        &self,
        name: &str,
        index: u64,
    ) -> Result<Option<Entry>, StoreError> {
        let entry = self
            .conn
            .query_row(
                "SELECT id, name, amount, created_at, reason FROM money
                 WHERE name = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1 OFFSET ?2",
                params![name, index as i64],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Number of entries owned by a person.
    pub fn count_entries(&self, name: &str) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM money WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Sum of a person's entry amounts; zero when there are none.
    pub fn current_balance(&self, name: &str) -> Result<Decimal, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT amount FROM money WHERE name = ?1")?;
        let amounts = stmt.query_map(params![name], |row| decimal_column(row, 0))?;

        let mut balance = Decimal::ZERO;
        for amount in amounts {
            balance += amount?;
        }
        Ok(balance)
    }

    /// All entries of a person, oldest first.
    pub fn history(&self, name: &str) -> Result<Vec<Entry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, amount, created_at, reason FROM money
             WHERE name = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![name], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Every registered person with their balance and entry count, ordered
    /// by name. Persons without entries appear with a zero balance.
    pub fn overview(&self) -> Result<Vec<PersonBalance>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.name, m.amount FROM person p
             LEFT JOIN money m ON p.name = m.name
             ORDER BY p.name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let amount: Option<String> = row.get(1)?;
            let amount = amount
                .map(|s| parse_decimal(1, &s))
                .transpose()?;
            Ok((name, amount))
        })?;

        let mut overview: Vec<PersonBalance> = Vec::new();
        for row in rows {
            let (name, amount) = row?;
            match overview.last_mut() {
                Some(last) if last.name == name => {
                    if let Some(amount) = amount {
                        last.balance += amount;
                        last.entries += 1;
                    }
                }
                _ => overview.push(PersonBalance {
                    name,
                    balance: amount.unwrap_or_default(),
                    entries: u64::from(amount.is_some()),
                }),
            }
        }
        Ok(overview)
    }

    /// Close the connection, run `f` on the backing file, then reopen.
    ///
    /// Used by backup to release the SQLite file lock while the file is
    /// copied. Fails with [`StoreError::NoBackingFile`] for in-memory
    /// stores. If closing fails the original connection is kept.
    pub fn reopen_around<T>(
        &mut self,
        f: impl FnOnce(&Path) -> T,
    ) -> Result<T, StoreError> {
        let path = self.path.clone().ok_or(StoreError::NoBackingFile)?;

        // Swap in a throwaway connection so the real one can be consumed.
        let placeholder = Connection::open_in_memory()?;
        let conn = std::mem::replace(&mut self.conn, placeholder);
        if let Err((conn, err)) = conn.close() {
            self.conn = conn;
            return Err(err.into());
        }

        let result = f(&path);
        self.conn = Connection::open(&path)?;
        Ok(result)
    }
}

/// Create the two ledger tables and their index. Safe to run repeatedly.
fn setup_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS person (
            name TEXT PRIMARY KEY
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS money (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL REFERENCES person(name),
            amount TEXT NOT NULL,
            created_at TEXT NOT NULL,
            reason TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_money_name ON money(name, created_at)",
        [],
    )?;
    Ok(())
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let created_at: String = row.get(3)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(Entry {
        id: row.get(0)?,
        person: row.get(1)?,
        amount: decimal_column(row, 2)?,
        created_at,
        reason: row.get(4)?,
    })
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    parse_decimal(idx, &raw)
}

fn parse_decimal(idx: usize, raw: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
