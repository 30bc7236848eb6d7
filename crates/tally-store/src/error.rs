//! Ledger store error types.

use thiserror::Error;

/// Error returned by [`Store`](crate::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named person is not registered.
    #[error("person '{0}' does not exist")]
    NotFound(String),
    /// A person with this name is already registered.
    #[error("person '{0}' already exists")]
    Duplicate(String),
    /// The store has no backing file (in-memory), so file-level operations
    /// such as backup are unavailable.
    #[error("store has no backing file")]
    NoBackingFile,
    /// An underlying SQLite failure.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
