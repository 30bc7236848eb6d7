//! Persisted record types.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// A single signed monetary record owned by a person.
///
/// Entries reference their owner by name, not by row id; removing a person
/// removes all of their entries in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Store-assigned surrogate key.
    pub id: i64,
    /// Name of the owning person.
    pub person: String,
    /// Signed amount; positive, negative or zero.
    pub amount: Decimal,
    /// When the entry was made (may be backdated).
    pub created_at: NaiveDateTime,
    /// Free-text description.
    pub reason: String,
}

/// A registered person together with their aggregated balance.
///
/// Produced by [`Store::overview`](crate::Store::overview); persons without
/// entries appear with a zero balance and an entry count of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonBalance {
    /// The person's name.
    pub name: String,
    /// Sum of all entry amounts, zero when there are none.
    pub balance: Decimal,
    /// Number of entries owned by this person.
    pub entries: u64,
}
