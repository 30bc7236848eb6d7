//! SQLite-backed ledger store for tally.
//!
//! This crate owns the two persisted entities of the ledger:
//!
//! - [`Entry`] - a signed monetary record belonging to a person
//! - [`PersonBalance`] - a person together with their aggregated balance
//!
//! and the [`Store`] handle that mediates all access to them. Every mutating
//! operation commits individually; the cascading removal of a person and
//! their entries runs inside a single transaction so a crash can never leave
//! orphaned entries behind.
//!
//! # Example
//!
//! ```
//! use tally_store::Store;
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let store = Store::open_in_memory().unwrap();
//! store.create_person("alice").unwrap();
//!
//! let at = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! store.create_entry("alice", dec!(50.00), "gift", at).unwrap();
//!
//! assert_eq!(store.current_balance("alice").unwrap(), dec!(50.00));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{Entry, PersonBalance};
pub use error::StoreError;
pub use store::Store;

// Re-export commonly used external types
pub use chrono::NaiveDateTime;
pub use rust_decimal::Decimal;
