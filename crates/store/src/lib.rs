//! Notekeep Store - In-memory live object store.
//!
//! A small, single-threaded object store whose result sets stay live: they
//! are re-evaluated on every commit and report what changed through
//! [`ChangeSet`](notekeep_reactive::ChangeSet) notifications. It implements
//! the [`ResultSet`](notekeep_reactive::ResultSet) contract, so the cached
//! facades of `notekeep-reactive` can sit on top of it.
//!
//! # Semantics
//!
//! - At most one write transaction is open at a time; every mutation must
//!   happen inside one.
//! - Each indexed read materializes a fresh `Rc<Row>`.
//! - A row deleted inside the open write reads as a null slot until commit.
//! - Listener registration is rejected while a write is open.
//! - Cancelled writes are rolled back and notify nobody.

#![no_std]

extern crate alloc;

pub mod journal;
pub mod query;
pub mod results;
pub mod store;
pub mod subscription;
pub mod table;
pub mod transaction;

pub use journal::{Journal, JournalEntry};
pub use query::{Predicate, Query, SortDescriptor};
pub use results::Results;
pub use store::Store;
pub use subscription::ListenerRegistry;
pub use table::RowStore;
pub use transaction::{Tables, Transaction, TransactionId};
