//! Write transactions.
//!
//! At most one write is open per store. Mutations are applied to the tables
//! immediately and journaled; commit discards the journal, cancel replays it
//! backwards.

use crate::journal::{Journal, JournalEntry};
use crate::table::RowStore;
use alloc::string::String;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::HashMap;
use notekeep_core::{Error, Result, Row, RowId, Value};

static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction ID type.
pub type TransactionId = u64;

/// Tables of a store, keyed by name.
pub type Tables = HashMap<String, RowStore>;

fn table_mut<'a>(tables: &'a mut Tables, table: &str) -> Result<&'a mut RowStore> {
    tables
        .get_mut(table)
        .ok_or_else(|| Error::table_not_found(table))
}

/// An open write transaction.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    journal: Journal,
}

impl Transaction {
    /// Opens a new transaction.
    pub fn begin() -> Self {
        Self {
            id: NEXT_TX_ID.fetch_add(1, Ordering::SeqCst),
            journal: Journal::new(),
        }
    }

    /// Returns the transaction ID.
    #[inline]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the changes made so far.
    pub fn changes(&self) -> &[JournalEntry] {
        self.journal.entries()
    }

    /// Inserts a new row with a fresh id.
    pub fn insert(&mut self, tables: &mut Tables, table: &str, values: Vec<Value>) -> Result<RowId> {
        let store = table_mut(tables, table)?;
        let row_id = store.insert(Row::create(values))?;
        self.journal.record_insert(table, row_id);
        Ok(row_id)
    }

    /// Replaces the values of an existing row.
    pub fn update(
        &mut self,
        tables: &mut Tables,
        table: &str,
        row_id: RowId,
        values: Vec<Value>,
    ) -> Result<()> {
        let store = table_mut(tables, table)?;
        let old = store.update(row_id, values)?;
        self.journal.record_update(table, old);
        Ok(())
    }

    /// Deletes a row, returning it.
    pub fn delete(&mut self, tables: &mut Tables, table: &str, row_id: RowId) -> Result<Row> {
        let store = table_mut(tables, table)?;
        let row = store.delete(row_id)?;
        self.journal.record_delete(table, row.clone());
        Ok(row)
    }

    /// Commits, returning the journaled changes.
    pub fn commit(mut self) -> Vec<JournalEntry> {
        self.journal.commit()
    }

    /// Undoes every change made by this transaction.
    pub fn rollback(mut self, tables: &mut Tables) {
        self.journal.rollback(tables);
    }
}
