//! Undo journal for write transactions.
//!
//! Changes are applied to the tables eagerly; the journal remembers enough
//! to put every touched row back if the write is cancelled.

use crate::table::RowStore;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use notekeep_core::{Row, RowId};

/// A single recorded change.
#[derive(Clone, Debug, PartialEq)]
pub enum JournalEntry {
    /// A row was inserted.
    Insert { table: String, row_id: RowId },
    /// A row was updated; `old` is its previous state.
    Update { table: String, old: Row },
    /// A row was deleted.
    Delete { table: String, row: Row },
}

impl JournalEntry {
    /// Returns the table name for this entry.
    pub fn table(&self) -> &str {
        match self {
            JournalEntry::Insert { table, .. }
            | JournalEntry::Update { table, .. }
            | JournalEntry::Delete { table, .. } => table,
        }
    }

    /// Returns the row id for this entry.
    pub fn row_id(&self) -> RowId {
        match self {
            JournalEntry::Insert { row_id, .. } => *row_id,
            JournalEntry::Update { old, .. } => old.id(),
            JournalEntry::Delete { row, .. } => row.id(),
        }
    }
}

/// Ordered log of the changes made by one write transaction.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an insert.
    pub fn record_insert(&mut self, table: &str, row_id: RowId) {
        self.entries.push(JournalEntry::Insert {
            table: table.into(),
            row_id,
        });
    }

    /// Records an update with the row's previous state.
    pub fn record_update(&mut self, table: &str, old: Row) {
        self.entries.push(JournalEntry::Update {
            table: table.into(),
            old,
        });
    }

    /// Records a delete with the removed row.
    pub fn record_delete(&mut self, table: &str, row: Row) {
        self.entries.push(JournalEntry::Delete {
            table: table.into(),
            row,
        });
    }

    /// Returns the recorded entries in order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Returns the number of recorded entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalizes the journal, returning its entries.
    pub fn commit(&mut self) -> Vec<JournalEntry> {
        core::mem::take(&mut self.entries)
    }

    /// Undoes every recorded change, newest first.
    ///
    /// Updated and deleted rows come back with their original version, so a
    /// cancelled write is indistinguishable from one that never happened.
    pub fn rollback(&mut self, tables: &mut HashMap<String, RowStore>) {
        for entry in self.entries.drain(..).rev() {
            match entry {
                JournalEntry::Insert { table, row_id } => {
                    if let Some(store) = tables.get_mut(&table) {
                        let _ = store.delete(row_id);
                    }
                }
                JournalEntry::Update { table, old } | JournalEntry::Delete { table, row: old } => {
                    if let Some(store) = tables.get_mut(&table) {
                        store.restore(old);
                    }
                }
            }
        }
    }
}
