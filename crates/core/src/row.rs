//! Row structure for notekeep.
//!
//! A `Row` is one stored object: a stable identifier, a version counter and
//! positional values. The identifier survives updates and is never reused,
//! which is what makes it usable as a cache key.

use crate::value::Value;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a row.
pub type RowId = u64;

/// A dummy row ID used for rows that don't correspond to a stored object
/// (e.g., computed or projected rows).
pub const DUMMY_ROW_ID: RowId = u64::MAX;

/// Global row ID counter for generating unique row IDs.
static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

/// Gets the next unique row ID.
pub fn next_row_id() -> RowId {
    NEXT_ROW_ID.fetch_add(1, Ordering::SeqCst)
}

/// Sets the next row ID only if it's greater than the current value.
pub fn set_next_row_id_if_greater(id: RowId) {
    NEXT_ROW_ID.fetch_max(id, Ordering::SeqCst);
}

/// A row in a table.
#[derive(Clone, Debug)]
pub struct Row {
    /// Unique identifier for this row.
    id: RowId,
    /// Version number for change detection. Incremented on each update.
    version: u64,
    /// Values stored in this row, indexed by column position.
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row with the given ID and values.
    /// Version defaults to 1 for new rows.
    pub fn new(id: RowId, values: Vec<Value>) -> Self {
        Self {
            id,
            version: 1,
            values,
        }
    }

    /// Creates a new row with the given ID, version, and values.
    pub fn new_with_version(id: RowId, version: u64, values: Vec<Value>) -> Self {
        Self {
            id,
            version,
            values,
        }
    }

    /// Creates a new row with an automatically assigned ID.
    pub fn create(values: Vec<Value>) -> Self {
        Self::new(next_row_id(), values)
    }

    /// Creates a dummy row with no store identity.
    pub fn dummy(values: Vec<Value>) -> Self {
        Self::new(DUMMY_ROW_ID, values)
    }

    /// Returns the row ID.
    #[inline]
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Returns the version number.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Increments the version number and returns the new value.
    #[inline]
    pub fn increment_version(&mut self) -> u64 {
        self.version = self.version.wrapping_add(1);
        self.version
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Gets a value at the given column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Sets a value at the given column index.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        if index < self.values.len() {
            self.values[index] = value;
            true
        } else {
            false
        }
    }

    /// Returns the number of values in this row.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if this is a dummy row.
    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.id == DUMMY_ROW_ID
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.values == other.values
    }
}
