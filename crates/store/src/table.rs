//! Row storage for a single table.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use notekeep_core::schema::Table;
use notekeep_core::{Error, Result, Row, RowId, Value};

/// Rows of one table, keyed and ordered by row id.
///
/// Row ids are handed out monotonically, so id order is insertion order.
#[derive(Clone, Debug)]
pub struct RowStore {
    schema: Table,
    rows: BTreeMap<RowId, Row>,
}

impl RowStore {
    /// Creates an empty row store for the given table schema.
    pub fn new(schema: Table) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
        }
    }

    /// Returns the table schema.
    #[inline]
    pub fn schema(&self) -> &Table {
        &self.schema
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Inserts a row after validating it against the schema.
    pub fn insert(&mut self, row: Row) -> Result<RowId> {
        self.schema.validate(row.values())?;
        let row_id = row.id();
        if self.rows.contains_key(&row_id) {
            return Err(Error::invalid_operation(alloc::format!(
                "Row {} already exists in {}",
                row_id,
                self.name()
            )));
        }
        self.rows.insert(row_id, row);
        Ok(row_id)
    }

    /// Replaces a row's values and bumps its version. Returns the old row.
    pub fn update(&mut self, row_id: RowId, values: Vec<Value>) -> Result<Row> {
        self.schema.validate(&values)?;
        let name = self.schema.name();
        let current = self
            .rows
            .get_mut(&row_id)
            .ok_or_else(|| Error::not_found(name, row_id))?;
        let next = Row::new_with_version(row_id, current.version().wrapping_add(1), values);
        Ok(core::mem::replace(current, next))
    }

    /// Removes a row. Returns the removed row.
    pub fn delete(&mut self, row_id: RowId) -> Result<Row> {
        let name = self.schema.name();
        self.rows
            .remove(&row_id)
            .ok_or_else(|| Error::not_found(name, row_id))
    }

    /// Puts a row back exactly as it was, version included.
    pub(crate) fn restore(&mut self, row: Row) {
        self.rows.insert(row.id(), row);
    }

    /// Returns the row with the given id.
    #[inline]
    pub fn get(&self, row_id: RowId) -> Option<&Row> {
        self.rows.get(&row_id)
    }

    /// Returns true if a row with the given id exists.
    #[inline]
    pub fn contains(&self, row_id: RowId) -> bool {
        self.rows.contains_key(&row_id)
    }

    /// Iterates over all rows in id order.
    pub fn scan(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.values()
    }
}
