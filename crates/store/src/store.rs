//! The store handle.
//!
//! `Store` owns the tables, the open write transaction (if any) and weak
//! references to every live result set handed out. Committing a write
//! refreshes the result sets over the tables it touched and notifies their
//! listeners.
//!
//! # Example
//!
//! ```
//! use notekeep_core::schema::TableBuilder;
//! use notekeep_core::{DataType, Value};
//! use notekeep_reactive::ResultSet;
//! use notekeep_store::Store;
//!
//! let store = Store::new();
//! store.create_table(
//!     TableBuilder::new("notes").unwrap()
//!         .add_column("title", DataType::String).unwrap()
//!         .build().unwrap(),
//! ).unwrap();
//!
//! let notes = store.objects("notes").unwrap();
//! store.write(|s| s.insert("notes", vec![Value::from("milk")])).unwrap();
//! assert_eq!(notes.len(), 1);
//! ```

use crate::results::{dispatch, LiveResults, Results};
use crate::query::Query;
use crate::table::RowStore;
use crate::transaction::{Tables, Transaction};
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use hashbrown::HashSet;
use log::debug;
use notekeep_core::schema::Table;
use notekeep_core::{Error, Result, Row, RowId, Value};
use notekeep_reactive::ChangeSet;

type Pending = Vec<(Rc<RefCell<LiveResults>>, ChangeSet)>;

#[derive(Default)]
struct StoreInner {
    tables: Tables,
    transaction: Option<Transaction>,
    /// Every result set handed out; dead entries are pruned on commit
    live: Vec<Weak<RefCell<LiveResults>>>,
}

impl StoreInner {
    fn transaction_mut(&mut self, operation: &str) -> Result<(&mut Transaction, &mut Tables)> {
        match self.transaction.as_mut() {
            Some(tx) => Ok((tx, &mut self.tables)),
            None => Err(Error::no_transaction(operation)),
        }
    }

    /// Refreshes the result sets over `touched` tables and collects the
    /// non-empty change sets that have someone to deliver them to.
    fn refresh_live(&mut self, touched: &HashSet<String>) -> Pending {
        self.live.retain(|weak| weak.strong_count() > 0);

        let mut pending = Vec::new();
        for weak in &self.live {
            let live = match weak.upgrade() {
                Some(live) => live,
                None => continue,
            };
            if !touched.contains(live.borrow().query.table()) {
                continue;
            }
            let changes = live.borrow_mut().refresh(&self.tables);
            if !changes.is_empty() && !live.borrow().listeners.is_empty() {
                pending.push((live, changes));
            }
        }
        pending
    }
}

/// Handle to an in-memory live object store. Clones share the same store.
#[derive(Clone, Default)]
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table. Not allowed while a write is open.
    pub fn create_table(&self, schema: Table) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.transaction.is_some() {
            return Err(Error::in_transaction("create a table"));
        }
        let name = String::from(schema.name());
        if inner.tables.contains_key(&name) {
            return Err(Error::table_exists(name));
        }
        debug!("created table {}", name);
        inner.tables.insert(name, RowStore::new(schema));
        Ok(())
    }

    /// Returns true if the table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.inner.borrow().tables.contains_key(name)
    }

    /// Returns the number of rows in a table, including uncommitted changes.
    pub fn row_count(&self, table: &str) -> Result<usize> {
        self.inner
            .borrow()
            .tables
            .get(table)
            .map(RowStore::len)
            .ok_or_else(|| Error::table_not_found(table))
    }

    /// Returns a copy of the row with the given id.
    pub fn get(&self, table: &str, row_id: RowId) -> Option<Row> {
        self.inner
            .borrow()
            .tables
            .get(table)
            .and_then(|store| store.get(row_id))
            .cloned()
    }

    /// Returns a live result set over every row of `table`, in insertion order.
    pub fn objects(&self, table: &str) -> Result<Results> {
        if !self.has_table(table) {
            return Err(Error::table_not_found(table));
        }
        self.register_query(Query::all(table))
    }

    pub(crate) fn register_query(&self, query: Query) -> Result<Results> {
        let mut inner = self.inner.borrow_mut();
        let live = Rc::new(RefCell::new(LiveResults::new(query, &inner.tables)));
        inner.live.push(Rc::downgrade(&live));
        Ok(Results::new(self.clone(), live))
    }

    pub(crate) fn with_tables<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        f(&self.inner.borrow().tables)
    }

    /// Returns true while a write transaction is open.
    pub fn is_in_transaction(&self) -> bool {
        self.inner.borrow().transaction.is_some()
    }

    /// Opens a write transaction.
    pub fn begin_write(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.transaction.is_some() {
            return Err(Error::in_transaction("begin a write"));
        }
        let tx = Transaction::begin();
        debug!("write {} opened", tx.id());
        inner.transaction = Some(tx);
        Ok(())
    }

    /// Commits the open write.
    ///
    /// Every live result set over a touched table is re-evaluated and diffed
    /// against its previous snapshot. The transaction is closed and all
    /// borrows released before listeners run, so they may read, register,
    /// unregister or open a new write.
    pub fn commit(&self) -> Result<()> {
        let pending = {
            let mut inner = self.inner.borrow_mut();
            let tx = inner
                .transaction
                .take()
                .ok_or_else(|| Error::no_transaction("commit"))?;
            let tx_id = tx.id();
            let entries = tx.commit();
            debug!("write {} committed with {} change(s)", tx_id, entries.len());
            if entries.is_empty() {
                Pending::new()
            } else {
                let touched: HashSet<String> =
                    entries.iter().map(|entry| String::from(entry.table())).collect();
                inner.refresh_live(&touched)
            }
        };

        for (live, changes) in &pending {
            dispatch(live, changes);
        }
        Ok(())
    }

    /// Cancels the open write, undoing its changes. Listeners are not notified.
    pub fn cancel_write(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let tx = inner
            .transaction
            .take()
            .ok_or_else(|| Error::no_transaction("cancel a write"))?;
        let tx_id = tx.id();
        tx.rollback(&mut inner.tables);
        debug!("write {} cancelled", tx_id);
        Ok(())
    }

    /// Runs `f` inside a write transaction.
    ///
    /// Commits if `f` succeeds; cancels and returns its error otherwise.
    pub fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Store) -> Result<T>,
    {
        self.begin_write()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.cancel_write()?;
                Err(err)
            }
        }
    }

    /// Inserts a row. Requires an open write.
    pub fn insert(&self, table: &str, values: Vec<Value>) -> Result<RowId> {
        let mut inner = self.inner.borrow_mut();
        let (tx, tables) = inner.transaction_mut("insert")?;
        tx.insert(tables, table, values)
    }

    /// Replaces a row's values. Requires an open write.
    pub fn update(&self, table: &str, row_id: RowId, values: Vec<Value>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let (tx, tables) = inner.transaction_mut("update")?;
        tx.update(tables, table, row_id, values)
    }

    /// Deletes a row. Requires an open write.
    pub fn delete(&self, table: &str, row_id: RowId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let (tx, tables) = inner.transaction_mut("delete")?;
        tx.delete(tables, table, row_id).map(|_| ())
    }

    /// Returns the number of listeners across all live result sets.
    pub fn listener_count(&self) -> usize {
        self.inner
            .borrow()
            .live
            .iter()
            .filter_map(Weak::upgrade)
            .map(|live| live.borrow().listeners.len())
            .sum()
    }

    /// Returns the number of live result sets still referenced.
    pub fn live_results_count(&self) -> usize {
        self.inner
            .borrow()
            .live
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl core::fmt::Debug for Store {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("tables", &inner.tables.len())
            .field("in_transaction", &inner.transaction.is_some())
            .field("live_results", &inner.live.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use core::cell::Cell;
    use notekeep_core::schema::TableBuilder;
    use notekeep_core::DataType;
    use notekeep_reactive::{ChangeCallback, ResultSet};

    fn notes_schema() -> Table {
        TableBuilder::new("notes")
            .unwrap()
            .add_column("title", DataType::String)
            .unwrap()
            .build()
            .unwrap()
    }

    fn store() -> Store {
        let store = Store::new();
        store.create_table(notes_schema()).unwrap();
        store
    }

    fn recorder(log: &Rc<RefCell<Vec<ChangeSet>>>) -> ChangeCallback {
        let log = log.clone();
        Rc::new(move |changes: &ChangeSet| log.borrow_mut().push(changes.clone()))
    }

    #[test]
    fn test_create_table_twice() {
        let store = store();
        assert_eq!(
            store.create_table(notes_schema()),
            Err(Error::table_exists("notes"))
        );
        assert!(store.has_table("notes"));
    }

    #[test]
    fn test_create_table_in_write() {
        let store = Store::new();
        store.begin_write().unwrap();
        assert!(matches!(
            store.create_table(notes_schema()),
            Err(Error::InTransaction { .. })
        ));
    }

    #[test]
    fn test_objects_unknown_table() {
        let store = store();
        assert!(matches!(
            store.objects("tags"),
            Err(Error::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_mutation_requires_write() {
        let store = store();
        assert_eq!(
            store.insert("notes", vec![Value::from("a")]),
            Err(Error::no_transaction("insert"))
        );
        assert!(store.commit().is_err());
        assert!(store.cancel_write().is_err());
    }

    #[test]
    fn test_nested_begin_rejected() {
        let store = store();
        store.begin_write().unwrap();
        assert!(store.begin_write().is_err());
        assert!(store.is_in_transaction());
        store.commit().unwrap();
        assert!(!store.is_in_transaction());
    }

    #[test]
    fn test_commit_notifies_with_diff() {
        let store = store();
        let first = store.write(|s| s.insert("notes", vec![Value::from("a")])).unwrap();
        let results = store.objects("notes").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        results.add_listener(recorder(&log)).unwrap();

        store
            .write(|s| {
                s.insert("notes", vec![Value::from("b")])?;
                s.update("notes", first, vec![Value::from("a2")])
            })
            .unwrap();

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].insertions, vec![1]);
        assert_eq!(log[0].modifications, vec![0]);
        assert!(log[0].deletions.is_empty());
    }

    #[test]
    fn test_empty_commit_notifies_nobody() {
        let store = store();
        let results = store.objects("notes").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        results.add_listener(recorder(&log)).unwrap();

        store.write(|_| Ok(())).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_untouched_table_not_notified() {
        let store = store();
        store
            .create_table(
                TableBuilder::new("tags")
                    .unwrap()
                    .add_column("name", DataType::String)
                    .unwrap()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let results = store.objects("notes").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        results.add_listener(recorder(&log)).unwrap();

        store.write(|s| s.insert("tags", vec![Value::from("x")])).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_write_error_rolls_back() {
        let store = store();
        let results = store.objects("notes").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        results.add_listener(recorder(&log)).unwrap();

        let result: Result<()> = store.write(|s| {
            s.insert("notes", vec![Value::from("a")])?;
            s.insert("notes", vec![Value::Int64(1)])?;
            Ok(())
        });

        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
        assert!(!store.is_in_transaction());
        assert_eq!(store.row_count("notes").unwrap(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_cancel_restores_deleted_row() {
        let store = store();
        let id = store.write(|s| s.insert("notes", vec![Value::from("a")])).unwrap();

        store.begin_write().unwrap();
        store.delete("notes", id).unwrap();
        assert!(store.get("notes", id).is_none());
        store.cancel_write().unwrap();

        assert_eq!(store.get("notes", id).unwrap().get(0), Some(&Value::from("a")));
    }

    #[test]
    fn test_transaction_closed_during_dispatch() {
        let store = store();
        let results = store.objects("notes").unwrap();
        let saw_open = Rc::new(Cell::new(true));

        let callback: ChangeCallback = {
            let store = store.clone();
            let saw_open = saw_open.clone();
            Rc::new(move |_: &ChangeSet| saw_open.set(store.is_in_transaction()))
        };
        results.add_listener(callback).unwrap();

        store.write(|s| s.insert("notes", vec![Value::from("a")])).unwrap();
        assert!(!saw_open.get());
    }

    #[test]
    fn test_dropped_results_are_pruned() {
        let store = store();
        let results = store.objects("notes").unwrap();
        let sorted = results.sorted(crate::SortDescriptor::asc("title")).unwrap();
        assert_eq!(store.live_results_count(), 2);

        drop(sorted);
        assert_eq!(store.live_results_count(), 1);

        store.write(|s| s.insert("notes", vec![Value::from("a")])).unwrap();
        assert_eq!(store.inner.borrow().live.len(), 1);
        drop(results);
        assert_eq!(store.live_results_count(), 0);
    }

    #[test]
    fn test_listener_count_spans_result_sets() {
        let store = store();
        let a = store.objects("notes").unwrap();
        let b = a.filtered(crate::Predicate::ne("title", "x")).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = a.add_listener(recorder(&log)).unwrap();
        b.add_listener(recorder(&log)).unwrap();

        assert_eq!(store.listener_count(), 2);
        assert!(a.remove_listener(id));
        assert_eq!(store.listener_count(), 1);
    }
}
