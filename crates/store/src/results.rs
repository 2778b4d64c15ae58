//! Live result sets.
//!
//! A `Results` handle indexes into a snapshot of `(RowId, version)` pairs
//! taken when its query last ran. The snapshot is refreshed on every commit
//! that touches its table, and the difference is delivered to its listeners
//! as a `ChangeSet`. Reads resolve the row id against the tables on every
//! call and hand out a freshly materialized `Rc<Row>`.

use crate::query::{Predicate, Query, SortDescriptor};
use crate::store::Store;
use crate::subscription::ListenerRegistry;
use crate::transaction::Tables;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use log::trace;
use notekeep_core::schema::Table;
use notekeep_core::{Error, Result, Row, RowId};
use notekeep_reactive::{ChangeCallback, ChangeSet, ListenerId, ResultSet, Slot};

/// Shared state of one live result set.
pub(crate) struct LiveResults {
    pub(crate) query: Query,
    pub(crate) snapshot: Vec<(RowId, u64)>,
    pub(crate) listeners: ListenerRegistry,
}

impl LiveResults {
    pub(crate) fn new(query: Query, tables: &Tables) -> Self {
        let mut live = Self {
            query,
            snapshot: Vec::new(),
            listeners: ListenerRegistry::new(),
        };
        live.snapshot = live.evaluate(tables);
        live
    }

    fn evaluate(&self, tables: &Tables) -> Vec<(RowId, u64)> {
        match tables.get(self.query.table()) {
            Some(store) => self.query.evaluate(store),
            None => Vec::new(),
        }
    }

    /// Re-runs the query and returns what changed since the last run.
    pub(crate) fn refresh(&mut self, tables: &Tables) -> ChangeSet {
        let next = self.evaluate(tables);
        let changes = ChangeSet::diff(&self.snapshot, &next);
        trace!(
            "refreshed {:?}: {} row(s), {} change(s)",
            self.query,
            next.len(),
            changes.len()
        );
        self.snapshot = next;
        changes
    }
}

/// Delivers `changes` to the listeners of `live`.
///
/// Runs over a snapshot of the registry with nothing borrowed; a listener
/// removed by an earlier callback in the same dispatch is skipped.
pub(crate) fn dispatch(live: &Rc<RefCell<LiveResults>>, changes: &ChangeSet) {
    let listeners = live.borrow().listeners.snapshot();
    for (id, callback) in listeners {
        if live.borrow().listeners.contains(id) {
            callback(changes);
        }
    }
}

/// Handle to a live, ordered result set over one table.
///
/// Cloning yields another handle to the same result set.
#[derive(Clone)]
pub struct Results {
    store: Store,
    live: Rc<RefCell<LiveResults>>,
}

impl Results {
    pub(crate) fn new(store: Store, live: Rc<RefCell<LiveResults>>) -> Self {
        Self { store, live }
    }

    /// Returns the name of the table this result set reads.
    pub fn table(&self) -> String {
        self.live.borrow().query.table().into()
    }

    /// Returns the row ids in result order, as of the last commit.
    pub fn row_ids(&self) -> Vec<RowId> {
        self.live.borrow().snapshot.iter().map(|(id, _)| *id).collect()
    }

    /// Returns the number of listeners registered on this result set.
    pub fn listener_count(&self) -> usize {
        self.live.borrow().listeners.len()
    }

    /// Returns true if both handles refer to the same live result set.
    pub fn ptr_eq(&self, other: &Results) -> bool {
        Rc::ptr_eq(&self.live, &other.live)
    }

    fn derive(&self, build: impl FnOnce(&Query, &Tables) -> Result<Query>) -> Result<Self> {
        let query = {
            let live = self.live.borrow();
            self.store.with_tables(|tables| build(&live.query, tables))?
        };
        self.store.register_query(query)
    }
}

fn schema_of<'a>(tables: &'a Tables, table: &str) -> Result<&'a Table> {
    tables
        .get(table)
        .map(|store| store.schema())
        .ok_or_else(|| Error::table_not_found(table))
}

impl ResultSet for Results {
    type Item = Rc<Row>;
    type Sort = SortDescriptor;
    type Filter = Predicate;

    fn len(&self) -> usize {
        self.live.borrow().snapshot.len()
    }

    fn get(&self, index: usize) -> Slot<Rc<Row>> {
        let live = self.live.borrow();
        let row_id = match live.snapshot.get(index) {
            Some((row_id, _)) => *row_id,
            None => return Slot::Missing,
        };
        let table = live.query.table();
        self.store.with_tables(|tables| {
            match tables.get(table).and_then(|store| store.get(row_id)) {
                Some(row) => Slot::Present(Rc::new(row.clone())),
                None => Slot::Null,
            }
        })
    }

    fn sorted(&self, sort: SortDescriptor) -> Result<Self> {
        self.derive(|query, tables| query.with_sort(schema_of(tables, query.table())?, &sort))
    }

    fn filtered(&self, predicate: Predicate) -> Result<Self> {
        self.derive(|query, tables| {
            query.with_filter(schema_of(tables, query.table())?, predicate)
        })
    }

    fn is_in_transaction(&self) -> bool {
        self.store.is_in_transaction()
    }

    fn add_listener(&self, callback: ChangeCallback) -> Result<ListenerId> {
        if self.store.is_in_transaction() {
            return Err(Error::in_transaction("add a listener"));
        }
        Ok(self.live.borrow_mut().listeners.add(callback))
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.live.borrow_mut().listeners.remove(id)
    }
}

impl core::fmt::Debug for Results {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let live = self.live.borrow();
        f.debug_struct("Results")
            .field("query", &live.query)
            .field("len", &live.snapshot.len())
            .field("listeners", &live.listeners.len())
            .finish()
    }
}
