//! In-crate result set double for unit tests.
//!
//! Mirrors the behaviour the cache relies on from a real store: every read
//! materializes a fresh `Rc<Row>`, derived views share the base rows, and
//! listener dispatch tolerates listeners removing themselves.

use crate::change_set::ChangeSet;
use crate::results::{ChangeCallback, ListenerId, ResultSet, Slot};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use notekeep_core::{Error, Result, Row, Value};

pub(crate) fn note(id: u64, title: &str) -> Row {
    Row::new(id, alloc::vec![Value::from(title)])
}

#[derive(Default)]
struct MockState {
    rows: Vec<Option<Row>>,
    in_transaction: bool,
    listeners: Vec<(ListenerId, ChangeCallback)>,
    next_listener: ListenerId,
    add_listener_calls: usize,
}

#[derive(Clone)]
pub(crate) struct MockResults {
    state: Rc<RefCell<MockState>>,
    /// View position -> base position; `None` is the base order.
    order: Option<Rc<Vec<usize>>>,
    fail_requery: Rc<Cell<bool>>,
}

impl MockResults {
    pub(crate) fn new(rows: impl IntoIterator<Item = Row>) -> Self {
        let state = MockState {
            rows: rows.into_iter().map(Some).collect(),
            next_listener: 1,
            ..MockState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            order: None,
            fail_requery: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn set_in_transaction(&self, open: bool) {
        self.state.borrow_mut().in_transaction = open;
    }

    pub(crate) fn fail_requery(&self, fail: bool) {
        self.fail_requery.set(fail);
    }

    /// Replaces a base row with a null slot, like a deleted row that is still indexed.
    pub(crate) fn null_row(&self, index: usize) {
        self.state.borrow_mut().rows[index] = None;
    }

    pub(crate) fn remove_row(&self, index: usize) {
        self.state.borrow_mut().rows.remove(index);
    }

    pub(crate) fn push_row(&self, row: Row) {
        self.state.borrow_mut().rows.push(Some(row));
    }

    pub(crate) fn update_row(&self, index: usize, title: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(Some(row)) = state.rows.get_mut(index) {
            row.set(0, Value::from(title));
            row.increment_version();
        }
    }

    pub(crate) fn add_listener_calls(&self) -> usize {
        self.state.borrow().add_listener_calls
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub(crate) fn emit(&self, changes: &ChangeSet) {
        let snapshot: Vec<(ListenerId, ChangeCallback)> = self.state.borrow().listeners.clone();
        for (id, callback) in snapshot {
            let still_registered = self
                .state
                .borrow()
                .listeners
                .iter()
                .any(|(other, _)| *other == id);
            if still_registered {
                callback(changes);
            }
        }
    }

    fn base_index(&self, index: usize) -> Option<usize> {
        match &self.order {
            Some(order) => order.get(index).copied(),
            None => Some(index),
        }
    }

    fn derive(&self, order: Vec<usize>) -> Result<Self> {
        if self.fail_requery.get() {
            return Err(Error::invalid_operation("mock requery failure"));
        }
        Ok(Self {
            state: self.state.clone(),
            order: Some(Rc::new(order)),
            fail_requery: self.fail_requery.clone(),
        })
    }
}

impl ResultSet for MockResults {
    type Item = Rc<Row>;
    /// Explicit view order over the base rows.
    type Sort = Vec<usize>;
    type Filter = fn(&Row) -> bool;

    fn len(&self) -> usize {
        match &self.order {
            Some(order) => order.len(),
            None => self.state.borrow().rows.len(),
        }
    }

    fn get(&self, index: usize) -> Slot<Rc<Row>> {
        let state = self.state.borrow();
        match self.base_index(index).and_then(|base| state.rows.get(base)) {
            Some(Some(row)) => Slot::Present(Rc::new(row.clone())),
            Some(None) => Slot::Null,
            None => Slot::Missing,
        }
    }

    fn sorted(&self, order: Vec<usize>) -> Result<Self> {
        self.derive(order)
    }

    fn filtered(&self, predicate: fn(&Row) -> bool) -> Result<Self> {
        let order = (0..self.len())
            .filter_map(|i| self.base_index(i))
            .filter(|&base| {
                matches!(self.state.borrow().rows.get(base), Some(Some(row)) if predicate(row))
            })
            .collect();
        self.derive(order)
    }

    fn is_in_transaction(&self) -> bool {
        self.state.borrow().in_transaction
    }

    fn add_listener(&self, callback: ChangeCallback) -> Result<ListenerId> {
        let mut state = self.state.borrow_mut();
        state.add_listener_calls += 1;
        if state.in_transaction {
            return Err(Error::in_transaction("add a listener"));
        }
        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.push((id, callback));
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(other, _)| *other != id);
        state.listeners.len() < before
    }
}
