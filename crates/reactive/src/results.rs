//! The live result set contract consumed by the cache.
//!
//! Any store that can hand out ordered, change-notifying result sets plugs
//! into the cache by implementing [`ResultSet`]. `notekeep-store` provides
//! the in-memory implementation.

use crate::change_set::ChangeSet;
use crate::identity::Identify;
use crate::object_cache::SharedCache;
use alloc::rc::Rc;
use notekeep_core::Result;

/// Identifier returned by a successful listener registration.
pub type ListenerId = u64;

/// Callback invoked by the store with each committed change set.
pub type ChangeCallback = Rc<dyn Fn(&ChangeSet)>;

/// Stable per-row key of a result set's elements.
pub type ElementKey<R> = <<R as ResultSet>::Item as Identify>::Key;

/// Object cache shape used by facades over `R`.
pub type ElementCache<R> = SharedCache<ElementKey<R>, <R as ResultSet>::Item>;

/// Outcome of reading one index of a result set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot<T> {
    /// The index holds a live element.
    Present(T),
    /// The index is in bounds but its row resolved to nothing, e.g. a row
    /// deleted by a write whose notification has not been delivered yet.
    Null,
    /// The index is past the end of the result set.
    Missing,
}

impl<T> Slot<T> {
    /// Returns true if the slot holds an element.
    #[inline]
    pub fn is_present(&self) -> bool {
        matches!(self, Slot::Present(_))
    }

    /// Returns true for an in-bounds index that resolved to nothing.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Slot::Null)
    }

    /// Returns true for an out-of-bounds index.
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Slot::Missing)
    }

    /// Converts into the element, dropping the null/missing distinction.
    pub fn present(self) -> Option<T> {
        match self {
            Slot::Present(value) => Some(value),
            Slot::Null | Slot::Missing => None,
        }
    }

    /// Borrows the element.
    pub fn as_ref(&self) -> Slot<&T> {
        match self {
            Slot::Present(value) => Slot::Present(value),
            Slot::Null => Slot::Null,
            Slot::Missing => Slot::Missing,
        }
    }

    /// Maps the element, keeping null and missing as they are.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Slot<U> {
        match self {
            Slot::Present(value) => Slot::Present(f(value)),
            Slot::Null => Slot::Null,
            Slot::Missing => Slot::Missing,
        }
    }
}

/// An ordered, live view over the rows matching a query.
///
/// Index validity is only guaranteed until the next change notification.
/// Implementations are cheap handles: cloning one must yield a handle to the
/// same live result set, not a copy of its rows.
pub trait ResultSet: Clone + 'static {
    /// Element handed out by indexed reads.
    type Item: Identify + Clone + 'static;
    /// Argument accepted by [`ResultSet::sorted`].
    type Sort;
    /// Argument accepted by [`ResultSet::filtered`].
    type Filter;

    /// Returns the current number of elements.
    fn len(&self) -> usize;

    /// Returns true if the result set is currently empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the element at `index`.
    fn get(&self, index: usize) -> Slot<Self::Item>;

    /// Derives a new live result set with a different order.
    fn sorted(&self, sort: Self::Sort) -> Result<Self>;

    /// Derives a new live result set restricted by `filter`.
    fn filtered(&self, filter: Self::Filter) -> Result<Self>;

    /// Returns true while the owning store has a write transaction open.
    fn is_in_transaction(&self) -> bool;

    /// Registers a change listener. Stores reject this inside a write.
    fn add_listener(&self, callback: ChangeCallback) -> Result<ListenerId>;

    /// Removes a change listener. Returns false if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
