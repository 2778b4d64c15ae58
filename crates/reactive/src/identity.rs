//! Object identity resolution.
//!
//! Cache entries are keyed by the store's own object identity rather than by
//! position, since positions shift with every insertion and deletion.

use crate::results::Slot;
use alloc::rc::Rc;
use core::fmt::Debug;
use core::hash::Hash;
use notekeep_core::{Row, RowId};

/// Resolves the stable identity of a result set element.
///
/// The key must stay the same across field updates of one logical row and
/// must differ between two rows even when one replaced the other at the same
/// index. `None` means the element has no stable identity and must not be
/// cached.
pub trait Identify {
    /// Key type used by the object cache.
    type Key: Hash + Eq + Clone + Debug + 'static;

    /// Returns the element's identity, if it has one.
    fn identity(&self) -> Option<Self::Key>;
}

impl Identify for Row {
    type Key = RowId;

    #[inline]
    fn identity(&self) -> Option<RowId> {
        if self.is_dummy() {
            None
        } else {
            Some(self.id())
        }
    }
}

impl<T: Identify + ?Sized> Identify for Rc<T> {
    type Key = T::Key;

    #[inline]
    fn identity(&self) -> Option<T::Key> {
        (**self).identity()
    }
}

impl<T: Identify> Slot<T> {
    /// Identity of the element in this slot; null and missing slots have none.
    pub fn identity(&self) -> Option<T::Key> {
        match self {
            Slot::Present(value) => value.identity(),
            Slot::Null | Slot::Missing => None,
        }
    }
}
