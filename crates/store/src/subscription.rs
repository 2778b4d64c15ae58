//! Listener bookkeeping for a live result set.

use alloc::vec::Vec;
use notekeep_reactive::{ChangeCallback, ListenerId};

/// Registered change listeners of one result set, in registration order.
pub struct ListenerRegistry {
    listeners: Vec<(ListenerId, ChangeCallback)>,
    next_id: ListenerId,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    /// Adds a listener and returns its id.
    pub fn add(&mut self, callback: ChangeCallback) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, callback));
        id
    }

    /// Removes a listener. Returns true if it was registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() < before
    }

    /// Returns true if the listener is still registered.
    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|(other, _)| *other == id)
    }

    /// Returns the listeners to notify for one dispatch.
    ///
    /// Dispatch runs over this copy with the registry unborrowed, so
    /// callbacks may add or remove listeners.
    pub fn snapshot(&self) -> Vec<(ListenerId, ChangeCallback)> {
        self.listeners.clone()
    }

    /// Returns the number of listeners.
    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if no listener is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Removes every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
