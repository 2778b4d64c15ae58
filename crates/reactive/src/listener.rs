//! Change listener adapter.
//!
//! A `ChangeListener` watches one root result set and turns each committed
//! `ChangeSet` into cache invalidation plus a single render request.
//!
//! # Invalidation policy
//!
//! - Any deletion clears the whole cache. The notification only carries
//!   pre-change indices for deleted rows, which no longer resolve to an
//!   identity once it arrives.
//! - Each modified index is resolved against the current result set and its
//!   key is dropped from the cache.
//! - Insertions need no invalidation; they only trigger a render.
//!
//! # Registration
//!
//! ```text
//! Idle ──(no write open)──────────────────────────► Active ──teardown──► TornDown
//!   └──(write open)──► Deferred ──(next tick, write closed)──┘
//!                        │  ▲
//!                        └──┘ (next tick, write still open)
//! ```
//!
//! Stores reject listener registration while a write transaction is open, so
//! registration is never attempted in that state.

use crate::change_set::ChangeSet;
use crate::results::{ChangeCallback, ElementCache, ListenerId, ResultSet};
use crate::scheduler::Scheduler;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use log::{debug, trace, warn};

/// Callback asking the UI layer to re-render. Fire-and-forget.
pub type RenderTrigger = Rc<dyn Fn()>;

/// Registration state of a [`ChangeListener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerState {
    /// Not registered; registration failed or has not been attempted.
    Idle,
    /// Waiting for the open write transaction to close.
    Deferred,
    /// Registered with the store under the given id.
    Active(ListenerId),
    /// Unregistered for good.
    TornDown,
}

/// Adapter between a store's change notifications and a shared object cache.
pub struct ChangeListener<R: ResultSet> {
    results: R,
    cache: ElementCache<R>,
    trigger: RenderTrigger,
    state: Cell<ListenerState>,
}

impl<R: ResultSet> ChangeListener<R> {
    /// Creates a listener and registers it, deferring through `scheduler`
    /// while the store has a write open.
    pub fn attach(
        results: R,
        cache: ElementCache<R>,
        trigger: RenderTrigger,
        scheduler: &Rc<dyn Scheduler>,
    ) -> Rc<Self> {
        let listener = Rc::new(Self {
            results,
            cache,
            trigger,
            state: Cell::new(ListenerState::Idle),
        });
        Self::register_or_defer(&listener, scheduler.clone());
        listener
    }

    /// Returns the current registration state.
    #[inline]
    pub fn state(&self) -> ListenerState {
        self.state.get()
    }

    /// Returns true once the listener is registered with the store.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state.get(), ListenerState::Active(_))
    }

    fn register_or_defer(this: &Rc<Self>, scheduler: Rc<dyn Scheduler>) {
        match this.state.get() {
            ListenerState::Idle | ListenerState::Deferred => {}
            ListenerState::Active(_) | ListenerState::TornDown => return,
        }

        if !this.results.is_in_transaction() {
            let was_deferred = this.state.get() == ListenerState::Deferred;
            this.register();
            if was_deferred && this.is_active() {
                // commits made while deferred were never delivered
                debug!("deferred listener active; dropping elements cached meanwhile");
                this.cache.borrow_mut().clear();
            }
            return;
        }

        debug!("write transaction open; deferring listener registration");
        this.state.set(ListenerState::Deferred);
        let weak_self = Rc::downgrade(this);
        let next = scheduler.clone();
        scheduler.schedule(Box::new(move || {
            if let Some(listener) = weak_self.upgrade() {
                Self::register_or_defer(&listener, next);
            }
        }));
    }

    fn register(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let callback: ChangeCallback = Rc::new(move |changes: &ChangeSet| {
            if let Some(listener) = weak.upgrade() {
                listener.on_change(changes);
            }
        });

        match self.results.add_listener(callback) {
            Ok(id) => {
                debug!("change listener {} registered", id);
                self.state.set(ListenerState::Active(id));
            }
            Err(err) => {
                warn!("change listener registration failed: {}", err);
                self.state.set(ListenerState::Idle);
            }
        }
    }

    /// Applies one change set to the cache and requests a render.
    ///
    /// Empty change sets are absorbed without touching the cache or the
    /// trigger. The trigger runs exactly once per non-empty change set and
    /// after every cache borrow has been released, so it may read the facade
    /// or tear this listener down.
    pub fn on_change(&self, changes: &ChangeSet) {
        if changes.is_empty() {
            trace!("absorbing empty change set");
            return;
        }
        if self.state.get() == ListenerState::TornDown {
            return;
        }

        if changes.has_deletions() {
            debug!(
                "{} deletion(s); clearing object cache",
                changes.deletions.len()
            );
            self.cache.borrow_mut().clear();
        } else if !changes.modifications.is_empty() {
            let keys: Vec<_> = changes
                .modifications
                .iter()
                .filter_map(|&index| self.results.get(index).identity())
                .collect();
            let mut cache = self.cache.borrow_mut();
            for key in &keys {
                trace!("invalidating modified element {:?}", key);
                cache.remove(key);
            }
        }

        (self.trigger)();
    }

    /// Unregisters from the store and clears the cache.
    ///
    /// Idempotent. Cancels a pending deferred registration. Safe to call from
    /// inside a change notification, including this listener's own.
    pub fn teardown(&self) {
        match self.state.replace(ListenerState::TornDown) {
            ListenerState::Active(id) => {
                self.results.remove_listener(id);
                debug!("change listener {} torn down", id);
            }
            ListenerState::Deferred => {
                debug!("deferred listener registration cancelled");
            }
            ListenerState::Idle | ListenerState::TornDown => {}
        }
        if let Ok(mut cache) = self.cache.try_borrow_mut() {
            cache.clear();
        }
    }
}

impl<R: ResultSet> Drop for ChangeListener<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
