//! Cached result set facade.
//!
//! `CachedResults` wraps a live result set and hands out reference-stable
//! elements: as long as a row has not been invalidated, every read of it
//! returns the same instance, so consumers comparing by reference (memoized
//! rendering) can skip work.
//!
//! A root facade owns the object cache and the change listener. Re-querying
//! a facade (`sorted`, `filtered`) produces a derived facade over the new
//! result set that shares the root's cache and render trigger but registers
//! no listener of its own: it draws from the same rows, so the root's
//! listener already sees every mutation that could affect it. A derived
//! facade holds a reference to that listener, keeping it registered for as
//! long as either facade is alive.
//!
//! # Example
//!
//! ```ignore
//! use notekeep_reactive::{CachedResults, TaskQueue};
//! use std::rc::Rc;
//!
//! let queue = TaskQueue::new();
//! let notes = CachedResults::new(store.objects("notes")?, Rc::new(|| rerender()), Rc::new(queue));
//!
//! let first = notes.get(0).present().unwrap();
//! let again = notes.get(0).present().unwrap();
//! assert!(Rc::ptr_eq(&first, &again));
//!
//! let by_title = notes.sorted(SortDescriptor::asc("title"))?;
//! ```

use crate::config::CacheConfig;
use crate::identity::Identify;
use crate::listener::{ChangeListener, ListenerState, RenderTrigger};
use crate::object_cache::{CacheStats, ObjectCache};
use crate::results::{ElementCache, ResultSet, Slot};
use crate::scheduler::Scheduler;
use alloc::rc::Rc;
use alloc::vec::Vec;
use log::trace;
use notekeep_core::Result;

/// Reference-stable cached view over a live result set.
pub struct CachedResults<R: ResultSet> {
    /// The wrapped live result set
    results: R,
    /// Object cache, shared with every facade derived from the same root
    cache: ElementCache<R>,
    /// Render trigger, shared with derived facades
    trigger: RenderTrigger,
    /// Change listener, owned by the root and shared with derived facades
    listener: Option<Rc<ChangeListener<R>>>,
    /// Whether this facade came from `sorted`/`filtered`
    derived: bool,
}

impl<R: ResultSet> CachedResults<R> {
    /// Wraps `results` in a root facade with the default cache configuration.
    pub fn new(results: R, trigger: RenderTrigger, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_config(results, trigger, scheduler, &CacheConfig::default())
    }

    /// Wraps `results` in a root facade with its own cache and listener.
    pub fn with_config(
        results: R,
        trigger: RenderTrigger,
        scheduler: Rc<dyn Scheduler>,
        config: &CacheConfig,
    ) -> Self {
        let cache = ObjectCache::shared(config);
        let listener =
            ChangeListener::attach(results.clone(), cache.clone(), trigger.clone(), &scheduler);
        Self {
            results,
            cache,
            trigger,
            listener: Some(listener),
            derived: false,
        }
    }

    fn derive(&self, results: R) -> Self {
        Self {
            results,
            cache: self.cache.clone(),
            trigger: self.trigger.clone(),
            listener: self.listener.clone(),
            derived: true,
        }
    }

    /// Reads the element at `index`.
    ///
    /// Null and out-of-range slots pass through and are never cached, and
    /// neither are elements without an identity. Otherwise the cached
    /// instance for the element's key is returned, or the fresh element is
    /// cached and returned.
    pub fn get(&self, index: usize) -> Slot<R::Item> {
        let element = match self.results.get(index) {
            Slot::Present(element) => element,
            Slot::Null => return Slot::Null,
            Slot::Missing => return Slot::Missing,
        };
        let key = match element.identity() {
            Some(key) => key,
            None => return Slot::Present(element),
        };

        if let Some(cached) = self.cache.borrow().get(&key) {
            return Slot::Present(cached);
        }
        trace!("caching element {:?}", key);
        self.cache.borrow_mut().insert(key, element.clone());
        Slot::Present(element)
    }

    /// Returns the current number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if the result set is currently empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates over every index through [`CachedResults::get`].
    ///
    /// Yields `None` for null slots.
    pub fn iter(&self) -> Iter<'_, R> {
        Iter {
            facade: self,
            index: 0,
        }
    }

    /// Collects the present elements.
    pub fn to_vec(&self) -> Vec<R::Item> {
        self.iter().flatten().collect()
    }

    /// Derives a facade over the sorted result set, sharing this cache.
    ///
    /// Store errors are returned unchanged.
    pub fn sorted(&self, sort: R::Sort) -> Result<Self> {
        let results = self.results.sorted(sort)?;
        Ok(self.derive(results))
    }

    /// Derives a facade over the filtered result set, sharing this cache.
    ///
    /// Store errors are returned unchanged.
    pub fn filtered(&self, filter: R::Filter) -> Result<Self> {
        let results = self.results.filtered(filter)?;
        Ok(self.derive(results))
    }

    /// Returns the wrapped result set for anything the facade doesn't intercept.
    #[inline]
    pub fn raw(&self) -> &R {
        &self.results
    }

    /// Returns true for facades produced by `sorted`/`filtered`.
    #[inline]
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    /// Returns the shared object cache.
    #[inline]
    pub fn cache(&self) -> &ElementCache<R> {
        &self.cache
    }

    /// Returns the number of cached elements.
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Returns a copy of the cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats().clone()
    }

    /// Returns the listener state; `None` for derived facades.
    pub fn listener_state(&self) -> Option<ListenerState> {
        if self.derived {
            return None;
        }
        self.listener.as_ref().map(|l| l.state())
    }

    /// Unregisters the change listener and clears the cache.
    ///
    /// Idempotent. A no-op on derived facades, which don't own the listener.
    pub fn teardown(&self) {
        if self.derived {
            return;
        }
        if let Some(listener) = &self.listener {
            listener.teardown();
        }
    }
}

/// Iterator over a [`CachedResults`], reading through the cache.
pub struct Iter<'a, R: ResultSet> {
    facade: &'a CachedResults<R>,
    index: usize,
}

impl<'a, R: ResultSet> Iterator for Iter<'a, R> {
    type Item = Option<R::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        // length is re-read on every step; the result set is live
        if self.index >= self.facade.len() {
            return None;
        }
        let slot = self.facade.get(self.index);
        self.index += 1;
        match slot {
            Slot::Present(element) => Some(Some(element)),
            Slot::Null => Some(None),
            Slot::Missing => None,
        }
    }
}

impl<'a, R: ResultSet> IntoIterator for &'a CachedResults<R> {
    type Item = Option<R::Item>;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
