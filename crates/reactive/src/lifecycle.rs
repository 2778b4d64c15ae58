//! Lifecycle controller for live queries.
//!
//! `LiveQuery` binds a query to a consumer: it re-runs the query when the
//! consumer's dependencies change, swaps in a fresh facade (with a fresh
//! cache and listener), and tears the old one down. Between dependency
//! changes it keeps handing out the same `Rc`, so a consumer watching
//! reference identity only learns about data changes through the render
//! trigger.
//!
//! The consumer's own mount/unmount plumbing is outside this crate; it calls
//! [`LiveQuery::update`] on re-evaluation and [`LiveQuery::teardown`] when it
//! stops observing.

use crate::config::CacheConfig;
use crate::facade::CachedResults;
use crate::listener::RenderTrigger;
use crate::results::ResultSet;
use crate::scheduler::Scheduler;
use alloc::boxed::Box;
use alloc::rc::Rc;
use log::debug;
use notekeep_core::Result;

/// Query closure run against the consumer's dependencies.
pub type QueryFn<D, R> = Box<dyn Fn(&D) -> Result<R>>;

/// A query kept live for one consumer.
pub struct LiveQuery<D, R: ResultSet> {
    query: QueryFn<D, R>,
    deps: D,
    trigger: RenderTrigger,
    scheduler: Rc<dyn Scheduler>,
    config: CacheConfig,
    current: Option<Rc<CachedResults<R>>>,
}

impl<D: PartialEq, R: ResultSet> LiveQuery<D, R> {
    /// Runs the query for `deps` and wraps the result.
    ///
    /// Query errors are returned unchanged.
    pub fn new<Q>(
        query: Q,
        deps: D,
        trigger: RenderTrigger,
        scheduler: Rc<dyn Scheduler>,
    ) -> Result<Self>
    where
        Q: Fn(&D) -> Result<R> + 'static,
    {
        Self::with_config(query, deps, trigger, scheduler, CacheConfig::default())
    }

    /// Like [`LiveQuery::new`] with an explicit cache configuration.
    pub fn with_config<Q>(
        query: Q,
        deps: D,
        trigger: RenderTrigger,
        scheduler: Rc<dyn Scheduler>,
        config: CacheConfig,
    ) -> Result<Self>
    where
        Q: Fn(&D) -> Result<R> + 'static,
    {
        let mut live = Self {
            query: Box::new(query),
            deps,
            trigger,
            scheduler,
            config,
            current: None,
        };
        live.rebuild()?;
        Ok(live)
    }

    fn rebuild(&mut self) -> Result<()> {
        let results = (self.query)(&self.deps)?;
        let facade = CachedResults::with_config(
            results,
            self.trigger.clone(),
            self.scheduler.clone(),
            &self.config,
        );
        if let Some(previous) = self.current.replace(Rc::new(facade)) {
            previous.teardown();
        }
        debug!("live query re-evaluated");
        Ok(())
    }

    /// Re-evaluates with `deps`.
    ///
    /// Equal dependencies keep the current facade and return `Ok(false)`.
    /// Otherwise the query is re-run and a fresh facade replaces the old
    /// one, which is torn down; returns `Ok(true)`. If the query fails the
    /// previous facade stays in place and the error is returned.
    pub fn update(&mut self, deps: D) -> Result<bool> {
        if self.current.is_some() && deps == self.deps {
            return Ok(false);
        }
        let previous = core::mem::replace(&mut self.deps, deps);
        if let Err(err) = self.rebuild() {
            self.deps = previous;
            return Err(err);
        }
        Ok(true)
    }

    /// Re-runs the query with the current dependencies.
    pub fn refresh(&mut self) -> Result<()> {
        self.rebuild()
    }

    /// Returns the active facade; `None` after teardown.
    pub fn current(&self) -> Option<Rc<CachedResults<R>>> {
        self.current.clone()
    }

    /// Returns the dependencies of the active facade.
    #[inline]
    pub fn deps(&self) -> &D {
        &self.deps
    }

    /// Returns true once [`LiveQuery::teardown`] has run.
    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.current.is_none()
    }

    /// Tears down the active facade. Idempotent.
    pub fn teardown(&mut self) {
        if let Some(facade) = self.current.take() {
            facade.teardown();
            debug!("live query torn down");
        }
    }
}

impl<D, R: ResultSet> Drop for LiveQuery<D, R> {
    fn drop(&mut self) {
        if let Some(facade) = self.current.take() {
            facade.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_set::ChangeSet;
    use crate::listener::ListenerState;
    use crate::mock::{note, MockResults};
    use crate::scheduler::TaskQueue;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};
    use notekeep_core::{Error, Value};

    /// Returns a query that filters the base results by title and counts runs.
    fn title_query(
        base: &MockResults,
        runs: &Rc<Cell<u32>>,
    ) -> impl Fn(&&'static str) -> Result<MockResults> + 'static {
        let base = base.clone();
        let runs = runs.clone();
        move |title: &&'static str| {
            runs.set(runs.get() + 1);
            if title.is_empty() {
                return Err(Error::invalid_operation("empty title"));
            }
            let order: Vec<usize> = (0..base.len())
                .filter(|&i| {
                    base.get(i)
                        .present()
                        .map(|row| row.get(0) == Some(&Value::from(*title)))
                        .unwrap_or(false)
                })
                .collect();
            base.sorted(order)
        }
    }

    fn live(
        base: &MockResults,
        runs: &Rc<Cell<u32>>,
        deps: &'static str,
    ) -> LiveQuery<&'static str, MockResults> {
        let queue = TaskQueue::new();
        LiveQuery::new(title_query(base, runs), deps, Rc::new(|| {}), Rc::new(queue)).unwrap()
    }

    #[test]
    fn test_same_deps_keep_reference() {
        let base = MockResults::new([note(1, "a"), note(2, "b")]);
        let runs = Rc::new(Cell::new(0));
        let mut query = live(&base, &runs, "a");

        let first = query.current().unwrap();
        assert!(!query.update("a").unwrap());
        assert!(Rc::ptr_eq(&first, &query.current().unwrap()));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_changed_deps_rebuild_and_tear_down_old() {
        let base = MockResults::new([note(1, "a"), note(2, "b")]);
        let runs = Rc::new(Cell::new(0));
        let mut query = live(&base, &runs, "a");
        let first = query.current().unwrap();
        first.get(0);
        assert_eq!(base.listener_count(), 1);

        assert!(query.update("b").unwrap());
        let second = query.current().unwrap();

        assert!(!Rc::ptr_eq(&first, &second));
        assert!(!Rc::ptr_eq(first.cache(), second.cache()));
        assert_eq!(first.listener_state(), Some(ListenerState::TornDown));
        assert_eq!(first.cached_len(), 0);
        assert_eq!(base.listener_count(), 1);
        assert_eq!(query.deps(), &"b");
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_failed_query_keeps_previous_facade() {
        let base = MockResults::new([note(1, "a")]);
        let runs = Rc::new(Cell::new(0));
        let mut query = live(&base, &runs, "a");
        let first = query.current().unwrap();

        assert!(query.update("").is_err());
        assert!(Rc::ptr_eq(&first, &query.current().unwrap()));
        assert_eq!(query.deps(), &"a");
        assert!(matches!(
            first.listener_state(),
            Some(ListenerState::Active(_))
        ));
    }

    #[test]
    fn test_initial_query_error_propagates() {
        let base = MockResults::new([note(1, "a")]);
        let runs = Rc::new(Cell::new(0));
        let result = LiveQuery::new(
            title_query(&base, &runs),
            "",
            Rc::new(|| {}),
            Rc::new(TaskQueue::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_change_reaches_trigger_not_reference() {
        let base = MockResults::new([note(1, "a")]);
        let runs = Rc::new(Cell::new(0));
        let renders = Rc::new(RefCell::new(0));
        let renders_clone = renders.clone();
        let query = LiveQuery::new(
            title_query(&base, &runs),
            "a",
            Rc::new(move || *renders_clone.borrow_mut() += 1),
            Rc::new(TaskQueue::new()),
        )
        .unwrap();
        let facade = query.current().unwrap();

        base.push_row(note(2, "a"));
        base.emit(&ChangeSet::new().with_insertions([1]));

        assert_eq!(*renders.borrow(), 1);
        assert!(Rc::ptr_eq(&facade, &query.current().unwrap()));
    }

    #[test]
    fn test_teardown_idempotent_and_remount() {
        let base = MockResults::new([note(1, "a")]);
        let runs = Rc::new(Cell::new(0));
        let mut query = live(&base, &runs, "a");

        query.teardown();
        query.teardown();
        assert!(query.is_torn_down());
        assert!(query.current().is_none());
        assert_eq!(base.listener_count(), 0);

        // re-evaluating after teardown rebuilds even with equal deps
        assert!(query.update("a").unwrap());
        assert_eq!(base.listener_count(), 1);
    }

    #[test]
    fn test_refresh_forces_new_facade() {
        let base = MockResults::new([note(1, "a")]);
        let runs = Rc::new(Cell::new(0));
        let mut query = live(&base, &runs, "a");
        let first = query.current().unwrap();

        query.refresh().unwrap();
        assert!(!Rc::ptr_eq(&first, &query.current().unwrap()));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_drop_tears_down() {
        let base = MockResults::new([note(1, "a")]);
        let runs = Rc::new(Cell::new(0));
        let query = live(&base, &runs, "a");
        assert_eq!(base.listener_count(), 1);
        drop(query);
        assert_eq!(base.listener_count(), 0);
    }
}
