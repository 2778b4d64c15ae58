//! Task scheduling for deferred work.
//!
//! Listener registration must never happen inside a write transaction, so the
//! cache defers it to a later tick. Rather than reaching for a host event loop
//! primitive, the cache schedules through the [`Scheduler`] trait. Hosts bind
//! it to their own loop; `TaskQueue` is the deterministic in-process queue.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use core::cell::RefCell;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Runs tasks at a later scheduling opportunity.
pub trait Scheduler {
    /// Queues `task` to run after the current call stack unwinds.
    fn schedule(&self, task: Task);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule(&self, task: Task) {
        (**self).schedule(task)
    }
}

/// FIFO task queue drained explicitly, one tick at a time.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Runs one tick: every task queued before this call, in order.
    ///
    /// Tasks scheduled while the tick runs wait for the next tick. Returns the
    /// number of tasks run.
    pub fn run_pending(&self) -> usize {
        let pending = self.len();
        let mut ran = 0;
        while ran < pending {
            // the borrow ends before the task runs so it can schedule more work
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    /// Runs ticks until the queue is empty or `max_ticks` ticks have run.
    ///
    /// Returns the number of ticks run.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_empty() {
            self.run_pending();
            ticks += 1;
        }
        ticks
    }
}

impl Scheduler for TaskQueue {
    fn schedule(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_run_pending_in_order() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            queue.schedule(Box::new(move || log.borrow_mut().push(i)));
        }
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*log.borrow(), [0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tasks_scheduled_during_tick_wait() {
        let queue = TaskQueue::new();
        let count = Rc::new(RefCell::new(0));

        let inner_queue = queue.clone();
        let inner_count = count.clone();
        queue.schedule(Box::new(move || {
            *inner_count.borrow_mut() += 1;
            let again = inner_count.clone();
            inner_queue.schedule(Box::new(move || *again.borrow_mut() += 10));
        }));

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*count.borrow(), 11);
    }

    #[test]
    fn test_run_until_idle_bounded() {
        let queue = TaskQueue::new();

        // a task that reschedules itself forever
        fn forever(queue: TaskQueue) {
            let next = queue.clone();
            queue.schedule(Box::new(move || forever(next)));
        }
        forever(queue.clone());

        assert_eq!(queue.run_until_idle(5), 5);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_scheduler_through_rc_dyn() {
        let queue = TaskQueue::new();
        let scheduler: Rc<dyn Scheduler> = Rc::new(queue.clone());
        scheduler.schedule(Box::new(|| {}));
        assert_eq!(queue.len(), 1);
    }
}
