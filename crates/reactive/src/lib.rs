//! Notekeep Reactive - Reference-stable cached views over live result sets.
//!
//! Live result sets materialize a fresh object on every indexed read, which
//! defeats reference-equality memoization in UI layers. This crate puts an
//! identity-keyed object cache in front of any [`ResultSet`] and keeps it
//! coherent with the store's change notifications.
//!
//! # Core Concepts
//!
//! - `ResultSet`: The contract a live, change-notifying result set fulfils
//! - `ObjectCache`: Identity-keyed cache of materialized elements
//! - `ChangeListener`: Turns change sets into invalidation plus one render
//! - `CachedResults`: The facade handing out reference-stable elements
//! - `LiveQuery`: Re-runs a query when its dependencies change
//!
//! # Example
//!
//! ```ignore
//! use notekeep_reactive::{LiveQuery, TaskQueue};
//! use std::rc::Rc;
//!
//! let queue = TaskQueue::new();
//! let mut live = LiveQuery::new(
//!     move |title: &String| store.objects("notes")?.filtered(by_title(title)),
//!     String::from("groceries"),
//!     Rc::new(|| request_render()),
//!     Rc::new(queue.clone()),
//! )?;
//!
//! let notes = live.current().unwrap();
//! let first = notes.get(0);
//!
//! // Same dependencies: same facade, same elements
//! live.update(String::from("groceries"))?;
//! ```

#![no_std]

extern crate alloc;

pub mod change_set;
pub mod config;
pub mod facade;
pub mod identity;
pub mod lifecycle;
pub mod listener;
pub mod object_cache;
pub mod results;
pub mod scheduler;

#[cfg(test)]
mod mock;

pub use change_set::ChangeSet;
pub use config::CacheConfig;
pub use facade::{CachedResults, Iter};
pub use identity::Identify;
pub use lifecycle::{LiveQuery, QueryFn};
pub use listener::{ChangeListener, ListenerState, RenderTrigger};
pub use object_cache::{CacheStats, ObjectCache, SharedCache};
pub use results::{ChangeCallback, ElementCache, ElementKey, ListenerId, ResultSet, Slot};
pub use scheduler::{Scheduler, Task, TaskQueue};
