//! Bounded-concurrency purging.
//!
//! A [`Dispatcher`] loads every path into one shared [`WorkQueue`] and starts
//! `min(items, max_concurrency)` workers. Each worker takes one path at a time
//! and purges it. The first failed purge latches the queue: no worker takes
//! another path, and the dispatcher returns the failure right away.

mod dispatcher;
mod error;
mod item;
mod metrics;
mod queue;
mod worker;

pub use dispatcher::{Dispatcher, RunSummary};
pub use error::DispatchError;
pub use item::PurgeItem;
pub use metrics::DispatchMetrics;
pub use queue::{Claim, RunState, Take, WorkQueue};
